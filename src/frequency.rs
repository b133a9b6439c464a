//! Per-field term frequencies of a document, restricted to a query's terms.

use crate::config::RankingConfig;
use crate::document::{Document, Query};
use crate::tokenizer::{split_text, split_url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document zones that contribute independent signal, in feature column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Url,
    Title,
    Body,
    Header,
    Anchor,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Url,
        Field::Title,
        Field::Body,
        Field::Header,
        Field::Anchor,
    ];

    pub fn index(self) -> usize {
        match self {
            Field::Url => 0,
            Field::Title => 1,
            Field::Body => 2,
            Field::Header => 3,
            Field::Anchor => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::Title => "title",
            Field::Body => "body",
            Field::Header => "header",
            Field::Anchor => "anchor",
        }
    }
}

pub type TermCounts = HashMap<String, f64>;

/// Term frequencies for each of the five fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFrequencies {
    fields: [TermCounts; 5],
}

impl FieldFrequencies {
    pub fn get(&self, field: Field) -> &TermCounts {
        &self.fields[field.index()]
    }

    /// Frequency of `term` in `field`; 0 when the term is absent
    pub fn frequency(&self, field: Field, term: &str) -> f64 {
        self.get(field).get(term).copied().unwrap_or(0.0)
    }

    /// Apply sublinear scaling (if enabled) and length normalization.
    pub fn normalized(&self, body_length: u32, config: &RankingConfig) -> FieldFrequencies {
        let denominator = body_length as f64 + config.length_smoothing;
        let mut out = FieldFrequencies::default();
        for field in Field::ALL {
            out.fields[field.index()] = self
                .get(field)
                .iter()
                .map(|(term, &count)| {
                    let tf = if config.sublinear_tf {
                        sublinear(count)
                    } else {
                        count
                    };
                    (term.clone(), tf / denominator)
                })
                .collect();
        }
        out
    }
}

/// 1 + ln(c) for positive counts, 0 otherwise
pub fn sublinear(count: f64) -> f64 {
    if count > 0.0 {
        1.0 + count.ln()
    } else {
        0.0
    }
}

fn count_terms<I: IntoIterator<Item = String>>(counts: &mut TermCounts, terms: I, weight: f64) {
    for term in terms {
        *counts.entry(term).or_insert(0.0) += weight;
    }
}

/// Counts of every term in every field, lowercased
pub fn raw_field_counts(document: &Document) -> FieldFrequencies {
    let mut counts = FieldFrequencies::default();

    count_terms(&mut counts.fields[Field::Url.index()], split_url(&document.url), 1.0);
    count_terms(&mut counts.fields[Field::Title.index()], split_text(&document.title), 1.0);

    let headers = &mut counts.fields[Field::Header.index()];
    for header in &document.headers {
        count_terms(headers, split_text(header), 1.0);
    }

    let body = &mut counts.fields[Field::Body.index()];
    for (term, positions) in &document.body_hits {
        *body.entry(term.to_lowercase()).or_insert(0.0) += positions.len() as f64;
    }

    // an anchor phrase linked K times adds K to each of its terms
    let anchors = &mut counts.fields[Field::Anchor.index()];
    for (text, &count) in &document.anchors {
        count_terms(anchors, split_text(text), count as f64);
    }

    counts
}

/// Raw counts of the query's own terms in each field of the document.
///
/// Each distinct query term appears once per field, with 0 when absent. A term
/// repeated in the query adds its count once per position, so "a b a" and
/// "a b" produce different rows.
pub fn document_term_frequencies(document: &Document, query: &Query) -> FieldFrequencies {
    let all = raw_field_counts(document);

    let mut restricted = FieldFrequencies::default();
    for field in Field::ALL {
        let counts = &mut restricted.fields[field.index()];
        for term in &query.terms {
            *counts.entry(term.clone()).or_insert(0.0) += all.frequency(field, term);
        }
    }
    restricted
}

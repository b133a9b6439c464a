//! Turning term frequencies and IDF weights into feature rows.

use crate::config::{FieldScoring, RankingConfig};
use crate::document::{Document, Query};
use crate::frequency::{document_term_frequencies, Field, FieldFrequencies, TermCounts};
use crate::idf::IdfTable;
use serde::Serialize;

/// Number of per-field scores in a document's feature block
pub const NUM_FIELDS: usize = 5;

/// Scalar relevance signal for each field, in `Field::ALL` order
pub type FieldScores = [f64; NUM_FIELDS];

/// IDF weight of each distinct query term; repeated terms add up.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    weights: Vec<(String, f64)>,
}

impl QueryVector {
    pub fn new(query: &Query, idf: &IdfTable) -> Self {
        let mut weights: Vec<(String, f64)> = Vec::new();
        for term in &query.terms {
            let idf = idf.lookup(term);
            match weights.iter_mut().find(|(t, _)| t == term) {
                Some((_, w)) => *w += idf,
                None => weights.push((term.clone(), idf)),
            }
        }
        Self { weights }
    }

    pub fn weight(&self, term: &str) -> f64 {
        self.weights
            .iter()
            .find(|(t, _)| t == term)
            .map_or(0.0, |(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(t, w)| (t.as_str(), *w))
    }

    /// Query weights dotted with a term-frequency mapping; missing terms count 0
    pub fn dot(&self, term_freqs: &TermCounts) -> f64 {
        self.iter()
            .map(|(term, w)| w * term_freqs.get(term).copied().unwrap_or(0.0))
            .sum()
    }
}

/// One score per field for a (query, document) pair.
pub fn field_scores(
    document: &Document,
    query: &Query,
    query_vector: &QueryVector,
    config: &RankingConfig,
) -> FieldScores {
    let tfs = document_term_frequencies(document, query);
    let mut scores = [0.0; NUM_FIELDS];

    match config.field_scoring {
        FieldScoring::Raw => {
            for field in Field::ALL {
                scores[field.index()] = query_vector.dot(tfs.get(field));
            }
        }
        FieldScoring::Weighted => {
            let normalized = tfs.normalized(document.body_length, config);
            for field in Field::ALL {
                scores[field.index()] =
                    config.field_weights.weight(field) * query_vector.dot(normalized.get(field));
            }
        }
    }

    scores
}

/// Cosine-style relevance of a document to a query.
///
/// The document vector holds, per query-term position, the field-weighted sum
/// of normalized frequencies; the query vector holds the term's query weight at
/// the same position. Repeated terms occupy every position they appear at.
pub fn relevance_score(
    document: &Document,
    query: &Query,
    idf: &IdfTable,
    config: &RankingConfig,
) -> f64 {
    let query_vector = QueryVector::new(query, idf);
    let normalized = document_term_frequencies(document, query).normalized(document.body_length, config);
    net_score(&normalized, query, &query_vector, config)
}

pub fn net_score(
    normalized: &FieldFrequencies,
    query: &Query,
    query_vector: &QueryVector,
    config: &RankingConfig,
) -> f64 {
    query
        .terms
        .iter()
        .map(|term| {
            let doc_entry: f64 = Field::ALL
                .iter()
                .map(|&f| config.field_weights.weight(f) * normalized.frequency(f, term))
                .sum();
            doc_entry * query_vector.weight(term)
        })
        .sum()
}

/// `[url, title, body, header, anchor, label]`
pub fn pointwise_row(scores: &FieldScores, label: f64) -> Vec<f64> {
    let mut row = Vec::with_capacity(NUM_FIELDS + 1);
    row.extend_from_slice(scores);
    row.push(label);
    row
}

/// +1 when the left document is strictly more relevant, otherwise -1
pub fn pair_class(left_label: f64, right_label: f64) -> f64 {
    if left_label > right_label {
        1.0
    } else {
        -1.0
    }
}

/// `[left scores, right scores]` without a class column
pub fn pair_features(left: &[f64], right: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 * NUM_FIELDS + 1);
    row.extend_from_slice(left);
    row.extend_from_slice(right);
    row
}

/// `[left scores, right scores, class]`
pub fn pairwise_row(left: &FieldScores, right: &FieldScores, left_label: f64, right_label: f64) -> Vec<f64> {
    let mut row = pair_features(left, right);
    row.push(pair_class(left_label, right_label));
    row
}

pub fn pointwise_columns() -> Vec<String> {
    let mut columns: Vec<String> = Field::ALL.iter().map(|f| format!("{}_w", f.name())).collect();
    columns.push("relevance_score".to_string());
    columns
}

pub fn pairwise_columns() -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(2 * NUM_FIELDS + 1);
    for side in ["left", "right"] {
        columns.extend(Field::ALL.iter().map(|f| format!("{}_{}_w", side, f.name())));
    }
    columns.push("class".to_string());
    columns
}

/// Dense numeric rows; the last column is the label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row and return its index
    pub fn push(&mut self, row: Vec<f64>) -> usize {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_features(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// Row without its label column
    pub fn features(&self, index: usize) -> &[f64] {
        let row = &self.rows[index];
        &row[..row.len() - 1]
    }

    pub fn label(&self, index: usize) -> f64 {
        let row = &self.rows[index];
        row[row.len() - 1]
    }

    pub fn iter_features(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(|row| &row[..row.len() - 1])
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn idf(pairs: &[(&str, f64)]) -> IdfTable {
        let map: HashMap<String, f64> = pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect();
        IdfTable::from_idfs(map, 10.0)
    }

    #[test]
    fn test_query_vector_sums_duplicates() {
        let table = idf(&[("a", 1.5), ("b", 0.25)]);
        let qv = QueryVector::new(&Query::new("a a b"), &table);
        assert_eq!(qv.weight("a"), 3.0);
        assert_eq!(qv.weight("b"), 0.25);
        assert_eq!(qv.iter().count(), 2);
    }

    #[test]
    fn test_query_vector_smooths_unseen() {
        let table = idf(&[]);
        let qv = QueryVector::new(&Query::new("unseen"), &table);
        assert!((qv.weight("unseen") - 11.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_raw_field_scores() {
        let table = idf(&[("cat", 1.0), ("dog", 2.0)]);
        let query = Query::new("cat dog");
        let doc = Document::new("http://pets.com/dog".to_string())
            .with_title("Cat Dog dog".to_string());
        let qv = QueryVector::new(&query, &table);
        let scores = field_scores(&doc, &query, &qv, &RankingConfig::default());

        assert_eq!(scores[Field::Url.index()], 2.0);
        assert_eq!(scores[Field::Title.index()], 1.0 + 2.0 * 2.0);
        assert_eq!(scores[Field::Body.index()], 0.0);
        assert_eq!(scores[Field::Header.index()], 0.0);
        assert_eq!(scores[Field::Anchor.index()], 0.0);
    }

    #[test]
    fn test_repeated_query_term_scores() {
        let table = idf(&[("cat", 1.0)]);
        let query = Query::new("cat cat");
        let doc = Document::new("x".to_string()).with_title("cat".to_string());
        let qv = QueryVector::new(&query, &table);
        let scores = field_scores(&doc, &query, &qv, &RankingConfig::default());

        // summed weight 2 times accumulated count 2
        assert_eq!(scores[Field::Title.index()], 4.0);
        assert_eq!(scores[Field::Url.index()], 0.0);
    }

    #[test]
    fn test_weighted_field_scores() {
        let table = idf(&[("cat", 1.0)]);
        let query = Query::new("cat");
        let doc = Document::new("x".to_string()).with_title("cat".to_string());
        let qv = QueryVector::new(&query, &table);
        let config = RankingConfig {
            field_scoring: FieldScoring::Weighted,
            ..Default::default()
        };
        let scores = field_scores(&doc, &query, &qv, &config);
        assert!((scores[Field::Title.index()] - 1.05 / 2000.0).abs() < 1e-15);
    }

    #[test]
    fn test_net_score_counts_repeated_positions() {
        let table = idf(&[("cat", 1.0)]);
        let doc = Document::new("x".to_string()).with_title("cat".to_string());
        let config = RankingConfig::default();

        let single = relevance_score(&doc, &Query::new("cat"), &table, &config);
        let double = relevance_score(&doc, &Query::new("cat cat"), &table, &config);
        assert!((single - 1.05 / 2000.0).abs() < 1e-15);
        // raw count 2 per field, two positions, each weighted by the summed query weight
        let expected = 4.0 * 1.05 * (1.0 + 2.0f64.ln()) / 2000.0;
        assert!((double - expected).abs() < 1e-15);
    }

    #[test]
    fn test_pair_class_flips_on_swap() {
        let a = [1.0, 0.0, 0.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0, 0.0, 0.0];
        let ab = pairwise_row(&a, &b, 3.0, 1.0);
        let ba = pairwise_row(&b, &a, 1.0, 3.0);
        assert_eq!(ab[10], 1.0);
        assert_eq!(ba[10], -1.0);
        assert_eq!(pair_class(2.0, 2.0), -1.0);
    }

    #[test]
    fn test_column_layout() {
        assert_eq!(
            pointwise_columns(),
            vec!["url_w", "title_w", "body_w", "header_w", "anchor_w", "relevance_score"]
        );
        let pair = pairwise_columns();
        assert_eq!(pair.len(), 11);
        assert_eq!(pair[5], "right_url_w");
        assert_eq!(pair[10], "class");
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A search query. Identity is the original string so it can key label files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    /// Lowercased terms in query order, duplicates kept
    pub terms: Vec<String>,
}

impl Query {
    pub fn new(text: &str) -> Self {
        let text = text.trim().to_string();
        let terms = text.split_whitespace().map(|t| t.to_lowercase()).collect();
        Self { text, terms }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

/// A candidate result page and its raw field content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub headers: Vec<String>,
    /// term -> positions of the term in the body
    #[serde(default)]
    pub body_hits: HashMap<String, Vec<u32>>,
    /// anchor text -> number of links carrying it
    #[serde(default)]
    pub anchors: HashMap<String, u32>,
    #[serde(default)]
    pub body_length: u32,
    #[serde(default)]
    pub page_rank: Option<u32>,
}

impl Document {
    pub fn new(url: String) -> Self {
        Self {
            url,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    pub fn with_header(mut self, header: String) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_body_hits(mut self, term: String, positions: Vec<u32>) -> Self {
        self.body_hits.entry(term).or_default().extend(positions);
        self
    }

    pub fn with_anchor(mut self, text: String, count: u32) -> Self {
        self.anchors.insert(text, count);
        self
    }

    pub fn with_body_length(mut self, body_length: u32) -> Self {
        self.body_length = body_length;
        self
    }

    pub fn with_page_rank(mut self, page_rank: u32) -> Self {
        self.page_rank = Some(page_rank);
        self
    }
}

/// Queries and their candidate documents, both in load order
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<(Query, Vec<Document>)>,
    positions: HashMap<Query, usize>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a query; a repeated query keeps collecting into its first entry
    pub fn add_query(&mut self, query: Query) {
        if !self.positions.contains_key(&query) {
            self.positions.insert(query.clone(), self.entries.len());
            self.entries.push((query, Vec::new()));
        }
    }

    pub fn add_document(&mut self, query: &Query, document: Document) {
        self.add_query(query.clone());
        let pos = self.positions[query];
        self.entries[pos].1.push(document);
    }

    pub fn documents(&self, query: &Query) -> Option<&[Document]> {
        self.positions
            .get(query)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Query, &[Document])> {
        self.entries.iter().map(|(q, docs)| (q, docs.as_slice()))
    }

    pub fn entries(&self) -> &[(Query, Vec<Document>)] {
        &self.entries
    }

    pub fn num_queries(&self) -> usize {
        self.entries.len()
    }

    pub fn num_documents(&self) -> usize {
        self.entries.iter().map(|(_, docs)| docs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Human relevance judgements: query text -> url -> score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelevanceLabels {
    labels: HashMap<String, HashMap<String, f64>>,
}

impl RelevanceLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: &str, url: &str, score: f64) {
        self.labels
            .entry(query.to_string())
            .or_default()
            .insert(url.to_string(), score);
    }

    pub fn get(&self, query: &str, url: &str) -> Option<f64> {
        self.labels.get(query).and_then(|urls| urls.get(url)).copied()
    }

    pub fn for_query(&self, query: &str) -> Option<&HashMap<String, f64>> {
        self.labels.get(query)
    }

    pub fn num_queries(&self) -> usize {
        self.labels.len()
    }

    pub fn num_judgements(&self) -> usize {
        self.labels.values().map(|urls| urls.len()).sum()
    }
}

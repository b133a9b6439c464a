use crate::document::Query;
use serde::Serialize;
use std::collections::HashMap;

/// Rows belonging to one query, candidates in first-seen order
#[derive(Debug, Clone, Serialize)]
pub struct QueryRows {
    pub query: Query,
    pub documents: Vec<DocumentRow>,
}

/// One candidate of a query. `position` is the candidate's place in the
/// query's list, so two candidates sharing a url stay distinct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRow {
    pub position: usize,
    pub url: String,
    pub row: usize,
}

/// Query -> (candidate -> row of the feature matrix)
#[derive(Debug, Clone, Default, Serialize)]
pub struct RowIndex {
    queries: Vec<QueryRows>,
    #[serde(skip)]
    positions: HashMap<Query, usize>,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `row` for the candidate at `position` of `query`. The first row
    /// seen for a candidate wins; returns false when it was already present.
    pub fn insert(&mut self, query: &Query, position: usize, url: &str, row: usize) -> bool {
        let pos = match self.positions.get(query) {
            Some(&pos) => pos,
            None => {
                self.positions.insert(query.clone(), self.queries.len());
                self.queries.push(QueryRows {
                    query: query.clone(),
                    documents: Vec::new(),
                });
                self.queries.len() - 1
            }
        };

        let documents = &mut self.queries[pos].documents;
        if documents.iter().any(|d| d.position == position) {
            return false;
        }
        documents.push(DocumentRow {
            position,
            url: url.to_string(),
            row,
        });
        true
    }

    /// Row of the candidate at `position` of `query`
    pub fn row(&self, query: &Query, position: usize) -> Option<usize> {
        self.documents(query)?
            .iter()
            .find(|d| d.position == position)
            .map(|d| d.row)
    }

    /// Row of the first candidate of `query` with this url
    pub fn get(&self, query: &Query, url: &str) -> Option<usize> {
        self.documents(query)?
            .iter()
            .find(|d| d.url == url)
            .map(|d| d.row)
    }

    pub fn documents(&self, query: &Query) -> Option<&[DocumentRow]> {
        self.positions
            .get(query)
            .map(|&pos| self.queries[pos].documents.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryRows> {
        self.queries.iter()
    }

    pub fn queries(&self) -> &[QueryRows] {
        &self.queries
    }

    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    pub fn num_documents(&self) -> usize {
        self.queries.iter().map(|q| q.documents.len()).sum()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_queries: self.queries.len(),
            total_documents: self.num_documents(),
            avg_docs_per_query: if self.queries.is_empty() {
                0.0
            } else {
                self.num_documents() as f64 / self.queries.len() as f64
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexStats {
    pub total_queries: usize,
    pub total_documents: usize,
    pub avg_docs_per_query: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_row_wins() {
        let mut index = RowIndex::new();
        let query = Query::new("stanford");
        assert!(index.insert(&query, 0, "http://a", 0));
        assert!(index.insert(&query, 1, "http://b", 1));
        assert!(!index.insert(&query, 0, "http://a", 2));

        assert_eq!(index.get(&query, "http://a"), Some(0));
        assert_eq!(index.get(&query, "http://b"), Some(1));
        assert_eq!(index.get(&query, "http://c"), None);
        assert_eq!(index.documents(&query).unwrap().len(), 2);
    }

    #[test]
    fn test_shared_url_keeps_both_candidates() {
        let mut index = RowIndex::new();
        let query = Query::new("stanford");
        assert!(index.insert(&query, 0, "http://dup", 0));
        assert!(index.insert(&query, 1, "http://dup", 1));

        assert_eq!(index.documents(&query).unwrap().len(), 2);
        assert_eq!(index.row(&query, 0), Some(0));
        assert_eq!(index.row(&query, 1), Some(1));
        assert_eq!(index.get(&query, "http://dup"), Some(0));
    }

    #[test]
    fn test_stats() {
        let mut index = RowIndex::new();
        index.insert(&Query::new("a"), 0, "u1", 0);
        index.insert(&Query::new("a"), 1, "u2", 1);
        index.insert(&Query::new("b"), 0, "u3", 2);

        let stats = index.stats();
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.avg_docs_per_query, 1.5);
    }
}

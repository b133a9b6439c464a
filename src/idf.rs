use crate::config::IdfConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Term -> inverse document frequency, with smoothing for unseen terms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdfTable {
    idfs: HashMap<String, f64>,
    total_documents: f64,
}

impl IdfTable {
    /// Build from document frequencies: idf = ln((N + 1) / (df + 1)).
    ///
    /// N comes from `config.total_documents` when set, otherwise it is
    /// estimated as the number of distinct terms over `term_document_ratio`.
    pub fn from_document_frequencies(dfs: HashMap<String, f64>, config: &IdfConfig) -> Self {
        let total_documents = config
            .total_documents
            .unwrap_or_else(|| dfs.len() as f64 / config.term_document_ratio);

        let idfs = dfs
            .into_iter()
            .map(|(term, df)| {
                let idf = ((total_documents + 1.0) / (df + 1.0)).ln();
                (term, idf)
            })
            .collect();

        Self {
            idfs,
            total_documents,
        }
    }

    /// Build from precomputed IDF values
    pub fn from_idfs(idfs: HashMap<String, f64>, total_documents: f64) -> Self {
        Self {
            idfs,
            total_documents,
        }
    }

    /// IDF of `term`, falling back to ln(N + 1) when unseen
    pub fn lookup(&self, term: &str) -> f64 {
        self.idfs
            .get(term)
            .copied()
            .unwrap_or_else(|| self.default_idf())
    }

    pub fn default_idf(&self) -> f64 {
        (self.total_documents + 1.0).ln()
    }

    pub fn total_documents(&self) -> f64 {
        self.total_documents
    }

    pub fn len(&self) -> usize {
        self.idfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idfs.is_empty()
    }

    pub fn stats(&self) -> IdfStats {
        IdfStats {
            total_terms: self.idfs.len(),
            total_documents: self.total_documents,
            avg_idf: if self.idfs.is_empty() {
                0.0
            } else {
                self.idfs.values().sum::<f64>() / self.idfs.len() as f64
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdfStats {
    pub total_terms: usize,
    pub total_documents: f64,
    pub avg_idf: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dfs(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(t, df)| (t.to_string(), *df)).collect()
    }

    #[test]
    fn test_estimated_corpus_size() {
        let table = IdfTable::from_document_frequencies(
            dfs(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0), ("f", 6.0), ("g", 7.0), ("h", 8.0), ("i", 9.0), ("j", 10.0), ("k", 11.0)]),
            &IdfConfig::default(),
        );
        assert!((table.total_documents() - 2.0).abs() < 1e-12);
        assert!((table.lookup("a") - (3.0f64 / 2.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_exact_corpus_size() {
        let config = IdfConfig {
            total_documents: Some(99.0),
            ..Default::default()
        };
        let table = IdfTable::from_document_frequencies(dfs(&[("stanford", 9.0)]), &config);
        assert!((table.lookup("stanford") - 10.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_term_falls_back_to_smoothing() {
        let table = IdfTable::from_idfs(dfs(&[("cat", 1.0)]), 10.0);
        assert_eq!(table.lookup("cat"), 1.0);
        assert!((table.lookup("zebra") - 11.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_stats() {
        let table = IdfTable::from_idfs(dfs(&[("cat", 1.0), ("dog", 2.0)]), 10.0);
        let stats = table.stats();
        assert_eq!(stats.total_terms, 2);
        assert_eq!(stats.total_documents, 10.0);
        assert_eq!(stats.avg_idf, 1.5);

        assert_eq!(IdfTable::default().stats().avg_idf, 0.0);
    }
}

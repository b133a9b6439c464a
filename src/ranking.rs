use crate::config::RankingConfig;
use crate::document::Corpus;
use crate::features::relevance_score;
use crate::idf::IdfTable;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Query text -> urls, most relevant first
pub type Rankings = BTreeMap<String, Vec<String>>;

/// A candidate with its predicted relevance
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub url: String,
    pub score: f64,
}

impl ScoredDocument {
    pub fn new(url: String, score: f64) -> Self {
        Self { url, score }
    }
}

/// Sort by score descending. The sort is stable, so equal scores keep
/// candidate order.
pub fn order_by_score(mut scored: Vec<ScoredDocument>) -> Vec<ScoredDocument> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

pub fn urls(scored: Vec<ScoredDocument>) -> Vec<String> {
    scored.into_iter().map(|sd| sd.url).collect()
}

/// Rank every query's candidates by the cosine relevance score alone, without
/// a trained model
pub fn rank_by_relevance(corpus: &Corpus, idf: &IdfTable, config: &RankingConfig) -> Rankings {
    corpus
        .entries()
        .par_iter()
        .map(|(query, documents)| {
            let scored = documents
                .iter()
                .map(|doc| ScoredDocument::new(doc.url.clone(), relevance_score(doc, query, idf, config)))
                .collect();
            (query.text.clone(), urls(order_by_score(scored)))
        })
        .collect()
}

use crate::document::RelevanceLabels;
use crate::ranking::Rankings;
use serde::Serialize;

/// Normalized discounted cumulative gain of one ranked list.
///
/// Gain is `2^rel - 1`, discounted by `log2(rank + 1)`. Unjudged urls count as
/// relevance 0. Returns 1.0 when no ranked document carries any gain.
pub fn ndcg(ranked: &[String], judgements: &std::collections::HashMap<String, f64>) -> f64 {
    let gains: Vec<f64> = ranked
        .iter()
        .map(|url| judgements.get(url).copied().unwrap_or(0.0))
        .collect();

    let mut ideal = gains.clone();
    ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let ideal_dcg = dcg(&ideal);
    if ideal_dcg <= 0.0 {
        return 1.0;
    }
    dcg(&gains) / ideal_dcg
}

fn dcg(relevances: &[f64]) -> f64 {
    relevances
        .iter()
        .enumerate()
        .map(|(i, rel)| (2f64.powf(*rel) - 1.0) / ((i + 2) as f64).log2())
        .sum()
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub queries: usize,
    pub mean_ndcg: f64,
}

/// Mean NDCG over every ranked query that has judgements
pub fn evaluate(rankings: &Rankings, labels: &RelevanceLabels) -> Evaluation {
    let scores: Vec<f64> = rankings
        .iter()
        .filter_map(|(query, urls)| labels.for_query(query).map(|judged| ndcg(urls, judged)))
        .collect();

    Evaluation {
        queries: scores.len(),
        mean_ndcg: if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        },
    }
}

//! Pointwise and pairwise feature extraction, training and ranking.

use crate::config::RankingConfig;
use crate::document::{Corpus, Document, Query, RelevanceLabels};
use crate::error::{LtrError, Result};
use crate::features::{
    field_scores, pair_features, pairwise_columns, pairwise_row, pointwise_columns, pointwise_row,
    FeatureMatrix, FieldScores, QueryVector,
};
use crate::idf::IdfTable;
use crate::index::RowIndex;
use crate::model::{RankingModel, ScaledModel, Standardizer, Trainer};
use crate::ranking::{order_by_score, urls, Rankings, ScoredDocument};
use rayon::prelude::*;
use tracing::debug;

/// Rows to train on, with the row of each (query, document)
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub matrix: FeatureMatrix,
    pub index: RowIndex,
}

/// Rows to rank, with the row of each (query, document)
#[derive(Debug, Clone)]
pub struct TestFeatures {
    pub matrix: FeatureMatrix,
    pub index: RowIndex,
}

/// The four stages of a learning-to-rank run
pub trait FeatureExtractionStrategy {
    fn config(&self) -> &RankingConfig;

    fn extract_train_features(
        &self,
        corpus: &Corpus,
        labels: &RelevanceLabels,
        idf: &IdfTable,
    ) -> Result<TrainingSet>;

    fn train<T: Trainer>(&self, trainer: &T, training: &TrainingSet) -> Result<ScaledModel<T::Model>>;

    fn extract_test_features(&self, corpus: &Corpus, idf: &IdfTable) -> Result<TestFeatures> {
        let (matrix, index) = per_document_rows(corpus, idf, None, self.config())?;
        Ok(TestFeatures { matrix, index })
    }

    fn rank<M: RankingModel + Sync>(&self, features: &TestFeatures, model: &M) -> Result<Rankings>;
}

/// Model output for one row; NaN or infinite predictions cannot be ordered
fn predict_finite<M: RankingModel>(model: &M, row: &[f64]) -> Result<f64> {
    let score = model.predict(row)?;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(LtrError::Model(format!("non-finite prediction {}", score)))
    }
}

struct ScoredCandidate<'a> {
    document: &'a Document,
    scores: FieldScores,
    label: f64,
}

/// Field scores of every candidate of one query, with labels when training
fn score_candidates<'a>(
    query: &Query,
    documents: &'a [Document],
    labels: Option<&RelevanceLabels>,
    idf: &IdfTable,
    config: &RankingConfig,
) -> Result<Vec<ScoredCandidate<'a>>> {
    let query_vector = QueryVector::new(query, idf);
    documents
        .iter()
        .map(|document| {
            let label = match labels {
                Some(labels) => labels
                    .get(&query.text, &document.url)
                    .ok_or_else(|| LtrError::MissingLabel {
                        query: query.text.clone(),
                        url: document.url.clone(),
                    })?,
                None => config.placeholder_label,
            };
            Ok(ScoredCandidate {
                document,
                scores: field_scores(document, query, &query_vector, config),
                label,
            })
        })
        .collect()
}

/// Candidates of every query, scored in parallel and returned in corpus order
fn score_corpus<'a>(
    corpus: &'a Corpus,
    labels: Option<&RelevanceLabels>,
    idf: &IdfTable,
    config: &RankingConfig,
) -> Result<Vec<(&'a Query, Vec<ScoredCandidate<'a>>)>> {
    corpus
        .entries()
        .par_iter()
        .map(|(query, documents)| Ok((query, score_candidates(query, documents, labels, idf, config)?)))
        .collect()
}

/// One pointwise row per (query, document)
fn per_document_rows(
    corpus: &Corpus,
    idf: &IdfTable,
    labels: Option<&RelevanceLabels>,
    config: &RankingConfig,
) -> Result<(FeatureMatrix, RowIndex)> {
    let mut matrix = FeatureMatrix::new(pointwise_columns());
    let mut index = RowIndex::new();

    for (query, candidates) in score_corpus(corpus, labels, idf, config)? {
        for (position, candidate) in candidates.iter().enumerate() {
            let row = matrix.push(pointwise_row(&candidate.scores, candidate.label));
            index.insert(query, position, &candidate.document.url, row);
        }
    }

    Ok((matrix, index))
}

/// Regression on single-document rows
#[derive(Debug, Clone, Default)]
pub struct Pointwise {
    config: RankingConfig,
}

impl Pointwise {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }
}

impl FeatureExtractionStrategy for Pointwise {
    fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn extract_train_features(
        &self,
        corpus: &Corpus,
        labels: &RelevanceLabels,
        idf: &IdfTable,
    ) -> Result<TrainingSet> {
        let (matrix, index) = per_document_rows(corpus, idf, Some(labels), &self.config)?;
        Ok(TrainingSet { matrix, index })
    }

    fn train<T: Trainer>(&self, trainer: &T, training: &TrainingSet) -> Result<ScaledModel<T::Model>> {
        Ok(ScaledModel::unscaled(trainer.train(&training.matrix)?))
    }

    fn rank<M: RankingModel + Sync>(&self, features: &TestFeatures, model: &M) -> Result<Rankings> {
        features
            .index
            .queries()
            .par_iter()
            .map(|entry| {
                let scored = entry
                    .documents
                    .iter()
                    .map(|doc| {
                        let score = predict_finite(model, features.matrix.features(doc.row))?;
                        Ok(ScoredDocument::new(doc.url.clone(), score))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((entry.query.text.clone(), urls(order_by_score(scored))))
            })
            .collect()
    }
}

/// Classification on document pairs of the same query
#[derive(Debug, Clone, Default)]
pub struct Pairwise {
    config: RankingConfig,
}

impl Pairwise {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }
}

impl FeatureExtractionStrategy for Pairwise {
    fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// One row per unordered pair of candidates. A document's index entry is
    /// the first pair row it appears in.
    fn extract_train_features(
        &self,
        corpus: &Corpus,
        labels: &RelevanceLabels,
        idf: &IdfTable,
    ) -> Result<TrainingSet> {
        let mut matrix = FeatureMatrix::new(pairwise_columns());
        let mut index = RowIndex::new();

        for (query, candidates) in score_corpus(corpus, Some(labels), idf, &self.config)? {
            for (i, left) in candidates.iter().enumerate() {
                for (j, right) in candidates.iter().enumerate().skip(i + 1) {
                    let row = matrix.push(pairwise_row(&left.scores, &right.scores, left.label, right.label));
                    index.insert(query, i, &left.document.url, row);
                    index.insert(query, j, &right.document.url, row);
                }
            }
        }

        Ok(TrainingSet { matrix, index })
    }

    fn train<T: Trainer>(&self, trainer: &T, training: &TrainingSet) -> Result<ScaledModel<T::Model>> {
        if !self.config.pairwise.standardize {
            return Ok(ScaledModel::unscaled(trainer.train(&training.matrix)?));
        }
        let scaler = Standardizer::fit(&training.matrix);
        let model = trainer.train(&scaler.transform(&training.matrix))?;
        Ok(ScaledModel {
            scaler: Some(scaler),
            model,
        })
    }

    /// Round-robin tournament: each pair is one comparison, a positive
    /// prediction is a win for the left document and a negative one for the
    /// right. Documents order by wins, then summed margin, then candidate order.
    fn rank<M: RankingModel + Sync>(&self, features: &TestFeatures, model: &M) -> Result<Rankings> {
        features
            .index
            .queries()
            .par_iter()
            .map(|entry| {
                let docs = &entry.documents;
                let mut wins = vec![0usize; docs.len()];
                let mut margins = vec![0.0f64; docs.len()];

                for i in 0..docs.len() {
                    for j in i + 1..docs.len() {
                        let row = pair_features(
                            features.matrix.features(docs[i].row),
                            features.matrix.features(docs[j].row),
                        );
                        let p = predict_finite(model, &row)?;
                        if p > 0.0 {
                            wins[i] += 1;
                        } else if p < 0.0 {
                            wins[j] += 1;
                        }
                        margins[i] += p;
                        margins[j] -= p;
                    }
                }

                let mut order: Vec<usize> = (0..docs.len()).collect();
                order.sort_by(|&a, &b| {
                    wins[b]
                        .cmp(&wins[a])
                        .then_with(|| margins[b].total_cmp(&margins[a]))
                });
                debug!(query = %entry.query.text, candidates = docs.len(), "ranked by pairwise wins");

                let ranked: Vec<String> = order.into_iter().map(|k| docs[k].url.clone()).collect();
                Ok((entry.query.text.clone(), ranked))
            })
            .collect()
    }
}

use crate::document::{Corpus, RelevanceLabels};
use crate::error::Result;
use crate::idf::IdfTable;
use crate::loader;
use crate::model::{RankingModel, ScaledModel, Trainer};
use crate::ranking::Rankings;
use crate::strategy::{FeatureExtractionStrategy, TestFeatures, TrainingSet};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Drives a strategy from loaded data to ranked urls
pub struct RankingPipeline<S> {
    strategy: S,
}

impl<S: FeatureExtractionStrategy> RankingPipeline<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Load a document-frequency file with the strategy's IDF calibration
    pub fn load_idf<P: AsRef<Path>>(&self, path: P) -> Result<IdfTable> {
        loader::load_idf(path, &self.strategy.config().idf)
    }

    pub fn training_set(&self, corpus: &Corpus, labels: &RelevanceLabels, idf: &IdfTable) -> Result<TrainingSet> {
        let start = Instant::now();
        let set = self.strategy.extract_train_features(corpus, labels, idf)?;
        let stats = set.index.stats();
        info!(
            "Extracted {} training rows for {} queries ({} indexed documents, {:.1} per query) in {:?}",
            set.matrix.len(),
            stats.total_queries,
            stats.total_documents,
            stats.avg_docs_per_query,
            start.elapsed()
        );
        Ok(set)
    }

    pub fn test_features(&self, corpus: &Corpus, idf: &IdfTable) -> Result<TestFeatures> {
        let start = Instant::now();
        let features = self.strategy.extract_test_features(corpus, idf)?;
        let stats = features.index.stats();
        info!(
            "Extracted {} test rows for {} queries ({:.1} candidates per query) in {:?}",
            features.matrix.len(),
            stats.total_queries,
            stats.avg_docs_per_query,
            start.elapsed()
        );
        Ok(features)
    }

    /// Extract training rows and hand them to `trainer`
    pub fn train<T: Trainer>(
        &self,
        corpus: &Corpus,
        labels: &RelevanceLabels,
        idf: &IdfTable,
        trainer: &T,
    ) -> Result<ScaledModel<T::Model>> {
        let set = self.training_set(corpus, labels, idf)?;
        let start = Instant::now();
        let model = self.strategy.train(trainer, &set)?;
        info!("Trained model on {} rows in {:?}", set.matrix.len(), start.elapsed());
        Ok(model)
    }

    /// Extract test rows and rank every query's candidates with `model`
    pub fn rank<M: RankingModel + Sync>(&self, corpus: &Corpus, idf: &IdfTable, model: &M) -> Result<Rankings> {
        let features = self.test_features(corpus, idf)?;
        let start = Instant::now();
        let rankings = self.strategy.rank(&features, model)?;
        info!("Ranked {} queries in {:?}", rankings.len(), start.elapsed());
        Ok(rankings)
    }

    pub fn train_files<T: Trainer, P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        data_path: P,
        rel_path: Q,
        idf: &IdfTable,
        trainer: &T,
    ) -> Result<ScaledModel<T::Model>> {
        let corpus = loader::load_corpus(data_path)?;
        let labels = loader::load_labels(rel_path)?;
        self.train(&corpus, &labels, idf, trainer)
    }

    pub fn rank_file<M: RankingModel + Sync, P: AsRef<Path>>(
        &self,
        data_path: P,
        idf: &IdfTable,
        model: &M,
    ) -> Result<Rankings> {
        let corpus = loader::load_corpus(data_path)?;
        self.rank(&corpus, idf, model)
    }
}

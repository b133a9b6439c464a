// Re-export main components
pub mod config;
pub mod document;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod frequency;
pub mod idf;
pub mod index;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod strategy;
pub mod tokenizer;

// Re-export commonly used types
pub use config::{FieldScoring, FieldWeights, RankingConfig};
pub use document::{Corpus, Document, Query, RelevanceLabels};
pub use features::{FeatureMatrix, QueryVector};
pub use frequency::Field;
pub use idf::IdfTable;
pub use index::RowIndex;
pub use model::{LinearModel, RankingModel, ScaledModel, Standardizer, Trainer};
pub use pipeline::RankingPipeline;
pub use ranking::Rankings;
pub use strategy::{FeatureExtractionStrategy, Pairwise, Pointwise, TestFeatures, TrainingSet};

// Re-export error types
pub use error::{LtrError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_workflow() -> Result<()> {
        let query = Query::new("cat dog");
        let mut corpus = Corpus::new();
        corpus.add_document(&query, Document::new("a".to_string()).with_title("cat dog".to_string()));
        corpus.add_document(&query, Document::new("b".to_string()));

        let idf = IdfTable::from_idfs(
            [("cat".to_string(), 1.0), ("dog".to_string(), 2.0)].into_iter().collect(),
            10.0,
        );

        let pipeline = RankingPipeline::new(Pointwise::default());
        let features = pipeline.test_features(&corpus, &idf)?;
        assert_eq!(features.matrix.len(), 2);
        assert_eq!(features.matrix.features(0)[Field::Title.index()], 3.0);

        let rankings = pipeline.rank(&corpus, &idf, &LinearModel::new(vec![1.0; 5], 0.0))?;
        assert_eq!(rankings["cat dog"], vec!["a", "b"]);

        Ok(())
    }
}

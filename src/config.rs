use crate::error::{LtrError, Result};
use crate::frequency::Field;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Per-field multipliers applied when collapsing normalized frequencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub url: f64,
    pub title: f64,
    pub body: f64,
    pub header: f64,
    pub anchor: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            url: 1.25,
            title: 1.05,
            body: 1.25,
            header: 0.9,
            anchor: 1.0,
        }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: Field) -> f64 {
        match field {
            Field::Url => self.url,
            Field::Title => self.title,
            Field::Body => self.body,
            Field::Header => self.header,
            Field::Anchor => self.anchor,
        }
    }

    /// Weights in feature column order.
    pub fn to_vec(&self) -> Vec<f64> {
        Field::ALL.iter().map(|f| self.weight(*f)).collect()
    }
}

/// How a field's term frequencies collapse into one scalar feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldScoring {
    /// Query weights dotted with raw term counts
    #[default]
    Raw,
    /// Field weight times normalized frequency times query weight
    Weighted,
}

/// Calibration of the IDF table's corpus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdfConfig {
    /// Distinct terms per document, used to estimate N when it is unknown
    pub term_document_ratio: f64,
    /// Exact corpus size; overrides the estimate when set
    pub total_documents: Option<f64>,
}

impl Default for IdfConfig {
    fn default() -> Self {
        Self {
            term_document_ratio: 5.5,
            total_documents: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairwiseConfig {
    /// Z-score feature columns of the pair matrix before training
    pub standardize: bool,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        Self { standardize: true }
    }
}

/// Tunables threaded through extraction and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub field_weights: FieldWeights,
    /// Added to `body_length` when normalizing every field
    pub length_smoothing: f64,
    pub sublinear_tf: bool,
    pub field_scoring: FieldScoring,
    pub idf: IdfConfig,
    pub pairwise: PairwiseConfig,
    /// Label written into test rows; never read by ranking
    pub placeholder_label: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            field_weights: FieldWeights::default(),
            length_smoothing: 2000.0,
            sublinear_tf: true,
            field_scoring: FieldScoring::Raw,
            idf: IdfConfig::default(),
            pairwise: PairwiseConfig::default(),
            placeholder_label: 11.0,
        }
    }
}

impl RankingConfig {
    /// Load a JSON config file; missing keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LtrError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.length_smoothing > 0.0) {
            return Err(LtrError::Config(format!(
                "length_smoothing must be positive, got {}",
                self.length_smoothing
            )));
        }
        if !(self.idf.term_document_ratio > 0.0) {
            return Err(LtrError::Config(format!(
                "idf.term_document_ratio must be positive, got {}",
                self.idf.term_document_ratio
            )));
        }
        if let Some(n) = self.idf.total_documents {
            if !(n >= 0.0) {
                return Err(LtrError::Config(format!(
                    "idf.total_documents must be non-negative, got {}",
                    n
                )));
            }
        }
        if self.field_weights.to_vec().iter().any(|w| !w.is_finite()) {
            return Err(LtrError::Config("field weights must be finite".to_string()));
        }
        Ok(())
    }
}

//! Seams to the learning algorithms.
//!
//! Training and prediction are supplied by callers through [`Trainer`] and
//! [`RankingModel`]. [`LinearModel`] is the concrete model most trainers
//! produce; [`Standardizer`] and [`ScaledModel`] carry feature scaling from
//! training through to prediction.

use crate::error::{LtrError, Result};
use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Scores one feature row (label column excluded)
pub trait RankingModel {
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Fits a model to a feature matrix whose last column is the target
pub trait Trainer {
    type Model: RankingModel;

    fn train(&self, dataset: &FeatureMatrix) -> Result<Self::Model>;
}

impl<M: RankingModel + ?Sized> RankingModel for Box<M> {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        (**self).predict(features)
    }
}

/// bias + weights · features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Comparator over `[left, right]` pair rows scoring `w·left - w·right`
    pub fn pairwise(weights: &[f64]) -> Self {
        let mut both = weights.to_vec();
        both.extend(weights.iter().map(|w| -w));
        Self {
            weights: both,
            bias: 0.0,
        }
    }
}

impl RankingModel for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(LtrError::Model(format!(
                "expected {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        Ok(self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}

/// Per-column z-score scaling fitted on a training matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl Standardizer {
    /// Fit on the feature columns of `dataset`; the label column is left alone.
    /// Constant columns get a unit deviation so they map to 0.
    pub fn fit(dataset: &FeatureMatrix) -> Self {
        let width = dataset.num_features();
        let n = dataset.len();
        let mut means = vec![0.0; width];
        let mut std_devs = vec![1.0; width];

        if n == 0 {
            return Self { means, std_devs };
        }

        for row in dataset.iter_features() {
            for (mean, x) in means.iter_mut().zip(row) {
                *mean += x;
            }
        }
        means.iter_mut().for_each(|m| *m /= n as f64);

        if n > 1 {
            let mut sums = vec![0.0; width];
            for row in dataset.iter_features() {
                for (k, x) in row.iter().enumerate() {
                    sums[k] += (x - means[k]).powi(2);
                }
            }
            for (sd, sum) in std_devs.iter_mut().zip(sums) {
                let v = (sum / (n - 1) as f64).sqrt();
                *sd = if v > 0.0 { v } else { 1.0 };
            }
        }

        Self { means, std_devs }
    }

    pub fn transform_row(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .enumerate()
            .map(|(k, x)| match (self.means.get(k), self.std_devs.get(k)) {
                (Some(mean), Some(sd)) => (x - mean) / sd,
                _ => *x,
            })
            .collect()
    }

    /// Scaled copy of `dataset` with labels preserved
    pub fn transform(&self, dataset: &FeatureMatrix) -> FeatureMatrix {
        let mut scaled = FeatureMatrix::new(dataset.columns().to_vec());
        for i in 0..dataset.len() {
            let mut row = self.transform_row(dataset.features(i));
            row.push(dataset.label(i));
            scaled.push(row);
        }
        scaled
    }
}

/// A trained model plus the scaling its inputs were trained under
#[derive(Debug, Clone)]
pub struct ScaledModel<M> {
    pub scaler: Option<Standardizer>,
    pub model: M,
}

impl<M> ScaledModel<M> {
    pub fn unscaled(model: M) -> Self {
        Self {
            scaler: None,
            model,
        }
    }
}

impl<M: RankingModel> RankingModel for ScaledModel<M> {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        match &self.scaler {
            Some(scaler) => self.model.predict(&scaler.transform_row(features)),
            None => self.model.predict(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[[f64; 3]]) -> FeatureMatrix {
        let mut m = FeatureMatrix::new(vec!["a".into(), "b".into(), "label".into()]);
        for row in rows {
            m.push(row.to_vec());
        }
        m
    }

    #[test]
    fn test_linear_predict() {
        let model = LinearModel::new(vec![2.0, -1.0], 0.5);
        assert_eq!(model.predict(&[3.0, 1.0]).unwrap(), 5.5);
        assert!(matches!(model.predict(&[1.0]), Err(LtrError::Model(_))));
    }

    #[test]
    fn test_prediction_is_pure() {
        let model = LinearModel::new(vec![0.3, 0.7], 0.1);
        let row = [1.5, 2.5];
        let first = model.predict(&row).unwrap();
        for _ in 0..10 {
            assert_eq!(model.predict(&row).unwrap(), first);
        }
    }

    #[test]
    fn test_pairwise_comparator_is_antisymmetric() {
        let model = LinearModel::pairwise(&[1.0, 2.0]);
        let ab = model.predict(&[1.0, 1.0, 0.0, 1.0]).unwrap();
        let ba = model.predict(&[0.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(ab, 1.0);
        assert_eq!(ba, -1.0);
    }

    #[test]
    fn test_standardizer_leaves_label() {
        let m = matrix(&[[1.0, 5.0, 1.0], [3.0, 5.0, -1.0]]);
        let scaler = Standardizer::fit(&m);
        let scaled = scaler.transform(&m);

        assert!((scaled.features(0)[0] + 0.7071067811865475).abs() < 1e-12);
        assert!((scaled.features(1)[0] - 0.7071067811865475).abs() < 1e-12);
        // constant column collapses to zero
        assert_eq!(scaled.features(0)[1], 0.0);
        assert_eq!(scaled.label(0), 1.0);
        assert_eq!(scaled.label(1), -1.0);
    }

    #[test]
    fn test_scaled_model_applies_scaler() {
        let m = matrix(&[[1.0, 0.0, 0.0], [3.0, 0.0, 0.0]]);
        let scaled = ScaledModel {
            scaler: Some(Standardizer::fit(&m)),
            model: LinearModel::new(vec![1.0, 0.0], 0.0),
        };
        assert_eq!(scaled.predict(&[2.0, 0.0]).unwrap(), 0.0);
        assert!(scaled.predict(&[3.0, 0.0]).unwrap() > 0.0);
    }
}

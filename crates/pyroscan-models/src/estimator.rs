//! Externally owned tabular scorers.
//!
//! [`TabularEstimator`] is the seam where a real trained model plugs in. The
//! engine only ever calls it with a feature matrix and reads scores back; it
//! never inspects or mutates the estimator.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// "Given a matrix of rows, return a score per row."
pub trait TabularEstimator: Send + Sync + std::fmt::Debug {
    /// Direct prediction, one value per row.
    fn predict(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<f64>>;

    /// Whether [`predict_proba`](Self::predict_proba) is available.
    fn supports_proba(&self) -> bool {
        false
    }

    /// Class probabilities per row; the last column is the positive class.
    fn predict_proba(&self, _rows: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>> {
        Err(ModelError::Estimator(
            "estimator has no probability interface".into(),
        ))
    }

    /// Feature names the estimator was fitted on, if it recorded them.
    fn feature_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Expected row width, if known.
    fn n_features(&self) -> Option<usize> {
        None
    }
}

fn check_width(rows: &[Vec<f64>], width: usize) -> ModelResult<()> {
    match rows.iter().position(|r| r.len() != width) {
        Some(i) => Err(ModelError::Estimator(format!(
            "row {i} has {} features, expected {width}",
            rows[i].len()
        ))),
        None => Ok(()),
    }
}

fn dot(coefficients: &[f64], intercept: f64, row: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(row)
        .fold(intercept, |acc, (c, v)| acc + c * v)
}

/// Binary logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticEstimator {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl LogisticEstimator {
    fn positive_probability(&self, row: &[f64]) -> f64 {
        let z = dot(&self.coefficients, self.intercept, row);
        1.0 / (1.0 + (-z).exp())
    }
}

impl TabularEstimator for LogisticEstimator {
    /// Predicted class label (0 or 1).
    fn predict(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<f64>> {
        check_width(rows, self.coefficients.len())?;
        Ok(rows
            .iter()
            .map(|r| if self.positive_probability(r) >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }

    fn supports_proba(&self) -> bool {
        true
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>> {
        check_width(rows, self.coefficients.len())?;
        Ok(rows
            .iter()
            .map(|r| {
                let p = self.positive_probability(r);
                vec![1.0 - p, p]
            })
            .collect())
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        (!self.feature_names.is_empty()).then(|| self.feature_names.clone())
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }
}

/// Ordinary linear regression; output is unbounded until the adapter clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl TabularEstimator for LinearEstimator {
    fn predict(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<f64>> {
        check_width(rows, self.coefficients.len())?;
        Ok(rows
            .iter()
            .map(|r| dot(&self.coefficients, self.intercept, r))
            .collect())
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        (!self.feature_names.is_empty()).then(|| self.feature_names.clone())
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }
}

/// Serialized form of the built-in estimators, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EstimatorSpec {
    Logistic(LogisticEstimator),
    Linear(LinearEstimator),
}

impl EstimatorSpec {
    pub fn into_estimator(self) -> std::sync::Arc<dyn TabularEstimator> {
        match self {
            EstimatorSpec::Logistic(e) => std::sync::Arc::new(e),
            EstimatorSpec::Linear(e) => std::sync::Arc::new(e),
        }
    }
}

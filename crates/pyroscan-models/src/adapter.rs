//! Presents an external [`TabularEstimator`] through the tile/day interface.

use pyroscan_core::{clamp_unit, DayIndex, TileRecord};
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::estimator::TabularEstimator;
use crate::features::feature_value;

#[derive(Clone)]
pub struct AdaptedModel {
    pub model_name: String,
    /// Column order of every feature row handed to the estimator.
    pub feature_names: Vec<String>,
    estimator: Arc<dyn TabularEstimator>,
}

impl fmt::Debug for AdaptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedModel")
            .field("model_name", &self.model_name)
            .field("feature_names", &self.feature_names)
            .finish_non_exhaustive()
    }
}

impl AdaptedModel {
    pub fn new(
        model_name: impl Into<String>,
        estimator: Arc<dyn TabularEstimator>,
        feature_names: Vec<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            feature_names,
            estimator,
        }
    }

    /// One feature row per tile, columns in `feature_names` order.
    pub fn feature_matrix(&self, tiles: &[TileRecord], day: DayIndex) -> Vec<Vec<f64>> {
        tiles
            .iter()
            .map(|tile| {
                self.feature_names
                    .iter()
                    .map(|name| feature_value(&self.model_name, name, tile, day))
                    .collect()
            })
            .collect()
    }

    /// Score every tile in input order. Probability-capable estimators report
    /// the last (positive) class; others report their direct prediction.
    /// Either way each score is clamped to `[0, 1]`.
    pub fn predict_tile_records(&self, tiles: &[TileRecord], day: DayIndex) -> ModelResult<Vec<f64>> {
        if tiles.is_empty() {
            return Ok(Vec::new());
        }
        let matrix = self.feature_matrix(tiles, day);

        let scores: Vec<f64> = if self.estimator.supports_proba() {
            self.estimator
                .predict_proba(&matrix)?
                .iter()
                .map(|row| {
                    row.last().copied().ok_or_else(|| {
                        ModelError::Estimator("probability row has no classes".into())
                    })
                })
                .collect::<ModelResult<_>>()?
        } else {
            self.estimator.predict(&matrix)?
        };

        if scores.len() != tiles.len() {
            return Err(ModelError::ShapeMismatch {
                expected: tiles.len(),
                got: scores.len(),
            });
        }
        Ok(scores.into_iter().map(clamp_unit).collect())
    }
}

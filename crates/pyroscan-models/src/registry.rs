//! Name → model mapping and the resolution policy shared by every entry point.

use pyroscan_core::{DayIndex, TileRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};
use crate::model::RiskModel;
use crate::DEFAULT_MODEL_NAME;

/// Artifact suffixes callers sometimes leave on model names.
const MODEL_SUFFIXES: [&str; 2] = [".json", ".pkl"];

/// What a prediction returns when no model resolves (empty registry).
///
/// The two entry points of the service historically disagreed on this, so the
/// choice is made per integration rather than hidden in the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullModelPolicy {
    /// Succeed with `confidence: None` for every tile.
    #[default]
    Placeholder,
    /// Fail with [`ModelError::NoModelsAvailable`].
    Reject,
}

impl NullModelPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullModelPolicy::Placeholder => "placeholder",
            NullModelPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for NullModelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NullModelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeholder" | "null" => Ok(NullModelPolicy::Placeholder),
            "reject" | "error" => Ok(NullModelPolicy::Reject),
            other => Err(format!(
                "unknown null-model policy '{other}' (expected 'placeholder' or 'reject')"
            )),
        }
    }
}

/// Outcome of [`ModelRegistry::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Normalized requested name, kept for diagnostics.
    pub requested: String,
    /// Name of the model actually used; equals `requested` when nothing resolved.
    pub name: String,
    pub model: Option<&'a RiskModel>,
}

/// Scores for a batch, aligned with the input tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPrediction {
    pub requested_model: String,
    /// `None` when no model resolved and the placeholder policy applied.
    pub model: Option<String>,
    pub day: DayIndex,
    pub confidences: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilePrediction {
    pub requested_model: String,
    pub model: Option<String>,
    pub day: DayIndex,
    pub confidence: Option<f64>,
}

/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<String, RiskModel>,
    default_model: String,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
            default_model: DEFAULT_MODEL_NAME.to_string(),
        }
    }

    pub fn with_default_model(mut self, name: impl Into<String>) -> Self {
        self.default_model = name.into();
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, model: impl Into<RiskModel>) -> Option<RiskModel> {
        self.models.insert(name.into(), model.into())
    }

    pub fn get(&self, name: &str) -> Option<&RiskModel> {
        self.models.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Trim, default when blank, then drop a known artifact suffix.
    pub fn normalize_name(&self, requested: Option<&str>) -> String {
        let trimmed = requested.map(str::trim).unwrap_or_default();
        let name = if trimmed.is_empty() {
            self.default_model.as_str()
        } else {
            trimmed
        };
        MODEL_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .unwrap_or(name)
            .to_string()
    }

    /// Exact name, then the default model, then the lexicographically first
    /// registered model. Only an empty registry yields no model.
    pub fn resolve(&self, requested: Option<&str>) -> Resolution<'_> {
        let requested = self.normalize_name(requested);

        if let Some(model) = self.models.get(&requested) {
            return Resolution {
                name: requested.clone(),
                requested,
                model: Some(model),
            };
        }

        let fallback = self
            .models
            .get_key_value(&self.default_model)
            .or_else(|| self.models.iter().next());

        match fallback {
            Some((name, model)) => {
                tracing::debug!("Model '{}' not registered, falling back to '{}'", requested, name);
                Resolution {
                    name: name.clone(),
                    requested,
                    model: Some(model),
                }
            }
            None => Resolution {
                name: requested.clone(),
                requested,
                model: None,
            },
        }
    }

    /// Resolve `requested` and score `tiles` in order.
    pub fn predict_batch(
        &self,
        requested: Option<&str>,
        tiles: &[TileRecord],
        day: DayIndex,
        policy: NullModelPolicy,
    ) -> ModelResult<BatchPrediction> {
        let resolution = self.resolve(requested);
        let Some(model) = resolution.model else {
            return match policy {
                NullModelPolicy::Reject => Err(ModelError::NoModelsAvailable),
                NullModelPolicy::Placeholder => Ok(BatchPrediction {
                    requested_model: resolution.requested,
                    model: None,
                    day,
                    confidences: vec![None; tiles.len()],
                }),
            };
        };

        let confidences = model.predict_records(tiles, day)?;
        Ok(BatchPrediction {
            requested_model: resolution.requested,
            model: Some(resolution.name),
            day,
            confidences: confidences.into_iter().map(Some).collect(),
        })
    }

    pub fn predict_tile(
        &self,
        requested: Option<&str>,
        tile: &TileRecord,
        day: DayIndex,
        policy: NullModelPolicy,
    ) -> ModelResult<TilePrediction> {
        let resolution = self.resolve(requested);
        let confidence = match resolution.model {
            Some(model) => Some(model.predict_record(tile, day)?),
            None if policy == NullModelPolicy::Reject => return Err(ModelError::NoModelsAvailable),
            None => None,
        };
        Ok(TilePrediction {
            model: resolution.model.map(|_| resolution.name.clone()),
            requested_model: resolution.requested,
            day,
            confidence,
        })
    }
}

impl FromIterator<(String, RiskModel)> for ModelRegistry {
    fn from_iter<I: IntoIterator<Item = (String, RiskModel)>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
            default_model: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

//! Model artifacts on disk.
//!
//! Every `*.json` file in the models directory is one artifact; its file stem
//! is the registry key. The shape of each artifact is probed once here and
//! normalized into a [`RiskModel`]; artifacts with no usable shape are logged
//! and skipped, never fatal.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::adapter::AdaptedModel;
use crate::error::{ModelError, ModelResult};
use crate::estimator::EstimatorSpec;
use crate::generator::GeneratedModel;
use crate::model::RiskModel;
use crate::registry::ModelRegistry;

const ARTIFACT_EXTENSION: &str = "json";

const GENERATOR_FIELDS: [&str; 5] = [
    "baseline",
    "amplitude",
    "temporal_shift",
    "local_variance",
    "hotspot_strength",
];

#[derive(Deserialize)]
struct GeneratorArtifact {
    #[serde(default)]
    model_name: Option<String>,
    baseline: f64,
    amplitude: f64,
    temporal_shift: f64,
    local_variance: f64,
    hotspot_strength: f64,
}

/// Normalize one raw artifact into a model.
///
/// Recognized shapes:
/// - generator parameters (`baseline`, `amplitude`, `temporal_shift`,
///   `local_variance`, `hotspot_strength`, optional `model_name`);
/// - `{"estimator" | "model": <estimator spec>, "features"?: [..]}`;
/// - a bare estimator spec (`{"type": .., "coefficients": ..}`).
pub fn coerce_loaded_model(name: &str, raw: Value) -> ModelResult<RiskModel> {
    let no_capability = || ModelError::NoInferenceCapability(name.to_string());
    let Value::Object(map) = &raw else {
        return Err(no_capability());
    };

    if GENERATOR_FIELDS
        .iter()
        .all(|f| map.get(*f).is_some_and(Value::is_number))
    {
        let artifact: GeneratorArtifact = serde_json::from_value(raw)?;
        return Ok(RiskModel::Generated(GeneratedModel {
            model_name: artifact.model_name.unwrap_or_else(|| name.to_string()),
            baseline: artifact.baseline,
            amplitude: artifact.amplitude,
            temporal_shift: artifact.temporal_shift,
            local_variance: artifact.local_variance,
            hotspot_strength: artifact.hotspot_strength,
        }));
    }

    let (spec, declared) = match map.get("estimator").or_else(|| map.get("model")) {
        Some(spec) => (spec.clone(), map.get("features")),
        None if map.contains_key("type") => (raw.clone(), None),
        None => return Err(no_capability()),
    };
    let estimator = serde_json::from_value::<EstimatorSpec>(spec)
        .map_err(|e| {
            tracing::debug!("Artifact '{}' has an unusable estimator: {}", name, e);
            no_capability()
        })?
        .into_estimator();

    let mut feature_names: Vec<String> = declared
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    if feature_names.is_empty() {
        feature_names = estimator.feature_names().unwrap_or_default();
    }
    if feature_names.is_empty() {
        let count = estimator.n_features().unwrap_or(0);
        feature_names = (0..count).map(|i| format!("feature_{i}")).collect();
    }

    Ok(RiskModel::Adapted(AdaptedModel::new(name, estimator, feature_names)))
}

/// Load every artifact in `dir`. A missing directory yields an empty registry.
pub fn load_models(dir: impl AsRef<Path>) -> ModelRegistry {
    let dir = dir.as_ref();
    let mut registry = ModelRegistry::new();

    if !dir.is_dir() {
        tracing::info!("Models directory {} not found, registry is empty", dir.display());
        return registry;
    }

    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION))
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to read models directory {}: {}", dir.display(), e);
            return registry;
        }
    };
    paths.sort();

    let mut skipped: Vec<String> = Vec::new();
    for path in paths {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        match read_artifact(&stem, &path) {
            Ok(model) => {
                tracing::debug!("Loaded {} model '{}' from {}", model.kind(), stem, path.display());
                registry.insert(stem, model);
            }
            Err(e) => {
                tracing::warn!("Skipping model artifact {}: {}", path.display(), e);
                skipped.push(stem);
            }
        }
    }

    if registry.is_empty() {
        tracing::warn!("No models loaded from {}", dir.display());
    } else {
        tracing::info!(
            "Model registry ready: loaded=[{}], skipped=[{}]",
            registry.names().join(", "),
            skipped.join(", ")
        );
    }
    registry
}

fn read_artifact(name: &str, path: &Path) -> ModelResult<RiskModel> {
    let text = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&text)?;
    coerce_loaded_model(name, raw)
}

/// The three built-in demo generators.
pub fn demo_models() -> BTreeMap<String, GeneratedModel> {
    [
        GeneratedModel::new("global_model", 0.10, 0.62, 0.8, 0.08, 0.20),
        GeneratedModel::new("continent_model", 0.16, 0.66, 1.9, 0.11, 0.24),
        GeneratedModel::new("local_model", 0.21, 0.70, 3.1, 0.14, 0.28),
    ]
    .into_iter()
    .map(|m| (m.model_name.clone(), m))
    .collect()
}

/// Write the demo generators to `dir` as artifacts, returning their paths.
pub fn generate_demo_models(dir: impl AsRef<Path>) -> ModelResult<BTreeMap<String, PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut paths = BTreeMap::new();
    for (name, model) in demo_models() {
        let path = dir.join(format!("{name}.{ARTIFACT_EXTENSION}"));
        std::fs::write(&path, serde_json::to_string_pretty(&model)?)?;
        paths.insert(name, path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyroscan_core::{DayIndex, TileRecord};
    use serde_json::json;

    #[test]
    fn test_demo_models_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_demo_models(dir.path()).unwrap();
        assert_eq!(written.len(), 3);

        let registry = load_models(dir.path());
        assert_eq!(registry.names(), vec!["continent_model", "global_model", "local_model"]);

        let tile = TileRecord::new("5/18/10").unwrap();
        let day = DayIndex::clamped(6);
        for (name, model) in demo_models() {
            let loaded = registry.get(&name).unwrap();
            assert_eq!(loaded.predict_record(&tile, day).unwrap(), model.tile_signal(&tile.coord, day));
        }
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_models(dir.path().join("nope"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bad_artifacts_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("shapeless.json"), r#"{"weights": [1, 2]}"#).unwrap();
        std::fs::write(dir.path().join("forest.json"), r#"{"model": {"type": "forest"}}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(
            dir.path().join("fire_risk_model.json"),
            r#"{"baseline": 0.2, "amplitude": 0.5, "temporal_shift": 1.0, "local_variance": 0.1, "hotspot_strength": 0.3}"#,
        )
        .unwrap();

        let registry = load_models(dir.path());
        assert_eq!(registry.names(), vec!["fire_risk_model"]);
        assert_eq!(registry.get("fire_risk_model").unwrap().model_name(), "fire_risk_model");
    }

    #[test]
    fn test_generator_keeps_embedded_name() {
        let model = coerce_loaded_model(
            "renamed_file",
            json!({"model_name": "global_model", "baseline": 0.10, "amplitude": 0.62,
                   "temporal_shift": 0.8, "local_variance": 0.08, "hotspot_strength": 0.20}),
        )
        .unwrap();
        assert_eq!(model.model_name(), "global_model");
        assert_eq!(model.kind(), "generated");
    }

    #[test]
    fn test_estimator_shapes() {
        let declared = coerce_loaded_model(
            "lr",
            json!({"estimator": {"type": "logistic", "coefficients": [0.1, 0.2]}, "features": ["ndvi", "lst"]}),
        )
        .unwrap();
        let RiskModel::Adapted(adapted) = declared else {
            panic!("expected adapted model");
        };
        assert_eq!(adapted.feature_names, vec!["ndvi", "lst"]);

        let from_estimator = coerce_loaded_model(
            "lin",
            json!({"model": {"type": "linear", "coefficients": [1.0], "feature_names": ["weather"]}}),
        )
        .unwrap();
        let RiskModel::Adapted(adapted) = from_estimator else {
            panic!("expected adapted model");
        };
        assert_eq!(adapted.feature_names, vec!["weather"]);

        let bare = coerce_loaded_model(
            "bare",
            json!({"type": "linear", "coefficients": [1.0, 2.0, 3.0]}),
        )
        .unwrap();
        let RiskModel::Adapted(adapted) = bare else {
            panic!("expected adapted model");
        };
        assert_eq!(adapted.feature_names, vec!["feature_0", "feature_1", "feature_2"]);
    }

    #[test]
    fn test_unrecognized_shapes() {
        for raw in [json!([1, 2, 3]), json!("model"), json!({"baseline": 0.1}), json!({})] {
            assert!(matches!(
                coerce_loaded_model("x", raw),
                Err(ModelError::NoInferenceCapability(_))
            ));
        }
    }
}

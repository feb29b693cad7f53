//! Wildfire-risk prediction engine.
//!
//! Two model shapes answer the same question ("how risky is this tile on this
//! day?"): a deterministic procedural [`GeneratedModel`] and an
//! [`AdaptedModel`] that feeds synthesized feature rows to an externally owned
//! [`TabularEstimator`]. Both live behind the [`RiskModel`] variant and are
//! looked up through a [`ModelRegistry`].

pub mod adapter;
pub mod error;
pub mod estimator;
pub mod features;
pub mod generator;
pub mod hashing;
pub mod loader;
pub mod model;
pub mod registry;

pub use adapter::AdaptedModel;
pub use error::{ModelError, ModelResult};
pub use estimator::{EstimatorSpec, LinearEstimator, LogisticEstimator, TabularEstimator};
pub use generator::{GeneratedModel, SignalComponents};
pub use hashing::hash_unit;
pub use loader::{coerce_loaded_model, demo_models, generate_demo_models, load_models};
pub use model::RiskModel;
pub use registry::{BatchPrediction, ModelRegistry, NullModelPolicy, Resolution, TilePrediction};

/// Model used when a request names none, and the first fallback when a
/// requested name is not registered.
pub const DEFAULT_MODEL_NAME: &str = "fire_risk_model";

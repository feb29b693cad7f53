use pyroscan_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("model '{0}' is not inference-capable")]
    NoInferenceCapability(String),

    #[error("no models available. Add .json model files to the models directory")]
    NoModelsAvailable,

    #[error("Estimator error: {0}")]
    Estimator(String),

    #[error("Estimator returned {got} scores for {expected} rows")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

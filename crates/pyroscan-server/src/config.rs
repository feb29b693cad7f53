use anyhow::{Context, Result};
use pyroscan_core::RiskScheme;
use pyroscan_models::{NullModelPolicy, DEFAULT_MODEL_NAME};
use serde::Serialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub default_model: String,
    /// Behaviour when no model resolves: placeholder scores or a hard 503.
    pub null_model_policy: NullModelPolicy,
    /// Table used when a request does not name one.
    pub default_scheme: RiskScheme,
    /// Decimal places kept in response confidences.
    pub confidence_decimals: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            models_dir: PathBuf::from("models"),
            default_model: DEFAULT_MODEL_NAME.to_string(),
            null_model_policy: NullModelPolicy::Placeholder,
            default_scheme: RiskScheme::Tiered,
            confidence_decimals: 6,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            host: env::var("PYROSCAN_HOST").unwrap_or(defaults.host),
            port: env::var("PYROSCAN_PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .context("PYROSCAN_PORT must be a port number")?,
            models_dir: env::var("PYROSCAN_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            default_model: env::var("PYROSCAN_DEFAULT_MODEL").unwrap_or(defaults.default_model),
            null_model_policy: env::var("PYROSCAN_NULL_MODEL_POLICY")
                .unwrap_or_else(|_| defaults.null_model_policy.to_string())
                .parse()
                .map_err(anyhow::Error::msg)
                .context("invalid PYROSCAN_NULL_MODEL_POLICY")?,
            default_scheme: env::var("PYROSCAN_RISK_SCHEME")
                .unwrap_or_default()
                .parse()
                .map_err(anyhow::Error::msg)
                .context("invalid PYROSCAN_RISK_SCHEME")?,
            confidence_decimals: env::var("PYROSCAN_CONFIDENCE_DECIMALS")
                .unwrap_or_else(|_| defaults.confidence_decimals.to_string())
                .parse()
                .context("PYROSCAN_CONFIDENCE_DECIMALS must be a non-negative integer")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_model.trim().is_empty() {
            anyhow::bail!("PYROSCAN_DEFAULT_MODEL must not be empty");
        }
        if self.confidence_decimals > 15 {
            anyhow::bail!("PYROSCAN_CONFIDENCE_DECIMALS must be at most 15");
        }
        Ok(())
    }
}

//! Confidence → risk label tables.
//!
//! Two independent tables exist and are selected per call site: the
//! five-bucket [`RiskCategory`] used by the prediction API, and the
//! four-bucket [`LegacyRiskLevel`] used for area summaries. They are not
//! interchangeable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::clamp_unit;

/// Five-bucket risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Safe,
    Guarded,
    Elevated,
    High,
    Extreme,
}

/// Half-open `[lower, upper)` intervals. The last upper bound sits above 1.0
/// so a clamped confidence of exactly 1.0 lands in `Extreme`.
pub const RISK_THRESHOLDS: [(RiskCategory, f64, f64); 5] = [
    (RiskCategory::Safe, 0.00, 0.20),
    (RiskCategory::Guarded, 0.20, 0.40),
    (RiskCategory::Elevated, 0.40, 0.60),
    (RiskCategory::High, 0.60, 0.80),
    (RiskCategory::Extreme, 0.80, 1.01),
];

impl RiskCategory {
    pub fn from_confidence(confidence: f64) -> Self {
        let c = clamp_unit(confidence);
        RISK_THRESHOLDS
            .iter()
            .find(|(_, lower, upper)| *lower <= c && c < *upper)
            .map(|(category, _, _)| *category)
            .unwrap_or(RiskCategory::Extreme)
    }

    /// An absent confidence (no model) is reported as `Safe`.
    pub fn from_optional(confidence: Option<f64>) -> Self {
        confidence.map_or(RiskCategory::Safe, Self::from_confidence)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Safe => "safe",
            RiskCategory::Guarded => "guarded",
            RiskCategory::Elevated => "elevated",
            RiskCategory::High => "high",
            RiskCategory::Extreme => "extreme",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Four-bucket risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyRiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl LegacyRiskLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        match clamp_unit(confidence) {
            c if c < 0.30 => LegacyRiskLevel::Low,
            c if c < 0.50 => LegacyRiskLevel::Moderate,
            c if c < 0.70 => LegacyRiskLevel::High,
            _ => LegacyRiskLevel::Extreme,
        }
    }

    pub fn from_optional(confidence: Option<f64>) -> Self {
        confidence.map_or(LegacyRiskLevel::Low, Self::from_confidence)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LegacyRiskLevel::Low => "low",
            LegacyRiskLevel::Moderate => "moderate",
            LegacyRiskLevel::High => "high",
            LegacyRiskLevel::Extreme => "extreme",
        }
    }
}

impl fmt::Display for LegacyRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which table a call site classifies with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskScheme {
    #[default]
    Tiered,
    Legacy,
}

impl RiskScheme {
    pub fn classify(&self, confidence: Option<f64>) -> &'static str {
        match self {
            RiskScheme::Tiered => RiskCategory::from_optional(confidence).label(),
            RiskScheme::Legacy => LegacyRiskLevel::from_optional(confidence).label(),
        }
    }
}

impl FromStr for RiskScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "tiered" | "five" => Ok(RiskScheme::Tiered),
            "legacy" | "four" => Ok(RiskScheme::Legacy),
            other => Err(format!("unknown risk scheme '{other}' (expected 'tiered' or 'legacy')")),
        }
    }
}

use pyroscan_core::{DayIndex, TileRecord};

use crate::adapter::AdaptedModel;
use crate::error::ModelResult;
use crate::generator::GeneratedModel;

/// A registered model. Dispatch is by variant; there is no capability probing
/// at prediction time.
#[derive(Debug, Clone)]
pub enum RiskModel {
    Generated(GeneratedModel),
    Adapted(AdaptedModel),
}

impl RiskModel {
    /// Name the model seeds its hashes with.
    pub fn model_name(&self) -> &str {
        match self {
            RiskModel::Generated(m) => &m.model_name,
            RiskModel::Adapted(m) => &m.model_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RiskModel::Generated(_) => "generated",
            RiskModel::Adapted(_) => "adapted",
        }
    }

    /// Score tiles in input order.
    pub fn predict_records(&self, tiles: &[TileRecord], day: DayIndex) -> ModelResult<Vec<f64>> {
        match self {
            RiskModel::Generated(m) => Ok(tiles.iter().map(|t| m.tile_signal(&t.coord, day)).collect()),
            RiskModel::Adapted(m) => m.predict_tile_records(tiles, day),
        }
    }

    pub fn predict_record(&self, tile: &TileRecord, day: DayIndex) -> ModelResult<f64> {
        match self {
            RiskModel::Generated(m) => Ok(m.tile_signal(&tile.coord, day)),
            RiskModel::Adapted(m) => Ok(m
                .predict_tile_records(std::slice::from_ref(tile), day)?
                .first()
                .copied()
                .unwrap_or_default()),
        }
    }
}

impl From<GeneratedModel> for RiskModel {
    fn from(model: GeneratedModel) -> Self {
        RiskModel::Generated(model)
    }
}

impl From<AdaptedModel> for RiskModel {
    fn from(model: AdaptedModel) -> Self {
        RiskModel::Adapted(model)
    }
}

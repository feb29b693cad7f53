//! Deterministic procedural risk model.
//!
//! Stands in for a trained model: the score for a tile/day is a weighted blend
//! of hashed and geometric signals, fully determined by the model's five
//! parameters, its name, the tile coordinate, and the day.

use pyroscan_core::{clamp_unit, parse_tile_id, CoreResult, DayIndex, TileCoordinate};
use serde::{Deserialize, Serialize};

use crate::hashing::hash_unit;

const COARSE_WEIGHT: f64 = 0.33;
const FINE_WEIGHT: f64 = 0.17;
const WAVE_WEIGHT: f64 = 0.24;
const BIAS_WEIGHT: f64 = 0.16;

const HOTSPOT_DRIFT_X: f64 = 0.08;
const HOTSPOT_DRIFT_Y: f64 = 0.05;
const HOTSPOT_FALLOFF: f64 = 2.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedModel {
    /// Seed for every hashed term. Two models with equal parameters but
    /// different names produce unrelated maps.
    pub model_name: String,
    pub baseline: f64,
    pub amplitude: f64,
    pub temporal_shift: f64,
    pub local_variance: f64,
    pub hotspot_strength: f64,
}

/// The individual terms behind one score, before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalComponents {
    /// Shared by ~3x3 tile neighbourhoods over ~2-day windows.
    pub coarse: f64,
    /// Per tile, constant across days.
    pub fine: f64,
    pub temporal_wave: f64,
    pub equatorial_bias: f64,
    /// Cone around the model's drifting hotspot centre.
    pub hotspot: f64,
    /// Un-weighted perturbation, already scaled by `local_variance`.
    pub daily_noise: f64,
}

impl GeneratedModel {
    pub fn new(
        model_name: impl Into<String>,
        baseline: f64,
        amplitude: f64,
        temporal_shift: f64,
        local_variance: f64,
        hotspot_strength: f64,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            baseline,
            amplitude,
            temporal_shift,
            local_variance,
            hotspot_strength,
        }
    }

    /// Hotspot centre for `day`, in normalized grid units.
    pub fn hotspot_center(&self, day: DayIndex) -> (f64, f64) {
        let name = self.model_name.as_str();
        let d = day.as_f64();
        let hx = (hash_unit(&[&name, &"hotspot-x"]) + HOTSPOT_DRIFT_X * d) % 1.0;
        let hy = (hash_unit(&[&name, &"hotspot-y"]) + HOTSPOT_DRIFT_Y * d) % 1.0;
        (hx, hy)
    }

    pub fn components(&self, coord: &TileCoordinate, day: DayIndex) -> SignalComponents {
        let name = self.model_name.as_str();
        let (z, x, y) = (coord.zoom, coord.x, coord.y);
        let d = day.get();
        let (nx, ny) = coord.normalized();

        let coarse = hash_unit(&[&name, &"coarse", &z, &(x / 3), &(y / 3), &(d / 2)]);
        let fine = hash_unit(&[&name, &"fine", &z, &x, &y]);

        let temporal_wave =
            (((d as f64 + self.temporal_shift) * 0.67 + nx * 5.8 + ny * 4.1).sin() + 1.0) * 0.5;

        let equatorial_bias = 1.0 - (ny * 2.0 - 1.0).abs();

        let (hx, hy) = self.hotspot_center(day);
        let distance = (nx - hx).hypot(ny - hy);
        let hotspot = (1.0 - distance * HOTSPOT_FALLOFF).max(0.0);

        let daily_noise =
            (hash_unit(&[&name, &"noise", &z, &x, &y, &d]) - 0.5) * self.local_variance;

        SignalComponents {
            coarse,
            fine,
            temporal_wave,
            equatorial_bias,
            hotspot,
            daily_noise,
        }
    }

    /// Risk confidence for one tile on one day, always in `[0, 1]`.
    pub fn tile_signal(&self, coord: &TileCoordinate, day: DayIndex) -> f64 {
        let c = self.components(coord, day);
        let raw = self.baseline
            + self.amplitude
                * (COARSE_WEIGHT * c.coarse
                    + FINE_WEIGHT * c.fine
                    + WAVE_WEIGHT * c.temporal_wave
                    + BIAS_WEIGHT * c.equatorial_bias
                    + self.hotspot_strength * c.hotspot)
            + c.daily_noise;
        clamp_unit(raw)
    }

    /// Scores for already-parsed coordinates, in input order.
    pub fn predict_coords(&self, coords: &[TileCoordinate], day: DayIndex) -> Vec<f64> {
        coords.iter().map(|c| self.tile_signal(c, day)).collect()
    }

    /// Scores for raw tile ids. Any invalid id fails the whole call before
    /// anything is scored. `day` is clamped, never rejected.
    pub fn predict_proba<S: AsRef<str>>(&self, tile_ids: &[S], day: i64) -> CoreResult<Vec<f64>> {
        let coords = tile_ids
            .iter()
            .map(|id| parse_tile_id(id.as_ref()))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(self.predict_coords(&coords, DayIndex::clamped(day)))
    }

    pub fn predict(&self, tile_id: &str, day: i64) -> CoreResult<f64> {
        let coord = parse_tile_id(tile_id)?;
        Ok(self.tile_signal(&coord, DayIndex::clamped(day)))
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::tile::parse_tile_id;

/// A validated `zoom/x/y` address on the quadtree tile grid.
///
/// Construct through [`TileCoordinate::new`] or [`parse_tile_id`]; both enforce
/// `x, y <= 2^zoom - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub zoom: u32,
    pub x: u64,
    pub y: u64,
}

impl TileCoordinate {
    pub fn new(zoom: u32, x: u64, y: u64) -> CoreResult<Self> {
        let max_index = Self::max_index(zoom);
        if x > max_index || y > max_index {
            return Err(CoreError::InvalidTileBounds {
                zoom,
                x,
                y,
                max_index,
            });
        }
        Ok(Self { zoom, x, y })
    }

    /// Largest valid column/row index at `zoom`. Zoom levels of 64 and above
    /// admit every `u64`.
    pub fn max_index(zoom: u32) -> u64 {
        if zoom >= 64 {
            u64::MAX
        } else {
            (1u64 << zoom) - 1
        }
    }

    /// Number of tiles along one axis, as a float.
    pub fn grid_size(&self) -> f64 {
        2f64.powi(self.zoom.min(i32::MAX as u32) as i32)
    }

    /// Column and row as fractions of the grid, each in `[0, 1)`.
    pub fn normalized(&self) -> (f64, f64) {
        let denom = self.grid_size();
        (self.x as f64 / denom, self.y as f64 / denom)
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Forecast day offset, always within `[0, 9]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayIndex(u8);

impl DayIndex {
    pub const MIN: DayIndex = DayIndex(0);
    pub const MAX: DayIndex = DayIndex(9);

    /// Clamp any integer into range. Out-of-range days are never rejected.
    pub fn clamped(day: i64) -> Self {
        DayIndex(day.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    /// Lenient text parsing: the empty string means day 0, integers (with
    /// optional surrounding whitespace) are clamped, anything else, including
    /// whitespace-only text, is `InvalidDay`.
    pub fn parse(text: &str) -> CoreResult<Self> {
        if text.is_empty() {
            return Ok(Self::MIN);
        }
        let trimmed = text.trim();
        trimmed
            .parse::<i64>()
            .map(Self::clamped)
            .or_else(|_| {
                // Integral strings too large for i64 still clamp.
                let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(if trimmed.starts_with('-') {
                        Self::MIN
                    } else {
                        Self::MAX
                    })
                } else {
                    Err(invalid_day())
                }
            })
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DayIndex> for i64 {
    fn from(day: DayIndex) -> Self {
        day.0 as i64
    }
}

pub fn invalid_day() -> CoreError {
    CoreError::InvalidDay("day must be an integer between 0 and 9".to_string())
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Coerce a loosely-typed JSON value to a finite float: numbers, numeric
/// strings, and booleans qualify.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// One tile in a prediction request: its id, parsed coordinate, optional
/// geographic location, and any caller-supplied feature overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRecord {
    pub id: String,
    #[serde(skip)]
    pub coord: TileCoordinate,
    pub lat: f64,
    pub lng: f64,
    /// Whether `lat`/`lng` came from the caller rather than defaulting to 0.
    #[serde(skip)]
    pub has_location: bool,
    #[serde(flatten)]
    pub features: BTreeMap<String, Value>,
}

impl TileRecord {
    pub fn new(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        let coord = parse_tile_id(&id)?;
        Ok(Self {
            id,
            coord,
            lat: 0.0,
            lng: 0.0,
            has_location: false,
            features: BTreeMap::new(),
        })
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.lat = lat;
        self.lng = lng;
        self.has_location = true;
        self
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: Value) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Caller-supplied value for `name`, if one exists and is numeric.
    ///
    /// The built-in `id`, `lat` and `lng` fields take part in the lookup so a
    /// model declaring a `lat` feature reads the tile's latitude. A record
    /// built without a location has no `lat`/`lng` value of its own.
    pub fn feature_value(&self, name: &str) -> Option<f64> {
        match name {
            "id" => coerce_f64(&Value::String(self.id.clone())),
            "lat" if self.has_location => Some(self.lat),
            "lng" if self.has_location => Some(self.lng),
            _ => self.features.get(name).and_then(coerce_f64),
        }
    }
}

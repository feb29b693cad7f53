//! Payload validation for the prediction endpoints.
//!
//! Every check runs before any model is touched, and the first failure is
//! reported with the offending tile index.

use pyroscan_core::{coerce_f64, invalid_day, CoreError, CoreResult, DayIndex, RiskScheme, TileRecord};
use serde_json::{Map, Value};

use crate::AppError;

/// Descriptor keys held natively by [`TileRecord`]. Every other key the caller
/// sends, `tile`/`latitude`/`longitude` included, stays a feature override.
const RECORD_KEYS: [&str; 3] = ["id", "lat", "lng"];

/// A fully validated batch request.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub day: DayIndex,
    pub tiles: Vec<TileRecord>,
    pub model: Option<String>,
    pub scheme: Option<RiskScheme>,
}

pub fn parse_batch_request(payload: &Value) -> Result<BatchRequest, AppError> {
    let Value::Object(body) = payload else {
        return Err(AppError::bad_request("JSON body is required"));
    };

    let tiles = parse_tiles(body.get("tiles"))?;
    let day = parse_day_value(body.get("day"))?;
    let model = body.get("model").and_then(model_name);
    let scheme = match body.get("scheme") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(parse_scheme(s)?),
        Some(_) => return Err(AppError::bad_request("scheme must be a string")),
    };

    Ok(BatchRequest {
        day,
        tiles,
        model,
        scheme,
    })
}

pub fn parse_scheme(text: &str) -> Result<RiskScheme, AppError> {
    text.parse::<RiskScheme>().map_err(AppError::bad_request)
}

/// Day from a JSON value. Absent, null and blank mean day 0; integral values
/// clamp to `[0, 9]`; fractional numbers truncate toward zero first.
pub fn parse_day_value(value: Option<&Value>) -> CoreResult<DayIndex> {
    match value {
        None | Some(Value::Null) => Ok(DayIndex::MIN),
        Some(Value::Bool(b)) => Ok(DayIndex::clamped(*b as i64)),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(DayIndex::clamped(i))
            } else if n.is_u64() {
                Ok(DayIndex::MAX)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| DayIndex::clamped(f.trunc() as i64))
                    .ok_or_else(invalid_day)
            }
        }
        Some(Value::String(s)) => DayIndex::parse(s),
        Some(_) => Err(invalid_day()),
    }
}

fn parse_tiles(value: Option<&Value>) -> CoreResult<Vec<TileRecord>> {
    let entries = match value {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(CoreError::MissingTiles),
    };
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_tile_entry(index, entry))
        .collect()
}

fn entry_error(index: usize, reason: impl ToString) -> CoreError {
    CoreError::InvalidTileEntry {
        index,
        reason: reason.to_string(),
    }
}

/// A bare tile id string, or an object with `id`/`tile`, optional location,
/// and optional feature overrides.
pub fn parse_tile_entry(index: usize, entry: &Value) -> CoreResult<TileRecord> {
    match entry {
        Value::String(id) => TileRecord::new(id.as_str()).map_err(|e| entry_error(index, e)),
        Value::Object(map) => {
            let id = ["id", "tile"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .ok_or_else(|| entry_error(index, "id is required"))?;

            let lat = location(map, "lat", "latitude", index)?;
            let lng = location(map, "lng", "longitude", index)?;

            let record = TileRecord::new(id)
                .map_err(|e| entry_error(index, e))?
                .with_location(lat, lng);

            Ok(map
                .iter()
                .filter(|(key, _)| !RECORD_KEYS.contains(&key.as_str()))
                .fold(record, |record, (key, value)| {
                    record.with_feature(key.clone(), value.clone())
                }))
        }
        _ => Err(entry_error(index, "tiles entries must be strings or objects")),
    }
}

fn location(map: &Map<String, Value>, key: &str, alias: &str, index: usize) -> CoreResult<f64> {
    match map.get(key).or_else(|| map.get(alias)) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(value) => coerce_f64(value).ok_or_else(|| entry_error(index, format!("{key} must be a number"))),
    }
}

fn model_name(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

//! Feature values for the tabular adapter.
//!
//! A caller-supplied numeric value always wins. Otherwise a plausible value is
//! synthesized from the tile's location, the day, and a hash keyed by the
//! model and feature name.

use pyroscan_core::{DayIndex, TileRecord};

use crate::hashing::{hash_unit, round_to};

/// Resolve one feature for one tile. `name` is matched case-insensitively.
pub fn feature_value(model_name: &str, feature_name: &str, tile: &TileRecord, day: DayIndex) -> f64 {
    let name = feature_name.to_lowercase();
    tile.feature_value(&name)
        .unwrap_or_else(|| synthesize_feature(model_name, &name, tile, day))
}

/// Fallback formula for a lower-cased feature name.
pub fn synthesize_feature(model_name: &str, name: &str, tile: &TileRecord, day: DayIndex) -> f64 {
    let lat = tile.lat;
    let lng = tile.lng;
    let d = day.as_f64();
    let base = hash_unit(&[
        &model_name,
        &name,
        &tile.id.as_str(),
        &day.get(),
        &round_to(lat, 3),
        &round_to(lng, 3),
    ]);

    match name {
        "slope" => ((lat * 2.3).to_radians().sin() * 35.0).abs() + base * 8.0,
        "aspect" => ((lat + 1e-6).atan2(lng + 1e-6).to_degrees() + 360.0).rem_euclid(360.0),
        "roads" => ((1.0 - base) * 55.0 + lat.abs() * 0.3).clamp(0.0, 100.0),
        "landcover" => (base * 9.999).trunc(),
        "ndvi" => (0.2 + 0.65 * lat.to_radians().cos().powi(2) - base * 0.12).clamp(0.0, 1.0),
        "ndmi" => (-0.2 + 0.75 * (lng * 0.7).to_radians().sin() + (base - 0.5) * 0.2).clamp(-1.0, 1.0),
        "lst" => {
            let seasonal = ((d + 1.0) * 0.62 + lat * 0.04).sin();
            (18.0 + lat.abs() * 0.25 + 18.0 * seasonal + base * 6.0).clamp(0.0, 70.0)
        }
        "weather" => (0.25 + 0.55 * (d * 0.7 + lng * 0.03).sin() + (base - 0.5) * 0.2).clamp(0.0, 1.0),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sf_tile() -> TileRecord {
        TileRecord::new("4/4/4").unwrap().with_location(37.7749, -122.4194)
    }

    #[test]
    fn test_reference_fallbacks() {
        // Values from an independent implementation of the same formulas.
        let tile = sf_tile();
        let day = DayIndex::clamped(3);
        let expected = [
            ("slope", 37.381617635168894),
            ("aspect", 162.85136617170394),
            ("roads", 39.20474622531184),
            ("landcover", 0.0),
            ("ndvi", 0.5094098775999174),
            ("ndmi", -0.9780165887933622),
            ("lst", 17.893833783035884),
            ("weather", 0.0),
            ("elevation", 0.6747929971417087),
        ];
        for (name, value) in expected {
            let got = synthesize_feature("wildfire_lr", name, &tile, day);
            assert!((got - value).abs() < 1e-9, "{name}: {got} != {value}");
        }
    }

    #[test]
    fn test_supplied_value_wins() {
        let tile = sf_tile().with_feature("ndvi", json!(0.73));
        assert_eq!(feature_value("m", "NDVI", &tile, DayIndex::MIN), 0.73);
    }

    #[test]
    fn test_non_numeric_override_falls_back() {
        let plain = sf_tile();
        let junk = sf_tile().with_feature("slope", json!("steep"));
        let day = DayIndex::clamped(2);
        assert_eq!(
            feature_value("m", "slope", &junk, day),
            feature_value("m", "slope", &plain, day)
        );
    }

    #[test]
    fn test_bounded_fallbacks() {
        for d in 0..=9 {
            let day = DayIndex::clamped(d);
            for (lat, lng) in [(0.0, 0.0), (-89.9, 179.9), (64.2, -150.0)] {
                let tile = TileRecord::new("3/2/5").unwrap().with_location(lat, lng);
                let ndvi = synthesize_feature("m", "ndvi", &tile, day);
                let ndmi = synthesize_feature("m", "ndmi", &tile, day);
                let lst = synthesize_feature("m", "lst", &tile, day);
                let landcover = synthesize_feature("m", "landcover", &tile, day);
                let aspect = synthesize_feature("m", "aspect", &tile, day);
                assert!((0.0..=1.0).contains(&ndvi));
                assert!((-1.0..=1.0).contains(&ndmi));
                assert!((0.0..=70.0).contains(&lst));
                assert!((0.0..=9.0).contains(&landcover) && landcover.fract() == 0.0);
                assert!((0.0..360.0).contains(&aspect));
            }
        }
    }
}

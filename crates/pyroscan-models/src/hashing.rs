//! Hash-to-unit primitive: the only source of pseudo-randomness in the engine.
//!
//! Parts are rendered to text, joined with `|`, hashed with SHA-256, and the
//! first 8 digest bytes (big-endian) are divided by `u64::MAX`. The textual
//! rendering is part of the contract: integers print in decimal, floats in
//! shortest round-trip form with a trailing `.0` when integral and an
//! `e±NN` exponent outside `[1e-4, 1e16)`. Changing any of it changes every
//! score produced by every model.

use sha2::{Digest, Sha256};

/// Something that can be fed to [`hash_unit`].
pub trait HashPart {
    fn write_part(&self, out: &mut String);
}

impl HashPart for &str {
    fn write_part(&self, out: &mut String) {
        out.push_str(self);
    }
}

impl HashPart for String {
    fn write_part(&self, out: &mut String) {
        out.push_str(self);
    }
}

macro_rules! int_hash_part {
    ($($t:ty),*) => {
        $(impl HashPart for $t {
            fn write_part(&self, out: &mut String) {
                out.push_str(&self.to_string());
            }
        })*
    };
}

int_hash_part!(u8, u32, u64, i64, usize);

impl HashPart for f64 {
    fn write_part(&self, out: &mut String) {
        out.push_str(&float_repr(*self));
    }
}

/// Stable hash of `parts` mapped to `[0, 1]`.
pub fn hash_unit(parts: &[&dyn HashPart]) -> f64 {
    let mut text = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            text.push('|');
        }
        part.write_part(&mut text);
    }

    let digest = Sha256::digest(text.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) as f64 / u64::MAX as f64
}

/// Round to `digits` decimals, ties to even on the exact binary value.
pub fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.digits$}").parse().unwrap_or(value)
}

fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{value:e}");
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_unit_reference_values() {
        // Reference values from the same SHA-256 scheme computed independently.
        assert_eq!(hash_unit(&[&"a"]), 0.7913742705223816);
        assert_eq!(hash_unit(&[&"global_model", &"hotspot-x"]), 0.937504751166795);
        assert_eq!(
            hash_unit(&[&"global_model", &"coarse", &4u32, &1u64, &1u64, &0u8]),
            0.12222930616997964
        );
        assert_eq!(
            hash_unit(&[&"wildfire_lr", &"ndvi", &"4/4/4", &3u8, &37.775f64, &-122.419f64]),
            0.8057509098250619
        );
        assert_eq!(
            hash_unit(&[&"wildfire_lr", &"slope", &"4/4/4", &3u8, &0.0f64, &0.0f64]),
            0.48187912653331666
        );
    }

    #[test]
    fn test_hash_unit_in_range() {
        for i in 0..500u64 {
            let v = hash_unit(&[&"range", &i]);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(-0.0), "-0.0");
        assert_eq!(float_repr(37.0), "37.0");
        assert_eq!(float_repr(37.775), "37.775");
        assert_eq!(float_repr(-122.419), "-122.419");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(1e-5), "1e-05");
        assert_eq!(float_repr(1.5e16), "1.5e+16");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(37.7749, 3), 37.775);
        assert_eq!(round_to(-122.4194, 3), -122.419);
        assert_eq!(round_to(-0.0004, 3), 0.0);
        assert_eq!(round_to(f64::INFINITY, 3), f64::INFINITY);
    }
}

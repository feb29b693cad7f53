//! Tile identifier codec.
//!
//! A tile id is `zoom/x/y`: exactly three slash-separated non-negative decimal
//! integers. Surrounding whitespace is ignored; anything else is rejected.

use crate::error::{CoreError, CoreResult};
use crate::types::TileCoordinate;

/// Parse and bounds-check a tile id.
pub fn parse_tile_id(tile_id: &str) -> CoreResult<TileCoordinate> {
    let trimmed = tile_id.trim();
    let format_err = || CoreError::InvalidTileFormat(tile_id.to_string());

    let mut parts = trimmed.split('/');
    let (Some(z), Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format_err());
    };

    if ![z, x, y]
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(format_err());
    }

    let zoom = z.parse::<u32>().map_err(|_| format_err())?;
    let x = x.parse::<u64>().map_err(|_| format_err())?;
    let y = y.parse::<u64>().map_err(|_| format_err())?;

    TileCoordinate::new(zoom, x, y)
}

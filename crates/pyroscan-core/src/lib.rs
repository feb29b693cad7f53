pub mod classify;
pub mod error;
pub mod tile;
pub mod types;

pub use classify::{LegacyRiskLevel, RiskCategory, RiskScheme};
pub use error::*;
pub use tile::parse_tile_id;
pub use types::*;

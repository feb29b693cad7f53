use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("tile must match format 'z/x/y' with integer components (got {0:?})")]
    InvalidTileFormat(String),

    #[error("x and y must be <= {max_index} for z={zoom} (got x={x}, y={y})")]
    InvalidTileBounds {
        zoom: u32,
        x: u64,
        y: u64,
        max_index: u64,
    },

    #[error("{0}")]
    InvalidDay(String),

    #[error("tiles must be a non-empty array")]
    MissingTiles,

    #[error("tiles[{index}]: {reason}")]
    InvalidTileEntry { index: usize, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

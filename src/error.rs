use thiserror::Error;

use crate::tile::TileCoord;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("Invalid extent: {0}")]
    Extent(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Zoom level {zoom} outside grid range {min}..={max}")]
    ZoomOutOfRange { zoom: u32, min: u32, max: u32 },
}

#[derive(Error, Debug)]
pub enum TileError {
    #[error("I/O error for tile {coord}: {source}")]
    Io {
        coord: TileCoord,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG decode failed: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("PNG encode failed: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Tile {0} not found and no fallback source configured")]
    NoFallback(TileCoord),

    #[error("Tile {0} not found")]
    NotFound(TileCoord),

    #[error("Tile fill cancelled")]
    Cancelled,

    #[error("Invalid pixel buffer shape: {0}")]
    Shape(String),
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Loader is already running")]
    Busy,

    #[error("Failed to spawn loader worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Loader worker panicked")]
    WorkerPanicked,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },

    #[error("Invalid URI template {0:?}: must start with '/' and contain {{z}}, {{x}} and {{y}}")]
    UriTemplate(String),

    #[error("Invalid tile grid: {0}")]
    Grid(#[from] GridError),
}

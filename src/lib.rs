//! Map projections, tile grids, tile sources and a background tile loader
//! for hydrographic survey map displays.

pub mod affine;
pub mod clip;
pub mod error;
pub mod grid;
pub mod loader;
pub mod proj;
pub mod source;
pub mod tile;

pub use error::{ConfigError, GridError, LoaderError, TileError};
pub use grid::{TileGrid, TileRange};
pub use loader::{LoadEvent, LoadHandle, LoadReport, TileLoader};
pub use proj::{GeoPoint, Limits, Point, Projection};
pub use source::{Cancellation, FileTileSource, HttpSourceConfig, HttpTileSource, TileSource};
pub use tile::{Tile, TileCoord};

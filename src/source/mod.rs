//! Tile sources: providers that fill a tile's pixels for a coordinate.

pub mod config;
pub mod file;
pub mod http;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TileError;
use crate::grid::TileGrid;
use crate::proj::Projection;
use crate::tile::Tile;

pub use config::HttpSourceConfig;
pub use file::FileTileSource;
pub use http::HttpTileSource;

/// Cooperative cancellation flag shared between a requester and a worker.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A provider of tile pixels.
///
/// Sources are long-lived and shared across threads; they keep no per-tile
/// state. Each source describes the grid and projection its tiles live in.
pub trait TileSource: Send + Sync {
    fn grid(&self) -> &TileGrid;

    fn projection(&self) -> Arc<dyn Projection>;

    /// Fill `tile` with pixels. On error the tile payload is left unchanged.
    ///
    /// `cancel` is polled between blocking steps; an in-flight read is not
    /// interrupted.
    fn fill_tile(&self, tile: &mut Tile, cancel: &Cancellation) -> Result<(), TileError>;
}

//! Filesystem tile cache with fallback and write-through persistence.
//!
//! Layout: `{dir}/{zoom}/{x}/{y}.png`.

use std::fs::{self, DirBuilder, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ndarray::Array3;
use tracing::{debug, warn};

use crate::error::TileError;
use crate::grid::TileGrid;
use crate::proj::Projection;
use crate::source::{Cancellation, TileSource};
use crate::tile::codec::{decode_png, encode_png};
use crate::tile::{Tile, TileCoord};

/// Distinguishes temporary files of concurrent writers in one process.
static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct FileTileSource {
    dir: PathBuf,
    grid: TileGrid,
    projection: Arc<dyn Projection>,
    fallback: Option<Arc<dyn TileSource>>,
}

impl FileTileSource {
    /// Cache in front of `fallback`; grid and projection are the fallback's.
    pub fn with_fallback(dir: impl Into<PathBuf>, fallback: Arc<dyn TileSource>) -> Self {
        Self {
            dir: dir.into(),
            grid: fallback.grid().clone(),
            projection: fallback.projection(),
            fallback: Some(fallback),
        }
    }

    /// Read-only cache: misses fail.
    pub fn offline(
        dir: impl Into<PathBuf>,
        grid: TileGrid,
        projection: Arc<dyn Projection>,
    ) -> Self {
        Self {
            dir: dir.into(),
            grid,
            projection,
            fallback: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, coord: TileCoord) -> PathBuf {
        self.dir
            .join(coord.zoom.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.png", coord.y))
    }

    /// Whether the tile is already on disk.
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.path_for(coord).is_file()
    }

    fn load(&self, file: File, tile: &mut Tile) -> Result<(), TileError> {
        let pixels = decode_png(BufReader::new(file))?;
        tile.set_pixels(pixels)
    }

    /// Write through a temporary file so readers never see a partial PNG.
    fn persist(&self, path: &Path, coord: TileCoord, pixels: &Array3<u8>) -> Result<(), TileError> {
        let io_err = |source: io::Error| TileError::Io { coord, source };

        if let Some(parent) = path.parent() {
            create_dirs(parent).map_err(io_err)?;
        }

        let part = path.with_extension(format!(
            "png.{}.{}.part",
            std::process::id(),
            PART_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let written = File::create(&part)
            .map_err(io_err)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                encode_png(&mut writer, pixels)?;
                writer.flush().map_err(io_err)
            })
            .and_then(|()| fs::rename(&part, path).map_err(io_err));

        if written.is_err() {
            let _ = fs::remove_file(&part);
        }
        written
    }
}

#[cfg(unix)]
fn create_dirs(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_dirs(path: &Path) -> io::Result<()> {
    DirBuilder::new().recursive(true).create(path)
}

impl TileSource for FileTileSource {
    fn grid(&self) -> &TileGrid {
        &self.grid
    }

    fn projection(&self) -> Arc<dyn Projection> {
        Arc::clone(&self.projection)
    }

    fn fill_tile(&self, tile: &mut Tile, cancel: &Cancellation) -> Result<(), TileError> {
        let coord = tile.coord();
        let path = self.path_for(coord);

        if path.is_file() {
            debug!(%coord, "tile cache hit");
            let file = File::open(&path).map_err(|source| TileError::Io { coord, source })?;
            return self.load(file, tile);
        }

        if cancel.is_cancelled() {
            return Err(TileError::Cancelled);
        }
        let Some(fallback) = &self.fallback else {
            return Err(TileError::NoFallback(coord));
        };

        debug!(%coord, "tile cache miss");
        fallback.fill_tile(tile, cancel)?;

        // The tile is usable even when the cache write fails.
        if let Some(pixels) = tile.pixels() {
            if let Err(e) = self.persist(&path, coord, pixels) {
                warn!(%coord, path = %path.display(), error = %e, "failed to persist tile");
            }
        }
        Ok(())
    }
}

//! Tile identity and pixel payload.

pub mod codec;

use std::fmt;

use ndarray::Array3;

use crate::error::TileError;

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Tile address in the grid pyramid. Row 0 is the top row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A square tile with an optional RGBA8 buffer of shape `(size, size, 4)`.
#[derive(Clone, Debug)]
pub struct Tile {
    coord: TileCoord,
    size: u32,
    pixels: Option<Array3<u8>>,
}

impl Tile {
    pub fn new(coord: TileCoord, size: u32) -> Self {
        Self {
            coord,
            size,
            pixels: None,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> Option<&Array3<u8>> {
        self.pixels.as_ref()
    }

    pub fn is_filled(&self) -> bool {
        self.pixels.is_some()
    }

    /// Install a pixel buffer, rejecting one that does not match the tile size.
    pub fn set_pixels(&mut self, pixels: Array3<u8>) -> Result<(), TileError> {
        let side = self.size as usize;
        if pixels.dim() != (side, side, 4) {
            return Err(TileError::Shape(format!(
                "tile {} expects {side}x{side}x4, got {:?}",
                self.coord,
                pixels.dim()
            )));
        }
        self.pixels = Some(pixels);
        Ok(())
    }

    pub fn take_pixels(&mut self) -> Option<Array3<u8>> {
        self.pixels.take()
    }
}

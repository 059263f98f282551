//! Inclusive rectangles of tile indices and their iteration.

use crate::tile::TileCoord;

/// Tiles `from_x..=to_x` × `from_y..=to_y` at one zoom level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u32,
    pub from_x: u32,
    pub to_x: u32,
    pub from_y: u32,
    pub to_y: u32,
}

impl TileRange {
    /// Build a range, swapping bounds given in reverse order.
    pub fn new(zoom: u32, x0: u32, x1: u32, y0: u32, y1: u32) -> Self {
        Self {
            zoom,
            from_x: x0.min(x1),
            to_x: x0.max(x1),
            from_y: y0.min(y1),
            to_y: y0.max(y1),
        }
    }

    pub fn width(&self) -> u64 {
        u64::from(self.to_x - self.from_x) + 1
    }

    pub fn height(&self) -> u64 {
        u64::from(self.to_y - self.from_y) + 1
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> u64 {
        self.width() * self.height()
    }

    /// A range always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.zoom == self.zoom
            && (self.from_x..=self.to_x).contains(&coord.x)
            && (self.from_y..=self.to_y).contains(&coord.y)
    }

    /// Visit every tile once, x outer, y inner.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            x: self.from_x,
            y: self.from_y,
            remaining: self.len(),
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Debug)]
pub struct TileRangeIter {
    range: TileRange,
    x: u32,
    y: u32,
    remaining: u64,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        if self.remaining == 0 {
            return None;
        }
        let coord = TileCoord::new(self.range.zoom, self.x, self.y);
        self.remaining -= 1;
        // Advancing past the last tile would overflow at u32::MAX, so stop first.
        if self.remaining > 0 {
            if self.y == self.range.to_y {
                self.y = self.range.from_y;
                self.x += 1;
            } else {
                self.y += 1;
            }
        }
        Some(coord)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

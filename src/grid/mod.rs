//! Tile grid: maps planar coordinates to tile indices per zoom level.
//!
//! The grid covers a planar rectangle with square tiles. Unlike a pure
//! quad-tree, the tile count along x is configured per level, so successive
//! levels need not double. Row 0 is the top row (at `max_y`); the bottom row may
//! extend below `min_y` when the height is not a whole number of tiles.

pub mod range;

use tracing::debug;

use crate::affine::Affine;
use crate::error::GridError;
use crate::proj::{Limits, Point};

pub use range::{TileRange, TileRangeIter};

/// Float slack used when counting whole tiles in an extent.
const COUNT_EPSILON: f64 = 1e-9;

/// Tile positions closer than this to a whole number sit on the tile edge.
const SNAP_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug)]
struct Level {
    xnum: u32,
    ynum: u32,
    side: f64,
    to_value: Affine,
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    limits: Limits,
    min_zoom: u32,
    tile_size: u32,
    levels: Vec<Level>,
}

impl TileGrid {
    /// Grid with an explicit tile count along x for each zoom from `min_zoom` up.
    pub fn with_xnums(
        limits: Limits,
        min_zoom: u32,
        tile_size: u32,
        xnums: &[u32],
    ) -> Result<Self, GridError> {
        validate(&limits, min_zoom, tile_size, xnums.len())?;
        if let Some(pos) = xnums.iter().position(|&n| n == 0) {
            return Err(GridError::InvalidParameter(format!(
                "zero tile count at zoom {}",
                min_zoom as usize + pos
            )));
        }

        let levels: Vec<Level> = xnums.iter().map(|&xnum| Level::new(&limits, xnum)).collect();

        debug!(
            min_zoom,
            max_zoom = min_zoom as usize + levels.len() - 1,
            tile_size,
            "tile grid created"
        );
        Ok(Self {
            limits,
            min_zoom,
            tile_size,
            levels,
        })
    }

    /// Grid from per-level scales in planar units per pixel.
    ///
    /// Each level gets `ceil(width / (scale · tile_size))` tiles along x.
    pub fn with_scales(
        limits: Limits,
        min_zoom: u32,
        tile_size: u32,
        scales: &[f64],
    ) -> Result<Self, GridError> {
        validate(&limits, min_zoom, tile_size, scales.len())?;
        let mut xnums = Vec::with_capacity(scales.len());
        for &scale in scales {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(GridError::InvalidParameter(format!("scale {scale}")));
            }
            let n = (limits.width() / (scale * f64::from(tile_size)) - COUNT_EPSILON).ceil();
            xnums.push(n.clamp(1.0, f64::from(u32::MAX)) as u32);
        }
        Self::with_xnums(limits, min_zoom, tile_size, &xnums)
    }

    /// OSM-style pyramid: `2^zoom` tiles along x at each level.
    pub fn power_of_two(
        limits: Limits,
        min_zoom: u32,
        max_zoom: u32,
        tile_size: u32,
    ) -> Result<Self, GridError> {
        if max_zoom < min_zoom || max_zoom > 30 {
            return Err(GridError::InvalidParameter(format!(
                "zoom range {min_zoom}..={max_zoom}"
            )));
        }
        let xnums: Vec<u32> = (min_zoom..=max_zoom).map(|z| 1 << z).collect();
        Self::with_xnums(limits, min_zoom, tile_size, &xnums)
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Tile edge in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Inclusive `(min, max)` zoom levels.
    pub fn zoom_range(&self) -> (u32, u32) {
        let last = self.levels.len() as u32 - 1;
        (self.min_zoom, self.min_zoom + last)
    }

    fn level(&self, zoom: u32) -> Result<&Level, GridError> {
        let (min, max) = self.zoom_range();
        if zoom < min || zoom > max {
            return Err(GridError::ZoomOutOfRange { zoom, min, max });
        }
        Ok(&self.levels[(zoom - min) as usize])
    }

    /// Tiles along `(x, y)` at `zoom`.
    pub fn tile_count(&self, zoom: u32) -> Result<(u32, u32), GridError> {
        let level = self.level(zoom)?;
        Ok((level.xnum, level.ynum))
    }

    /// Tile edge in planar units.
    pub fn tile_side(&self, zoom: u32) -> Result<f64, GridError> {
        Ok(self.level(zoom)?.side)
    }

    /// Planar units per pixel.
    pub fn scale(&self, zoom: u32) -> Result<f64, GridError> {
        Ok(self.level(zoom)?.side / f64::from(self.tile_size))
    }

    /// Planar position of a (possibly fractional) tile coordinate.
    ///
    /// Integer arguments give the top-left corner of the tile.
    pub fn tile_to_value(&self, zoom: u32, x_tile: f64, y_tile: f64) -> Result<Point, GridError> {
        Ok(self.level(zoom)?.to_value.forward(x_tile, y_tile))
    }

    /// Fractional tile coordinate of a planar position.
    ///
    /// Positions within a millionth of a tile of an edge land exactly on it, so
    /// tile corners map back to their own integer coordinates.
    pub fn value_to_tile(&self, zoom: u32, point: Point) -> Result<(f64, f64), GridError> {
        Ok(self.tile_position(self.level(zoom)?, point))
    }

    fn tile_position(&self, level: &Level, point: Point) -> (f64, f64) {
        let x = (point.x - self.limits.min_x) / level.side;
        let y = (self.limits.max_y - point.y) / level.side;
        (snap(x), snap(y))
    }

    /// Index of the tile holding a planar position. Not clamped to the grid.
    pub fn value_to_tile_index(&self, zoom: u32, point: Point) -> Result<(i64, i64), GridError> {
        let (x, y) = self.value_to_tile(zoom, point)?;
        Ok((x.floor() as i64, y.floor() as i64))
    }

    /// Tiles overlapping the planar rectangle, clamped to the grid.
    ///
    /// The rectangle's right and bottom edges are exclusive: a tile that only
    /// touches them is left out. A zero-size rectangle still selects the tile
    /// holding it. `None` when the rectangle lies entirely outside the grid.
    pub fn view(
        &self,
        zoom: u32,
        from_x: f64,
        to_x: f64,
        from_y: f64,
        to_y: f64,
    ) -> Result<Option<TileRange>, GridError> {
        let level = self.level(zoom)?;
        let area = Limits::from_corners(Point::new(from_x, from_y), Point::new(to_x, to_y));
        let (x0, y0) = self.tile_position(level, Point::new(area.min_x, area.max_y));
        let (x1, y1) = self.tile_position(level, Point::new(area.max_x, area.min_y));

        let Some((first_x, last_x)) = span(x0, x1, level.xnum) else {
            return Ok(None);
        };
        let Some((first_y, last_y)) = span(y0, y1, level.ynum) else {
            return Ok(None);
        };
        Ok(Some(TileRange::new(zoom, first_x, last_x, first_y, last_y)))
    }

    /// Covering range at every zoom level, ascending.
    pub fn cover(&self, bounds: &Limits) -> Vec<TileRange> {
        let (min, max) = self.zoom_range();
        (min..=max)
            .filter_map(|zoom| {
                self.view(zoom, bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y)
                    .ok()
                    .flatten()
            })
            .collect()
    }

    /// Zoom level whose scale (units per pixel) is closest to `scale`.
    pub fn adjust_zoom(&self, scale: f64) -> u32 {
        let (min, _) = self.zoom_range();
        let target = scale.abs().max(f64::MIN_POSITIVE).ln();
        let mut best = (min, f64::INFINITY);
        for (i, level) in self.levels.iter().enumerate() {
            let level_scale = level.side / f64::from(self.tile_size);
            let dist = (level_scale.ln() - target).abs();
            if dist < best.1 {
                best = (min + i as u32, dist);
            }
        }
        best.0
    }
}

impl Level {
    fn new(limits: &Limits, xnum: u32) -> Self {
        let side = limits.width() / f64::from(xnum);
        let ynum = (limits.height() / side - COUNT_EPSILON)
            .ceil()
            .clamp(1.0, f64::from(u32::MAX)) as u32;
        Self {
            xnum,
            ynum,
            side,
            to_value: Affine::scale_translate(side, -side, limits.min_x, limits.max_y),
        }
    }
}

fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON { r } else { v }
}

/// Tiles along one axis overlapping `[lo, hi)` in tile units, clamped to `0..n`.
fn span(lo: f64, hi: f64, n: u32) -> Option<(u32, u32)> {
    let first = lo.floor();
    let last = (hi.ceil() - 1.0).max(first);
    if !(last >= 0.0 && first < f64::from(n)) {
        return None;
    }
    let max = f64::from(n - 1);
    Some((first.clamp(0.0, max) as u32, last.clamp(0.0, max) as u32))
}

fn validate(
    limits: &Limits,
    min_zoom: u32,
    tile_size: u32,
    levels: usize,
) -> Result<(), GridError> {
    let finite = [limits.min_x, limits.max_x, limits.min_y, limits.max_y]
        .iter()
        .all(|v| v.is_finite());
    if !finite || limits.width() <= 0.0 || limits.height() <= 0.0 {
        return Err(GridError::Extent(format!("{limits:?}")));
    }
    if tile_size == 0 {
        return Err(GridError::InvalidParameter("tile size must be > 0".into()));
    }
    if levels == 0 {
        return Err(GridError::InvalidParameter("no zoom levels".into()));
    }
    let top = u32::try_from(levels - 1)
        .ok()
        .and_then(|n| min_zoom.checked_add(n));
    if top.is_none() {
        return Err(GridError::InvalidParameter(format!(
            "{levels} zoom levels from {min_zoom} exceed the zoom range"
        )));
    }
    Ok(())
}

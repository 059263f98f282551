pub mod common;
pub mod ellipsoid;
pub mod mercator;

use std::hash::{Hash, Hasher};

pub use mercator::{Mercator, PseudoMercator};

/// Geodetic coordinate in degrees.
///
/// Ranges are not enforced: callers keep `|lat| < 90` and `|lon| <= 180`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Planar coordinate in projection units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned planar rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Limits {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Limits {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Smallest rectangle holding both points, whatever their order.
    pub fn from_corners(p0: Point, p1: Point) -> Self {
        Self {
            min_x: p0.x.min(p1.x),
            max_x: p0.x.max(p1.x),
            min_y: p0.y.min(p1.y),
            max_y: p0.y.max(p1.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects(&self, other: &Limits) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Trait for map projections converting between geodetic and planar coordinates.
///
/// Latitudes of exactly ±90° are singular for every Mercator variant; rejecting
/// them is the caller's job.
pub trait Projection: Send + Sync {
    /// Forward: geodetic degrees -> planar.
    fn geo_to_value(&self, coord: GeoPoint) -> Point;

    /// Inverse: planar -> geodetic degrees.
    fn value_to_geo(&self, point: Point) -> GeoPoint;

    /// Planar extent of the projection.
    fn limits(&self) -> Limits;

    /// Ground metres covered by one planar unit at `coord`.
    fn scale(&self, coord: GeoPoint) -> f64;

    /// Equality surrogate: projections with equal hashes map points identically.
    fn hash(&self) -> u64;

    /// Batch forward transform.
    fn geo_to_value_batch(&self, coords: &[GeoPoint]) -> Vec<Point> {
        coords.iter().map(|&c| self.geo_to_value(c)).collect()
    }

    /// Batch inverse transform.
    fn value_to_geo_batch(&self, points: &[Point]) -> Vec<GeoPoint> {
        points.iter().map(|&p| self.value_to_geo(p)).collect()
    }
}

/// Deterministic hash over a projection name and its parameters.
///
/// Floats are hashed by bit pattern, so `0.0` and `-0.0` differ.
pub(crate) fn hash_params(name: &str, params: &[f64]) -> u64 {
    // DefaultHasher::new() uses fixed keys, so values are stable across runs.
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    name.hash(&mut hasher);
    for p in params {
        p.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

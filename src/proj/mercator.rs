//! Mercator projections: ellipsoidal, and pseudo (spherical, unit square).
//!
//! Ellipsoidal Mercator:
//!   forward: x = a·λ, y = -a·ln(tsfn(φ, e))
//!   inverse: λ = x/a, φ = phi_from_ts(exp(-y/a), e)
//!
//! Pseudo-Mercator (Web Mercator normalised to [0,1]×[0,1], north up):
//!   forward: x = (lon + 180)/360, y = (1 + ln(tan φ + sec φ)/π)/2
//!   inverse: lon = 360·x - 180, φ = atan(sinh(π·(2y - 1)))

use std::f64::consts::PI;

use crate::proj::common::{phi_from_ts, tsfn};
use crate::proj::ellipsoid::{Ellipsoid, WGS84};
use crate::proj::{hash_params, GeoPoint, Limits, Point, Projection};

/// Latitude at which WGS84 ellipsoidal Mercator has a square extent.
pub const MERCATOR_MAX_LAT: f64 = 85.084_059_050_110_41;

/// Latitude at which spherical Mercator has a square extent: atan(sinh(π)).
pub const PSEUDO_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Ellipsoidal Mercator with the standard parallel on the equator.
#[derive(Clone, Debug)]
pub struct Mercator {
    ellipsoid: Ellipsoid,
    e: f64,
    limits: Limits,
    hash: u64,
}

impl Mercator {
    /// Projection over `ellipsoid`, bounded to `min_lat..=max_lat` degrees.
    pub fn new(ellipsoid: Ellipsoid, min_lat: f64, max_lat: f64) -> Self {
        let e = ellipsoid.eccentricity();
        let x_lim = ellipsoid.a * PI;
        let mut proj = Self {
            ellipsoid,
            e,
            limits: Limits::default(),
            hash: hash_params("mercator", &[ellipsoid.a, ellipsoid.f, min_lat, max_lat]),
        };
        let bottom = proj.geo_to_value(GeoPoint::new(min_lat, 0.0));
        let top = proj.geo_to_value(GeoPoint::new(max_lat, 0.0));
        proj.limits = Limits::new(-x_lim, x_lim, bottom.y, top.y);
        proj
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

impl Default for Mercator {
    /// WGS84 with a square planar extent.
    fn default() -> Self {
        Self::new(WGS84, -MERCATOR_MAX_LAT, MERCATOR_MAX_LAT)
    }
}

impl Projection for Mercator {
    fn geo_to_value(&self, coord: GeoPoint) -> Point {
        debug_assert!(coord.lat.abs() < 90.0, "latitude {} is singular", coord.lat);
        let a = self.ellipsoid.a;
        // Positive latitudes give tsfn < 1, so -ln(tsfn) > 0 and y > 0.
        let x = a * coord.lon.to_radians();
        let y = -a * tsfn(coord.lat.to_radians(), self.e).ln();
        Point::new(x, y)
    }

    fn value_to_geo(&self, point: Point) -> GeoPoint {
        let a = self.ellipsoid.a;
        let lon = (point.x / a).to_degrees();
        let lat = phi_from_ts((-point.y / a).exp(), self.e).to_degrees();
        GeoPoint::new(lat, lon)
    }

    fn limits(&self) -> Limits {
        self.limits
    }

    fn scale(&self, coord: GeoPoint) -> f64 {
        let phi = coord.lat.to_radians();
        let sinphi = phi.sin();
        phi.cos() / (1.0 - self.ellipsoid.e2 * sinphi * sinphi).sqrt()
    }

    fn hash(&self) -> u64 {
        self.hash
    }
}

/// Spherical Mercator over the unit square, as used by OSM-style tile servers.
#[derive(Clone, Debug)]
pub struct PseudoMercator {
    equator_length: f64,
}

impl PseudoMercator {
    pub fn new() -> Self {
        Self {
            equator_length: WGS84.equator_length(),
        }
    }
}

impl Default for PseudoMercator {
    fn default() -> Self {
        Self::new()
    }
}

impl Projection for PseudoMercator {
    fn geo_to_value(&self, coord: GeoPoint) -> Point {
        debug_assert!(coord.lat.abs() < 90.0, "latitude {} is singular", coord.lat);
        let phi = coord.lat.to_radians();
        let x = (coord.lon + 180.0) / 360.0;
        let y = 1.0 - (1.0 - (phi.tan() + 1.0 / phi.cos()).ln() / PI) / 2.0;
        Point::new(x, y)
    }

    fn value_to_geo(&self, point: Point) -> GeoPoint {
        let lon = point.x * 360.0 - 180.0;
        let lat = (PI * (2.0 * point.y - 1.0)).sinh().atan().to_degrees();
        GeoPoint::new(lat, lon)
    }

    fn limits(&self) -> Limits {
        Limits::new(0.0, 1.0, 0.0, 1.0)
    }

    fn scale(&self, coord: GeoPoint) -> f64 {
        self.equator_length * coord.lat.to_radians().cos()
    }

    fn hash(&self) -> u64 {
        hash_params("pseudo-mercator", &[self.equator_length])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::KRASSOVSKY;
    use approx::assert_relative_eq;

    #[test]
    fn test_mercator_origin() {
        let proj = Mercator::default();
        let p = proj.geo_to_value(GeoPoint::new(0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mercator_roundtrip() {
        let proj = Mercator::default();
        let cases = [
            GeoPoint::new(55.75, 37.61),   // Moscow
            GeoPoint::new(52.36, 4.90),    // Amsterdam
            GeoPoint::new(-33.87, 151.21), // Sydney
            GeoPoint::new(84.9, -179.9),
            GeoPoint::new(-84.9, 179.9),
        ];
        for coord in cases {
            let back = proj.value_to_geo(proj.geo_to_value(coord));
            assert_relative_eq!(back.lat, coord.lat, epsilon = 1e-6);
            assert_relative_eq!(back.lon, coord.lon, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mercator_epsg3395_reference() {
        // EPSG:3395 reference: (45°N, 10°E) -> (1113194.908, 5591295.919)
        let proj = Mercator::default();
        let p = proj.geo_to_value(GeoPoint::new(45.0, 10.0));
        assert_relative_eq!(p.x, 1_113_194.908, epsilon = 0.01);
        assert_relative_eq!(p.y, 5_591_295.919, epsilon = 0.01);
    }

    #[test]
    fn test_mercator_default_limits_are_square() {
        let l = Mercator::default().limits();
        assert_relative_eq!(l.max_x, WGS84.a * PI);
        assert_relative_eq!(l.min_x, -l.max_x);
        assert_relative_eq!(l.max_y, l.max_x, epsilon = 1e-3);
        assert_relative_eq!(l.min_y, -l.max_y, epsilon = 1e-6);
    }

    #[test]
    fn test_mercator_limits_follow_latitude_bounds() {
        let proj = Mercator::new(WGS84, -10.0, 60.0);
        let l = proj.limits();
        assert_relative_eq!(l.min_y, proj.geo_to_value(GeoPoint::new(-10.0, 0.0)).y);
        assert_relative_eq!(l.max_y, proj.geo_to_value(GeoPoint::new(60.0, 0.0)).y);
    }

    #[test]
    fn test_mercator_scale() {
        let proj = Mercator::default();
        assert_relative_eq!(proj.scale(GeoPoint::new(0.0, 0.0)), 1.0);
        let s60 = proj.scale(GeoPoint::new(60.0, 0.0));
        // Slightly above the spherical cos(60°) = 0.5.
        assert!(s60 > 0.5 && s60 < 0.502, "got {s60}");
    }

    #[test]
    fn test_mercator_hash() {
        let a = Mercator::default();
        let b = Mercator::new(WGS84, -MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        assert_eq!(a.hash(), b.hash());
        let krassovsky = Mercator::new(KRASSOVSKY, -MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        assert_ne!(a.hash(), krassovsky.hash());
        assert_ne!(a.hash(), Mercator::new(WGS84, -80.0, MERCATOR_MAX_LAT).hash());
        assert_ne!(a.hash(), PseudoMercator::new().hash());
    }

    #[test]
    fn test_pseudo_mercator_unit_square() {
        let proj = PseudoMercator::new();
        let centre = proj.geo_to_value(GeoPoint::new(0.0, 0.0));
        assert_relative_eq!(centre.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(centre.y, 0.5, epsilon = 1e-12);

        let ne = proj.geo_to_value(GeoPoint::new(PSEUDO_MERCATOR_MAX_LAT, 180.0));
        assert_relative_eq!(ne.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ne.y, 1.0, epsilon = 1e-9);

        let sw = proj.geo_to_value(GeoPoint::new(-PSEUDO_MERCATOR_MAX_LAT, -180.0));
        assert_relative_eq!(sw.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(sw.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pseudo_mercator_roundtrip() {
        let proj = PseudoMercator::new();
        for &(lat, lon) in &[(0.0, 0.0), (45.0, 10.0), (40.7484, -73.9857), (-84.0, 179.0)] {
            let coord = GeoPoint::new(lat, lon);
            let back = proj.value_to_geo(proj.geo_to_value(coord));
            assert_relative_eq!(back.lat, lat, epsilon = 1e-9);
            assert_relative_eq!(back.lon, lon, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pseudo_mercator_scale() {
        let proj = PseudoMercator::new();
        assert_relative_eq!(
            proj.scale(GeoPoint::new(0.0, 0.0)),
            40_075_016.685_578_49,
            epsilon = 1e-3
        );
        assert_relative_eq!(
            proj.scale(GeoPoint::new(60.0, 0.0)),
            20_037_508.342_789_24,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_batch_matches_single() {
        let proj = Mercator::default();
        let coords = [GeoPoint::new(10.0, 20.0), GeoPoint::new(-30.0, 40.0)];
        let points = proj.geo_to_value_batch(&coords);
        assert_eq!(points[1], proj.geo_to_value(coords[1]));
        let back = proj.value_to_geo_batch(&points);
        assert_relative_eq!(back[0].lat, 10.0, epsilon = 1e-6);
    }
}

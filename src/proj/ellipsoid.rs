/// Reference ellipsoid parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (metres)
    pub a: f64,
    /// Flattening (dimensionless)
    pub f: f64,
    /// Semi-minor axis: a * (1 - f)
    pub b: f64,
    /// First eccentricity squared: 2f - f^2
    pub e2: f64,
    /// Second eccentricity squared: e^2 / (1 - e^2)
    pub ep2: f64,
}

impl Ellipsoid {
    pub const fn new(a: f64, f: f64) -> Self {
        let b = a * (1.0 - f);
        let e2 = 2.0 * f - f * f;
        let ep2 = e2 / (1.0 - e2);
        Self { a, f, b, e2, ep2 }
    }

    /// A sphere of the given radius.
    pub const fn sphere(radius: f64) -> Self {
        Self::new(radius, 0.0)
    }

    /// First eccentricity. `sqrt` is not const, so this is computed on demand.
    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt()
    }

    /// Length of the equator in metres.
    pub fn equator_length(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.a
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
pub const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101);
/// Krassovsky 1940, the SK-42 datum ellipsoid.
pub const KRASSOVSKY: Ellipsoid = Ellipsoid::new(6_378_245.0, 1.0 / 298.3);

//! Common helpers for conformal-latitude math shared by the Mercator family.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Iteration cap for the inverse conformal latitude.
pub const PHI_MAX_ITER: usize = 15;
/// Convergence threshold (radians) for the inverse conformal latitude.
pub const PHI_TOLERANCE: f64 = 1e-8;

/// Isometric latitude helper:
/// `tsfn(φ, e) = tan(π/4 - φ/2) / ((1 - e·sinφ)/(1 + e·sinφ))^(e/2)`.
pub fn tsfn(phi: f64, e: f64) -> f64 {
    let sinphi = phi.sin();
    (FRAC_PI_4 - 0.5 * phi).tan() / conformal_factor(sinphi, e)
}

/// `((1 - e·sinφ)/(1 + e·sinφ))^(e/2)`.
pub fn conformal_factor(sinphi: f64, e: f64) -> f64 {
    let con = e * sinphi;
    ((1.0 - con) / (1.0 + con)).powf(0.5 * e)
}

/// Invert [`tsfn`]: no closed form on the ellipsoid, so refine by fixed point.
pub fn phi_from_ts(ts: f64, e: f64) -> f64 {
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..PHI_MAX_ITER {
        let next = FRAC_PI_2 - 2.0 * (ts * conformal_factor(phi.sin(), e)).atan();
        let delta = (next - phi).abs();
        phi = next;
        if delta < PHI_TOLERANCE {
            break;
        }
    }
    phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;

    #[test]
    fn test_tsfn_equator_is_one() {
        assert_relative_eq!(tsfn(0.0, WGS84.eccentricity()), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_phi_from_ts_inverts_tsfn() {
        let e = WGS84.eccentricity();
        for deg in [-80.0_f64, -45.0, -1.0, 0.0, 12.5, 55.75, 84.0] {
            let phi = deg.to_radians();
            assert_relative_eq!(phi_from_ts(tsfn(phi, e), e), phi, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sphere_closed_form() {
        // With e = 0 the first guess is already exact.
        let phi = 0.7;
        let ts = (FRAC_PI_4 - 0.5 * phi).tan();
        assert_relative_eq!(phi_from_ts(ts, 0.0), phi, epsilon = 1e-12);
    }
}

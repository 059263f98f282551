//! Segment clipping against a rectangle (Liang–Barsky).
//!
//! Renderers feed planar coordinates that can be far outside the visible
//! area (survey tracks at high zoom); drawing back-ends lose precision or
//! overflow on such values, so segments are cut to the view first.

use crate::proj::{Limits, Point};

/// Visible part of the segment `p0 -> p1` inside `rect`, endpoints inclusive.
///
/// Returns `None` when no part of the segment lies inside. Direction is kept:
/// the first returned point is the one closer to `p0`.
pub fn clip_segment(p0: Point, p1: Point, rect: &Limits) -> Option<(Point, Point)> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    // (p, q) pairs for the left, right, bottom and top edges.
    let edges = [
        (-dx, p0.x - rect.min_x),
        (dx, rect.max_x - p0.x),
        (-dy, p0.y - rect.min_y),
        (dy, rect.max_y - p0.y),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: either fully outside or no constraint.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| Point::new(p0.x + t * dx, p0.y + t * dy);
    Some((at(t0), at(t1)))
}

/// Clip a polyline, returning the visible runs as separate polylines.
pub fn clip_polyline(points: &[Point], rect: &Limits) -> Vec<Vec<Point>> {
    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], rect) {
            Some((a, b)) => {
                if current.last() != Some(&a) {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
            }
            None => {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

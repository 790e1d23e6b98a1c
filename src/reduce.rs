//! Polygon/polyline simplification by iterative triangle-area pruning.
//!
//! A point is dropped when the triangle formed with its two neighbors has
//! area at or below the tolerance; repeated passes catch points that only
//! become removable once their neighbors are gone. Tolerance is expressed
//! in pixel units: a magnification factor scales points up before pruning
//! and back down after, so callers in other coordinate scales get the
//! same behavior.

use crate::geom::Pt;

/// Simplifies `points`, returning a strictly-shorter-or-equal list.
///
/// `closed` treats the list as a polygon (wrap-around neighbors, at least
/// 3 points survive); open polylines keep both endpoints and at least 2
/// points. Pass `mag = 1.0` when points are already in pixel units.
pub fn reduce_points(
    points: &[Pt],
    tolerance: f64,
    iterations: usize,
    closed: bool,
    mag: f64,
) -> Vec<Pt> {
    let min_keep = if closed { 3 } else { 2 };
    if points.len() <= min_keep {
        return points.to_vec();
    }

    let mut pts: Vec<Pt> = if mag != 1.0 {
        points.iter().map(|p| Pt::new(p.x * mag, p.y * mag)).collect()
    } else {
        points.to_vec()
    };

    for _ in 0..iterations {
        let before = pts.len();
        pts = prune_pass(&pts, tolerance, closed, min_keep);
        if pts.len() == before {
            break;
        }
    }

    if mag != 1.0 {
        for p in &mut pts {
            p.x /= mag;
            p.y /= mag;
        }
    }
    pts
}

fn prune_pass(pts: &[Pt], tolerance: f64, closed: bool, min_keep: usize) -> Vec<Pt> {
    let n = pts.len();
    let mut kept: Vec<Pt> = Vec::with_capacity(n);
    let mut removed = 0usize;

    let (start, end) = if closed { (0, n) } else { (1, n - 1) };
    if !closed {
        kept.push(pts[0]);
    }

    for i in start..end {
        if n - removed <= min_keep {
            kept.extend_from_slice(&pts[i..end]);
            break;
        }
        // Neighbors: the last survivor on one side, the untouched next
        // point on the other (wrapping for polygons).
        let prev = match kept.last() {
            Some(&p) => p,
            None => pts[n - 1],
        };
        let next = pts[(i + 1) % n];
        if triangle_area(prev, pts[i], next) <= tolerance {
            removed += 1;
        } else {
            kept.push(pts[i]);
        }
    }

    if !closed {
        kept.push(pts[n - 1]);
    }

    // Collapsing below a polygon is never useful.
    if kept.len() < min_keep { pts.to_vec() } else { kept }
}

#[inline]
fn triangle_area(a: Pt, b: Pt, c: Pt) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::geom;

    #[test]
    fn collinear_midpoints_are_dropped() {
        // Square with a redundant midpoint on each edge.
        let pts = vec![
            Pt::new(0.0, 0.0),
            Pt::new(5.0, 0.0),
            Pt::new(10.0, 0.0),
            Pt::new(10.0, 5.0),
            Pt::new(10.0, 10.0),
            Pt::new(5.0, 10.0),
            Pt::new(0.0, 10.0),
            Pt::new(0.0, 5.0),
        ];
        let out = reduce_points(&pts, 0.5, 5, true, 1.0);
        assert_eq!(out.len(), 4);
        assert_relative_eq!(geom::area(&out), 100.0);
    }

    #[test]
    fn corners_survive() {
        let pts = vec![
            Pt::new(0.0, 0.0),
            Pt::new(10.0, 0.0),
            Pt::new(10.0, 10.0),
            Pt::new(0.0, 10.0),
        ];
        let out = reduce_points(&pts, 0.5, 5, true, 1.0);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn open_polyline_keeps_endpoints() {
        let pts = vec![
            Pt::new(0.0, 0.0),
            Pt::new(1.0, 0.01),
            Pt::new(2.0, 0.0),
            Pt::new(3.0, 5.0),
        ];
        let out = reduce_points(&pts, 0.5, 3, false, 1.0);
        assert_eq!(out.first(), Some(&pts[0]));
        assert_eq!(out.last(), Some(&pts[3]));
        assert!(out.len() < pts.len());
    }

    #[test]
    fn magnification_keeps_tolerance_in_pixel_units() {
        // Points in microns at mag 10 px/micron should reduce the same
        // way as the pre-scaled pixel version.
        let microns = vec![
            Pt::new(0.0, 0.0),
            Pt::new(0.5, 0.001),
            Pt::new(1.0, 0.0),
            Pt::new(1.0, 1.0),
            Pt::new(0.0, 1.0),
        ];
        let out = reduce_points(&microns, 0.5, 5, true, 10.0);
        assert_eq!(out.len(), 4, "near-collinear micron point pruned");
        // Output returned in the caller's units.
        assert!(out.iter().all(|p| p.x <= 1.0 && p.y <= 1.0));
    }

    #[test]
    fn never_collapses_below_a_triangle() {
        let tiny = vec![Pt::new(0.0, 0.0), Pt::new(1.0, 0.0), Pt::new(0.5, 0.1)];
        let out = reduce_points(&tiny, 100.0, 10, true, 1.0);
        assert_eq!(out.len(), 3);
    }
}

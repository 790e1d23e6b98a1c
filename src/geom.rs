use serde::{Deserialize, Serialize};

/// A 2D point in whatever space the caller is working in (field-space
/// microns or local pixel space). The engine never cares which.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pt {
    pub x: f64,
    pub y: f64,
}

impl Pt {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dist(&self, other: &Pt) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Signed shoelace area. Positive for counter-clockwise winding.
///
/// Fewer than 3 points is degenerate and reports 0 (no exception).
pub fn signed_area(points: &[Pt]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Unsigned polygon area. All areas reported by this crate are unsigned.
pub fn area(points: &[Pt]) -> f64 {
    signed_area(points).abs()
}

/// Area-weighted polygon centroid.
///
/// Falls back to the arithmetic vertex mean when the enclosed area is
/// numerically zero (collinear or degenerate traces).
pub fn centroid(points: &[Pt]) -> Option<Pt> {
    if points.is_empty() {
        return None;
    }

    let a = signed_area(points);
    if a.abs() > f64::EPSILON && points.len() >= 3 {
        let n = points.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let cross = points[i].x * points[j].y - points[j].x * points[i].y;
            cx += (points[i].x + points[j].x) * cross;
            cy += (points[i].y + points[j].y) * cross;
        }
        let k = 1.0 / (6.0 * a);
        return Some(Pt::new(cx * k, cy * k));
    }

    let n = points.len() as f64;
    let sx: f64 = points.iter().map(|p| p.x).sum();
    let sy: f64 = points.iter().map(|p| p.y).sum();
    Some(Pt::new(sx / n, sy / n))
}

/// Point-in-polygon by ray casting. A point on the boundary counts as
/// inside; cut-line resolution depends on that tie rule.
pub fn point_in_polygon(p: Pt, polygon: &[Pt]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    // Boundary check first: on-segment ties are "inside".
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if on_segment(p, a, b) {
            return true;
        }
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(p: Pt, a: Pt, b: Pt) -> bool {
    const EPS: f64 = 1e-9;
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EPS * (1.0 + a.dist(&b)) {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len2 = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    dot >= -EPS && dot <= len2 + EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Pt> {
        vec![
            Pt::new(0.0, 0.0),
            Pt::new(1.0, 0.0),
            Pt::new(1.0, 1.0),
            Pt::new(0.0, 1.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert_relative_eq!(signed_area(&unit_square()), 1.0);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut sq = unit_square();
        sq.reverse();
        assert_relative_eq!(signed_area(&sq), -1.0);
        assert_relative_eq!(area(&sq), 1.0);
    }

    #[test]
    fn area_degenerate_is_zero() {
        assert_eq!(area(&[]), 0.0);
        assert_eq!(area(&[Pt::new(1.0, 2.0)]), 0.0);
        assert_eq!(area(&[Pt::new(1.0, 2.0), Pt::new(3.0, 4.0)]), 0.0);
    }

    #[test]
    fn centroid_of_square() {
        let c = centroid(&unit_square()).unwrap();
        assert_relative_eq!(c.x, 0.5);
        assert_relative_eq!(c.y, 0.5);
    }

    #[test]
    fn centroid_collinear_falls_back_to_vertex_mean() {
        let pts = vec![Pt::new(0.0, 0.0), Pt::new(1.0, 1.0), Pt::new(2.0, 2.0)];
        let c = centroid(&pts).unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
    }

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn point_in_polygon_basic() {
        let sq = unit_square();
        assert!(point_in_polygon(Pt::new(0.5, 0.5), &sq));
        assert!(!point_in_polygon(Pt::new(1.5, 0.5), &sq));
        assert!(!point_in_polygon(Pt::new(-0.1, 0.5), &sq));
    }

    #[test]
    fn point_on_boundary_counts_as_inside() {
        let sq = unit_square();
        assert!(point_in_polygon(Pt::new(1.0, 0.5), &sq));
        assert!(point_in_polygon(Pt::new(0.0, 0.0), &sq));
        assert!(point_in_polygon(Pt::new(0.5, 1.0), &sq));
    }
}

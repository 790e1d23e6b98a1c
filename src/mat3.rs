use crate::geom::Pt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    // Row-major 3x3 matrix.
    m: [[f64; 3]; 3],
}

impl Mat3 {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Constructs a homogeneous 3x3 matrix from a 2D affine transform.
    ///
    /// The expected 6-element layout is `[a, b, c, d, e, f]` such that:
    ///
    /// - `x' = a*x + c*y + e`
    /// - `y' = b*x + d*y + f`
    pub fn from_affine2(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            m: [[a, c, e], [b, d, f], [0.0, 0.0, 1.0]],
        }
    }

    /// Applies this transform to a 2D point (implicitly using homogeneous `w=1`).
    #[inline]
    pub fn transform_point2(&self, x: f64, y: f64) -> (f64, f64) {
        let x2 = self.m[0][0] * x + self.m[0][1] * y + self.m[0][2];
        let y2 = self.m[1][0] * x + self.m[1][1] * y + self.m[1][2];
        (x2, y2)
    }

    #[inline]
    pub fn apply(&self, p: Pt) -> Pt {
        let (x, y) = self.transform_point2(p.x, p.y);
        Pt::new(x, y)
    }

    /// Inverse of the affine transform, or `None` when the linear part is
    /// singular.
    pub fn inverse(&self) -> Option<Self> {
        let a = self.m[0][0];
        let c = self.m[0][1];
        let e = self.m[0][2];
        let b = self.m[1][0];
        let d = self.m[1][1];
        let f = self.m[1][2];

        let det = a * d - b * c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        // Inverse of [a c; b d], then the inverted translation.
        let ia = d * inv_det;
        let ic = -c * inv_det;
        let ib = -b * inv_det;
        let id = a * inv_det;
        let ie = -(ia * e + ic * f);
        let if_ = -(ib * e + id * f);

        Some(Self {
            m: [[ia, ic, ie], [ib, id, if_], [0.0, 0.0, 1.0]],
        })
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

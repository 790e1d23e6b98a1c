use serde::{Deserialize, Serialize};

/// Triangle mesh output: world-space vertices, index triples, and the
/// metadata a viewer needs (color/alpha for display, enclosed volume for
/// back-to-front ordering of translucent objects).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[u32; 3]>,
    /// RGB on a 0-1 scale.
    pub color: [f64; 3],
    pub alpha: f64,
    /// Unsigned enclosed volume (signed tetrahedron sum). Approximate for
    /// open meshes such as slabs.
    pub volume: f64,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<[f64; 3]>, faces: Vec<[u32; 3]>) -> Self {
        let volume = enclosed_volume(&vertices, &faces);
        Self {
            name: name.into(),
            vertices,
            faces,
            color: [1.0, 1.0, 1.0],
            alpha: 1.0,
            volume,
        }
    }

    pub fn with_color(mut self, rgb: [u8; 3]) -> Self {
        self.color = [
            rgb[0] as f64 / 255.0,
            rgb[1] as f64 / 255.0,
            rgb[2] as f64 / 255.0,
        ];
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Appends another mesh's geometry (indices re-based) and refreshes
    /// the volume metadata.
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| [f[0] + base, f[1] + base, f[2] + base]));
        self.volume = enclosed_volume(&self.vertices, &self.faces);
    }

    /// Axis-aligned bounding box as (min, max) corners, or `None` for an
    /// empty mesh.
    pub fn bounding_box(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = *self.vertices.first()?;
        let mut lo = first;
        let mut hi = first;
        for v in &self.vertices {
            for k in 0..3 {
                lo[k] = lo[k].min(v[k]);
                hi[k] = hi[k].max(v[k]);
            }
        }
        Some((lo, hi))
    }
}

/// Unsigned enclosed volume via the signed tetrahedron sum over the
/// triangle list.
pub fn enclosed_volume(vertices: &[[f64; 3]], faces: &[[u32; 3]]) -> f64 {
    let mut six_v = 0.0;
    for f in faces {
        let a = vertices[f[0] as usize];
        let b = vertices[f[1] as usize];
        let c = vertices[f[2] as usize];
        // a . (b x c)
        six_v += a[0] * (b[1] * c[2] - b[2] * c[1])
            + a[1] * (b[2] * c[0] - b[0] * c[2])
            + a[2] * (b[0] * c[1] - b[1] * c[0]);
    }
    (six_v / 6.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit cube as 12 triangles, outward-wound.
    pub(crate) fn unit_cube() -> (Vec<[f64; 3]>, Vec<[u32; 3]>) {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
        ];
        (vertices, faces)
    }

    #[test]
    fn cube_volume_is_one() {
        let (v, f) = unit_cube();
        assert_relative_eq!(enclosed_volume(&v, &f), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn winding_flip_does_not_change_reported_volume() {
        let (v, mut f) = unit_cube();
        for face in &mut f {
            face.swap(1, 2);
        }
        assert_relative_eq!(enclosed_volume(&v, &f), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn append_rebases_indices() {
        let (v, f) = unit_cube();
        let mut a = Mesh::new("a", v.clone(), f.clone());
        let mut b = Mesh::new("b", v, f);
        for vert in &mut b.vertices {
            vert[0] += 5.0;
        }
        a.append(&b);
        assert_eq!(a.vertices.len(), 16);
        assert_eq!(a.faces.len(), 24);
        assert!(a.faces.iter().all(|f| f.iter().all(|&i| (i as usize) < 16)));
        assert_relative_eq!(a.volume, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn color_is_rescaled_to_unit_range() {
        let (v, f) = unit_cube();
        let m = Mesh::new("c", v, f).with_color([255, 0, 51]).with_alpha(0.5);
        assert_relative_eq!(m.color[0], 1.0);
        assert_relative_eq!(m.color[2], 0.2);
        assert_relative_eq!(m.alpha, 0.5);
    }
}

//! 3D object aggregation: traces sharing a name are collected across
//! sections and turned into a single mesh.
//!
//! Three representations cover the domain's needs. `Surface` is the full
//! reconstruction (voxel stacking, marching cubes, smoothing, world
//! rescale). `Spheres` and `Slabs` are the cheap alternatives: one
//! centroid/max-radius sphere per trace, or ruled quads along open
//! polylines. All three share the same `add_trace` / `generate` pair so a
//! generation loop has one call site per object.

use std::collections::BTreeMap;

use crate::color::ColorAssigner;
use crate::error::{Result, SectraceError};
use crate::geom::{self, Pt};
use crate::mat3::Mat3;
use crate::mc;
use crate::mesh::Mesh;
use crate::smooth::{self, Smoothing};
use crate::trace::Trace;
use crate::volume::VoxelVolume;

/// Running 3D bounding box. Starts empty and grows only through explicit
/// add calls; parallel fills can keep one per worker and merge with
/// `union` afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl Default for Extremes {
    fn default() -> Self {
        Self::new()
    }
}

impl Extremes {
    pub fn new() -> Self {
        Self {
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
            zmin: f64::INFINITY,
            zmax: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.xmin > self.xmax
    }

    pub fn add_point(&mut self, x: f64, y: f64, z: f64) {
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
        self.zmin = self.zmin.min(z);
        self.zmax = self.zmax.max(z);
    }

    pub fn union(&mut self, other: &Extremes) {
        if other.is_empty() {
            return;
        }
        self.add_point(other.xmin, other.ymin, other.zmin);
        self.add_point(other.xmax, other.ymax, other.zmax);
    }
}

/// Per-section context a caller supplies alongside each trace: the
/// section's index and thickness, its image magnification (pixels per
/// world unit), and the image-to-world transform.
#[derive(Debug, Clone, Copy)]
pub struct SectionInfo {
    pub index: i64,
    pub thickness: f64,
    pub mag: f64,
    pub tform: Mat3,
}

impl SectionInfo {
    pub fn new(index: i64, thickness: f64, mag: f64) -> Self {
        Self {
            index,
            thickness,
            mag,
            tform: Mat3::identity(),
        }
    }

    pub fn with_tform(mut self, tform: Mat3) -> Self {
        self.tform = tform;
        self
    }

    /// Maps world points back into this section's image space — the
    /// direction edited point lists travel when written back onto a
    /// section.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the section transform is singular.
    pub fn to_image(&self, points: &[Pt]) -> Result<Vec<Pt>> {
        let inv = self.tform.inverse().ok_or_else(|| {
            SectraceError::InvalidInput(format!(
                "section {} transform is singular",
                self.index
            ))
        })?;
        Ok(points.iter().map(|&p| inv.apply(p)).collect())
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub smoothing: Smoothing,
    pub iterations: usize,
    /// Voxels per world unit for surface reconstruction. `None` uses the
    /// average magnification of the contributing sections.
    pub resolution: Option<f64>,
    pub alpha: f64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::default(),
            iterations: 5,
            resolution: None,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Default)]
struct SectionSlice {
    positives: Vec<Vec<Pt>>,
    negatives: Vec<Vec<Pt>>,
}

#[derive(Debug)]
struct SurfaceData {
    sections: BTreeMap<i64, SectionSlice>,
    extremes: Extremes,
    thickness: f64,
    mag_sum: f64,
    mag_count: usize,
}

impl SurfaceData {
    fn new() -> Self {
        Self {
            sections: BTreeMap::new(),
            extremes: Extremes::new(),
            thickness: 0.0,
            mag_sum: 0.0,
            mag_count: 0,
        }
    }
}

#[derive(Debug)]
struct Sphere {
    center: [f64; 3],
    radius: f64,
}

#[derive(Debug)]
struct Slab {
    points: Vec<Pt>,
    closed: bool,
    z: f64,
    dz: f64,
}

#[derive(Debug)]
enum Representation {
    Surface(SurfaceData),
    Spheres(Vec<Sphere>),
    Slabs(Vec<Slab>),
}

#[derive(Debug)]
pub struct Object3D {
    pub name: String,
    pub color: [u8; 3],
    repr: Representation,
}

impl Object3D {
    pub fn surface(name: impl Into<String>, colors: &mut ColorAssigner) -> Self {
        Self::with_repr(name, colors, Representation::Surface(SurfaceData::new()))
    }

    pub fn spheres(name: impl Into<String>, colors: &mut ColorAssigner) -> Self {
        Self::with_repr(name, colors, Representation::Spheres(Vec::new()))
    }

    pub fn slabs(name: impl Into<String>, colors: &mut ColorAssigner) -> Self {
        Self::with_repr(name, colors, Representation::Slabs(Vec::new()))
    }

    fn with_repr(name: impl Into<String>, colors: &mut ColorAssigner, repr: Representation) -> Self {
        let name = name.into();
        let color = colors.color_for(&name);
        Self { name, color, repr }
    }

    /// Overrides the assigned color (e.g. with a trace's authored color).
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Accumulates one trace from one section into this object.
    ///
    /// Points pass through the section's image-to-world transform here;
    /// everything stored downstream is in world units.
    pub fn add_trace(&mut self, trace: &Trace, section: &SectionInfo) -> Result<()> {
        if trace.points.is_empty() {
            return Err(SectraceError::InvalidInput(format!(
                "trace for {} has no points",
                self.name
            )));
        }
        let world: Vec<Pt> = trace.points.iter().map(|&p| section.tform.apply(p)).collect();
        let z_mid = (section.index as f64 + 0.5) * section.thickness;

        match &mut self.repr {
            Representation::Surface(data) => {
                if !trace.closed || world.len() < 3 {
                    return Err(SectraceError::InvalidInput(format!(
                        "surface object {} needs closed traces with at least 3 points",
                        self.name
                    )));
                }
                if data.sections.is_empty() {
                    data.thickness = section.thickness;
                }
                data.mag_sum += section.mag;
                data.mag_count += 1;
                for p in &world {
                    data.extremes.add_point(p.x, p.y, z_mid);
                }
                let slice = data.sections.entry(section.index).or_default();
                if trace.negative {
                    slice.negatives.push(world);
                } else {
                    slice.positives.push(world);
                }
            }
            Representation::Spheres(spheres) => {
                let center = match geom::centroid(&world) {
                    Some(c) => c,
                    None => {
                        return Err(SectraceError::InvalidInput(format!(
                            "trace for {} has no centroid",
                            self.name
                        )));
                    }
                };
                let radius = world
                    .iter()
                    .map(|p| center.dist(p))
                    .fold(0.0f64, f64::max);
                spheres.push(Sphere {
                    center: [center.x, center.y, z_mid],
                    radius,
                });
            }
            Representation::Slabs(slabs) => {
                slabs.push(Slab {
                    points: world,
                    closed: trace.closed,
                    z: section.index as f64 * section.thickness,
                    dz: section.thickness / 2.0,
                });
            }
        }
        Ok(())
    }

    /// Builds the final mesh from every trace added so far.
    pub fn generate(&self, opts: &GenerateOptions) -> Result<Mesh> {
        let mesh = match &self.repr {
            Representation::Surface(data) => self.generate_surface(data, opts)?,
            Representation::Spheres(spheres) => self.generate_spheres(spheres)?,
            Representation::Slabs(slabs) => self.generate_slabs(slabs)?,
        };
        Ok(mesh.with_color(self.color).with_alpha(opts.alpha))
    }

    fn generate_surface(&self, data: &SurfaceData, opts: &GenerateOptions) -> Result<Mesh> {
        if data.sections.is_empty() {
            return Err(SectraceError::InvalidInput(format!(
                "no traces added to {}",
                self.name
            )));
        }
        let resolution = match opts.resolution {
            Some(r) => r,
            None => data.mag_sum / data.mag_count as f64,
        };
        if !(resolution > 0.0) {
            return Err(SectraceError::InvalidInput(format!(
                "resolution {resolution} must be positive"
            )));
        }

        let e = &data.extremes;
        let z_lo = *data.sections.keys().next().unwrap_or(&0);
        let z_hi = *data.sections.keys().next_back().unwrap_or(&0);
        let mut vol = VoxelVolume::new(
            (e.xmin, e.xmax),
            (e.ymin, e.ymax),
            (z_lo, z_hi),
            resolution,
            data.thickness,
        )?;
        for (&index, slice) in &data.sections {
            vol.fill_section(index, &slice.positives, &slice.negatives)?;
        }

        let (mut vertices, faces) = mc::extract(&vol, &self.name)?;
        smooth::smooth(&mut vertices, &faces, opts.smoothing, opts.iterations);

        // Back from voxel-index space to world units.
        for v in &mut vertices {
            *v = [vol.world_x(v[0]), vol.world_y(v[1]), vol.world_z(v[2])];
        }
        Ok(Mesh::new(self.name.as_str(), vertices, faces))
    }

    fn generate_spheres(&self, spheres: &[Sphere]) -> Result<Mesh> {
        if spheres.is_empty() {
            return Err(SectraceError::InvalidInput(format!(
                "no traces added to {}",
                self.name
            )));
        }
        let mut mesh = Mesh::new(self.name.as_str(), Vec::new(), Vec::new());
        for sphere in spheres {
            let (vertices, faces) = uv_sphere(sphere.center, sphere.radius, 12, 24);
            mesh.append(&Mesh::new(self.name.as_str(), vertices, faces));
        }
        Ok(mesh)
    }

    fn generate_slabs(&self, slabs: &[Slab]) -> Result<Mesh> {
        if slabs.is_empty() {
            return Err(SectraceError::InvalidInput(format!(
                "no traces added to {}",
                self.name
            )));
        }
        let mut vertices: Vec<[f64; 3]> = Vec::new();
        let mut faces: Vec<[u32; 3]> = Vec::new();
        for slab in slabs {
            let n = slab.points.len();
            if n < 2 {
                continue;
            }
            let pairs = if slab.closed { n } else { n - 1 };
            for i in 0..pairs {
                let a = slab.points[i];
                let b = slab.points[(i + 1) % n];
                let base = vertices.len() as u32;
                vertices.push([a.x, a.y, slab.z]);
                vertices.push([b.x, b.y, slab.z]);
                vertices.push([b.x, b.y, slab.z + slab.dz]);
                vertices.push([a.x, a.y, slab.z + slab.dz]);
                faces.push([base, base + 1, base + 2]);
                faces.push([base, base + 2, base + 3]);
            }
        }
        if faces.is_empty() {
            return Err(SectraceError::EmptySurface(self.name.clone()));
        }
        Ok(Mesh::new(self.name.as_str(), vertices, faces))
    }
}

/// Latitude/longitude sphere triangulation.
fn uv_sphere(
    center: [f64; 3],
    radius: f64,
    stacks: usize,
    slices: usize,
) -> (Vec<[f64; 3]>, Vec<[u32; 3]>) {
    use std::f64::consts::PI;

    let mut vertices: Vec<[f64; 3]> = Vec::with_capacity((stacks - 1) * slices + 2);
    vertices.push([center[0], center[1], center[2] + radius]);
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            vertices.push([
                center[0] + radius * sin_phi * theta.cos(),
                center[1] + radius * sin_phi * theta.sin(),
                center[2] + radius * cos_phi,
            ]);
        }
    }
    vertices.push([center[0], center[1], center[2] - radius]);

    let ring = |i: usize, j: usize| (1 + (i - 1) * slices + j % slices) as u32;
    let bottom = (vertices.len() - 1) as u32;

    let mut faces: Vec<[u32; 3]> = Vec::with_capacity(2 * (stacks - 1) * slices);
    for j in 0..slices {
        faces.push([0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let a = ring(i, j);
            let b = ring(i, j + 1);
            let c = ring(i + 1, j + 1);
            let d = ring(i + 1, j);
            faces.push([a, c, b]);
            faces.push([a, d, c]);
        }
    }
    for j in 0..slices {
        faces.push([bottom, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }
    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{circle, rect};

    fn info(index: i64) -> SectionInfo {
        SectionInfo::new(index, 1.0, 1.0)
    }

    fn flat_options() -> GenerateOptions {
        GenerateOptions {
            smoothing: Smoothing::None,
            iterations: 0,
            resolution: Some(1.0),
            alpha: 1.0,
        }
    }

    fn stacked_circles(name: &str, sections: i64, radius: f64) -> Object3D {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::surface(name, &mut colors);
        for s in 0..sections {
            let t = Trace::new(name, circle(10.0, 10.0, radius, 64));
            obj.add_trace(&t, &info(s)).unwrap();
        }
        obj
    }

    #[test]
    fn stacked_circles_volume_matches_cylinder() {
        let sections = 4;
        let radius = 8.0;
        let obj = stacked_circles("dendrite01", sections, radius);
        let mesh = obj.generate(&flat_options()).unwrap();

        // pi * r^2 * (N sections * 1.0 thickness)
        let expected = std::f64::consts::PI * radius * radius * sections as f64;
        assert!(
            (mesh.volume - expected).abs() < expected * 0.2,
            "volume {} vs cylinder {expected}",
            mesh.volume
        );
    }

    #[test]
    fn negative_trace_reduces_enclosed_volume() {
        let plain = stacked_circles("soma", 3, 8.0);
        let plain_volume = plain.generate(&flat_options()).unwrap().volume;

        let mut colors = ColorAssigner::new();
        let mut holed = Object3D::surface("soma", &mut colors);
        for s in 0..3 {
            let outer = Trace::new("soma", circle(10.0, 10.0, 8.0, 64));
            let hole = Trace::new("soma", circle(10.0, 10.0, 3.0, 32)).negative();
            holed.add_trace(&outer, &info(s)).unwrap();
            holed.add_trace(&hole, &info(s)).unwrap();
        }
        let holed_volume = holed.generate(&flat_options()).unwrap().volume;

        assert!(
            holed_volume < plain_volume * 0.95,
            "hole did not carve: {holed_volume} vs {plain_volume}"
        );
    }

    #[test]
    fn smoothing_preserves_topology_and_scale() {
        let obj = stacked_circles("spine02", 4, 8.0);
        let flat = obj.generate(&flat_options()).unwrap();

        let smoothed = obj
            .generate(&GenerateOptions {
                smoothing: Smoothing::Humphrey,
                iterations: 5,
                resolution: Some(1.0),
                alpha: 1.0,
            })
            .unwrap();

        assert_eq!(flat.faces.len(), smoothed.faces.len());
        assert_eq!(flat.vertices.len(), smoothed.vertices.len());
        let ratio = smoothed.volume / flat.volume;
        assert!((0.5..=1.05).contains(&ratio), "volume ratio {ratio}");
    }

    #[test]
    fn default_resolution_comes_from_section_mag() {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::surface("axon03", &mut colors);
        for s in 0..3 {
            let t = Trace::new("axon03", circle(10.0, 10.0, 6.0, 48));
            obj.add_trace(&t, &SectionInfo::new(s, 1.0, 2.0)).unwrap();
        }
        let mesh = obj
            .generate(&GenerateOptions {
                resolution: None,
                ..flat_options()
            })
            .unwrap();

        // World-unit volume should not depend much on the voxel density.
        let expected = std::f64::consts::PI * 36.0 * 3.0;
        assert!(
            (mesh.volume - expected).abs() < expected * 0.2,
            "volume {} vs cylinder {expected}",
            mesh.volume
        );
    }

    #[test]
    fn section_transform_is_applied() {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::spheres("mito05", &mut colors);
        // Pure translation by (100, 0).
        let tform = Mat3::from_affine2(1.0, 0.0, 0.0, 1.0, 100.0, 0.0);
        let t = Trace::new("mito05", circle(0.0, 0.0, 5.0, 32));
        obj.add_trace(&t, &info(0).with_tform(tform)).unwrap();

        let mesh = obj.generate(&flat_options()).unwrap();
        let (lo, hi) = mesh.bounding_box().unwrap();
        assert!(lo[0] > 90.0 && hi[0] < 110.0, "translation not applied");
    }

    #[test]
    fn to_image_inverts_the_section_transform() {
        let tform = Mat3::from_affine2(2.0, 0.0, 0.0, 2.0, 10.0, -4.0);
        let section = SectionInfo::new(0, 1.0, 1.0).with_tform(tform);

        let image_pts = rect(0.0, 0.0, 5.0, 5.0);
        let world: Vec<Pt> = image_pts.iter().map(|&p| tform.apply(p)).collect();
        let back = section.to_image(&world).unwrap();
        for (a, b) in image_pts.iter().zip(&back) {
            assert!((a.x - b.x).abs() < 1e-12, "{} vs {}", a.x, b.x);
            assert!((a.y - b.y).abs() < 1e-12, "{} vs {}", a.y, b.y);
        }

        let flat = SectionInfo::new(0, 1.0, 1.0)
            .with_tform(Mat3::from_affine2(1.0, 2.0, 2.0, 4.0, 0.0, 0.0));
        assert!(flat.to_image(&image_pts).is_err(), "singular transform");
    }

    #[test]
    fn sphere_volume_matches_trace_radius() {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::spheres("bouton09", &mut colors);
        let t = Trace::new("bouton09", circle(0.0, 0.0, 5.0, 64));
        obj.add_trace(&t, &SectionInfo::new(2, 2.0, 1.0)).unwrap();

        let mesh = obj.generate(&flat_options()).unwrap();
        let expected = 4.0 / 3.0 * std::f64::consts::PI * 125.0;
        assert!(
            (mesh.volume - expected).abs() < expected * 0.08,
            "sphere volume {} vs {expected}",
            mesh.volume
        );

        // Centered on the section mid-plane: z = (2 + 0.5) * 2.0.
        let (lo, hi) = mesh.bounding_box().unwrap();
        let z_center = (lo[2] + hi[2]) / 2.0;
        assert!((z_center - 5.0).abs() < 1e-9);
    }

    #[test]
    fn open_polyline_slab_emits_one_quad_per_segment() {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::slabs("zline11", &mut colors);
        let t = Trace::new(
            "zline11",
            vec![Pt::new(0.0, 0.0), Pt::new(10.0, 0.0), Pt::new(20.0, 5.0)],
        )
        .open();
        obj.add_trace(&t, &info(0)).unwrap();

        let mesh = obj.generate(&flat_options()).unwrap();
        assert_eq!(mesh.faces.len(), 4, "two segments, two triangles each");
        let (lo, hi) = mesh.bounding_box().unwrap();
        assert_eq!(lo[2], 0.0);
        assert_eq!(hi[2], 0.5, "slab spans half the section thickness");
    }

    #[test]
    fn closed_trace_slab_wraps_around() {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::slabs("ring13", &mut colors);
        let t = Trace::new("ring13", rect(0.0, 0.0, 5.0, 5.0));
        obj.add_trace(&t, &info(1)).unwrap();

        let mesh = obj.generate(&flat_options()).unwrap();
        assert_eq!(mesh.faces.len(), 8, "four edges, two triangles each");
    }

    #[test]
    fn generate_without_traces_fails() {
        let mut colors = ColorAssigner::new();
        for obj in [
            Object3D::surface("empty", &mut colors),
            Object3D::spheres("empty", &mut colors),
            Object3D::slabs("empty", &mut colors),
        ] {
            assert!(obj.generate(&flat_options()).is_err());
        }
    }

    #[test]
    fn surface_rejects_open_traces() {
        let mut colors = ColorAssigner::new();
        let mut obj = Object3D::surface("axon", &mut colors);
        let t = Trace::new("axon", vec![Pt::new(0.0, 0.0), Pt::new(5.0, 0.0)]).open();
        assert!(obj.add_trace(&t, &info(0)).is_err());
    }

    #[test]
    fn object_color_comes_from_the_assigner() {
        let mut colors = ColorAssigner::new();
        let expected = colors.color_for("dendrite01");
        let obj = stacked_circles("dendrite01", 2, 6.0);
        assert_eq!(obj.color, expected);

        let mesh = obj.generate(&flat_options()).unwrap();
        assert!((mesh.color[0] - expected[0] as f64 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn extremes_grow_only_by_add_calls() {
        let mut e = Extremes::new();
        assert!(e.is_empty());
        e.add_point(1.0, 2.0, 3.0);
        e.add_point(-1.0, 5.0, 0.0);
        assert_eq!((e.xmin, e.xmax), (-1.0, 1.0));
        assert_eq!((e.ymin, e.ymax), (2.0, 5.0));
        assert_eq!((e.zmin, e.zmax), (0.0, 3.0));

        let mut other = Extremes::new();
        other.add_point(10.0, 10.0, 10.0);
        e.union(&other);
        assert_eq!(e.xmax, 10.0);
        e.union(&Extremes::new());
        assert_eq!(e.xmax, 10.0, "empty union is a no-op");
    }
}

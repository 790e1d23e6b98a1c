//! Boolean voxel volume built by stacking per-section filled polygons.
//!
//! Positive loops are OR'd into a section's slice, negative loops are
//! carved out afterwards, so holes win regardless of draw order within a
//! section. Loop coordinates arrive in world units; the volume maps them
//! through its resolution (voxels per world unit).

use crate::error::{Result, SectraceError};
use crate::geom::Pt;

pub struct VoxelVolume {
    nx: usize,
    ny: usize,
    nz: usize,
    // Indexed [z][y][x].
    data: Vec<bool>,
    // World coordinate of voxel (0, 0) in x/y, first section index in z.
    x0: f64,
    y0: f64,
    z0: i64,
    resolution: f64,
    section_thickness: f64,
}

impl VoxelVolume {
    /// Allocates an empty volume spanning the given world-space x/y ranges
    /// and inclusive section index range.
    pub fn new(
        x_range: (f64, f64),
        y_range: (f64, f64),
        section_range: (i64, i64),
        resolution: f64,
        section_thickness: f64,
    ) -> Result<Self> {
        if !(resolution > 0.0) || !(section_thickness > 0.0) {
            return Err(SectraceError::InvalidInput(format!(
                "resolution {resolution} and thickness {section_thickness} must be positive"
            )));
        }
        if x_range.1 < x_range.0 || y_range.1 < y_range.0 || section_range.1 < section_range.0 {
            return Err(SectraceError::InvalidInput(
                "volume extents are inverted".to_string(),
            ));
        }

        let nx = ((x_range.1 - x_range.0) * resolution).round() as usize + 1;
        let ny = ((y_range.1 - y_range.0) * resolution).round() as usize + 1;
        let nz = (section_range.1 - section_range.0) as usize + 1;

        Ok(Self {
            nx,
            ny,
            nz,
            data: vec![false; nx * ny * nz],
            x0: x_range.0,
            y0: y_range.0,
            z0: section_range.0,
            resolution,
            section_thickness,
        })
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn section_thickness(&self) -> f64 {
        self.section_thickness
    }

    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.ny + y) * self.nx + x
    }

    /// Occupancy at voxel index coordinates; false outside the allocation.
    #[inline]
    pub fn get(&self, x: i64, y: i64, z: i64) -> bool {
        if x < 0 || y < 0 || z < 0 {
            return false;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= self.nx || y >= self.ny || z >= self.nz {
            return false;
        }
        self.data[self.idx(x, y, z)]
    }

    pub fn voxel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Maps a fractional voxel position back to world coordinates.
    pub fn world_x(&self, fx: f64) -> f64 {
        self.x0 + fx / self.resolution
    }

    pub fn world_y(&self, fy: f64) -> f64 {
        self.y0 + fy / self.resolution
    }

    pub fn world_z(&self, fz: f64) -> f64 {
        (self.z0 as f64 + fz) * self.section_thickness
    }

    /// Rasterizes one section's trace loops into its slice: positive loops
    /// OR in, then negative loops carve out.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `section` is outside the volume's z-extent.
    pub fn fill_section(
        &mut self,
        section: i64,
        positives: &[Vec<Pt>],
        negatives: &[Vec<Pt>],
    ) -> Result<()> {
        let zi = section - self.z0;
        if zi < 0 || zi >= self.nz as i64 {
            return Err(SectraceError::InvalidInput(format!(
                "section {section} outside volume z-extent [{}, {}]",
                self.z0,
                self.z0 + self.nz as i64 - 1
            )));
        }
        let zi = zi as usize;

        for loop_pts in positives {
            let ring = self.to_voxel_ring(loop_pts);
            let (nx, ny) = (self.nx, self.ny);
            fill_ring(&ring, nx as i64, ny as i64, &mut |x_start, x_end, y| {
                let base = (zi * ny + y as usize) * nx;
                for x in x_start..x_end {
                    self.data[base + x as usize] = true;
                }
            });
        }

        for loop_pts in negatives {
            let ring = self.to_voxel_ring(loop_pts);
            let (nx, ny) = (self.nx, self.ny);
            fill_ring(&ring, nx as i64, ny as i64, &mut |x_start, x_end, y| {
                let base = (zi * ny + y as usize) * nx;
                for x in x_start..x_end {
                    self.data[base + x as usize] = false;
                }
            });
        }

        Ok(())
    }

    fn to_voxel_ring(&self, pts: &[Pt]) -> Vec<[i64; 2]> {
        pts.iter()
            .map(|p| {
                [
                    ((p.x - self.x0) * self.resolution).round() as i64,
                    ((p.y - self.y0) * self.resolution).round() as i64,
                ]
            })
            .collect()
    }
}

// Even-odd scanline fill of a single ring. The callback receives
// half-open x spans per row; the half-open vertex rule avoids
// double-counting shared vertices. Spans are clipped to [0, xmax) x
// [0, ymax); geometry outside is silently dropped.
fn fill_ring<F: FnMut(i64, i64, i64)>(ring: &[[i64; 2]], xmax: i64, ymax: i64, callback: &mut F) {
    if ring.len() < 3 {
        return;
    }

    let mut x_intersections: Vec<i64> = Vec::new();

    for pixel_y in 0..ymax {
        x_intersections.clear();

        let mut prev = ring[ring.len() - 1];
        for &curr in ring {
            let (x0, y0) = (prev[0], prev[1]);
            let (x1, y1) = (curr[0], curr[1]);
            prev = curr;

            if y0 == y1 {
                continue;
            }
            let y_min = y0.min(y1);
            let y_max = y0.max(y1);
            // Half-open range so a vertex is counted for one edge only.
            if pixel_y < y_min || pixel_y >= y_max {
                continue;
            }
            let t = (pixel_y - y0) as f64 / (y1 - y0) as f64;
            let x = x0 as f64 + t * (x1 - x0) as f64;
            x_intersections.push(x.round() as i64);
        }

        if x_intersections.len() < 2 {
            continue;
        }
        x_intersections.sort_unstable();

        for pair in x_intersections.chunks_exact(2) {
            let mut x_src = pair[0];
            let mut x_dst = pair[1];
            if x_src >= xmax || x_dst <= 0 {
                continue;
            }
            x_src = x_src.max(0);
            x_dst = x_dst.min(xmax);
            if x_src < x_dst {
                callback(x_src, x_dst, pixel_y);
            }
        }
    }
}

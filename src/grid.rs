//! Integer occupancy grid shared by the trace editing operations.
//!
//! Contours are drawn as 1-pixel strokes with an incremental-error line
//! walk; cells accumulate hit counts, so a cell drawn by two contour
//! passes (or by the two segments meeting at a polygon vertex) holds a
//! value > 1. A cut line decrements instead, leaving negative marks that
//! [`Grid::interiors`] resolves before boundary extraction.

use crate::contour::{self, CellPt};
use crate::error::{Result, SectraceError};
use crate::geom::{self, Pt};

pub struct Grid {
    w: usize,
    h: usize,
    // World coordinate of cell (0, 0). One less than the input bounding
    // box minimum, so the boundary follower has an empty ring to stand on.
    x_shift: i64,
    y_shift: i64,
    cells: Vec<i32>,
    // Original input contours, kept for the point-in-polygon tests that
    // cut-line resolution needs.
    contours: Vec<Vec<Pt>>,
}

impl Grid {
    /// Rasterizes one or more closed contours (and optionally a cut line)
    /// onto a fresh grid.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when no contour points exist at all; no sensible
    /// bounding box can be built then.
    pub fn build(contours: &[Vec<Pt>], cutline: Option<&[Pt]>) -> Result<Grid> {
        if contours.is_empty() || contours.iter().all(|c| c.is_empty()) {
            return Err(SectraceError::InvalidInput(
                "buildGrid needs at least one non-empty contour".to_string(),
            ));
        }

        let all_points = contours
            .iter()
            .flat_map(|c| c.iter())
            .chain(cutline.into_iter().flatten());

        let mut xmin = i64::MAX;
        let mut xmax = i64::MIN;
        let mut ymin = i64::MAX;
        let mut ymax = i64::MIN;
        for p in all_points {
            let xr = p.x.round() as i64;
            let yr = p.y.round() as i64;
            xmin = xmin.min(xr);
            xmax = xmax.max(xr);
            ymin = ymin.min(yr);
            ymax = ymax.max(yr);
        }

        // One empty pixel on every side.
        let x_shift = xmin - 1;
        let y_shift = ymin - 1;
        let w = (xmax - xmin + 3) as usize;
        let h = (ymax - ymin + 3) as usize;

        let mut grid = Grid {
            w,
            h,
            x_shift,
            y_shift,
            cells: vec![0; w * h],
            contours: contours.to_vec(),
        };

        for loop_pts in contours {
            grid.draw_loop(loop_pts, DrawMode::Contour);
        }
        if let Some(knife) = cutline {
            grid.draw_polyline(knife, DrawMode::Cut);
        }

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    /// Cell value at grid coordinates, 0 outside the allocation.
    pub fn cell(&self, x: i64, y: i64) -> i32 {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return 0;
        }
        self.cells[y as usize * self.w + x as usize]
    }

    fn to_cell(&self, p: &Pt) -> (i64, i64) {
        (
            p.x.round() as i64 - self.x_shift,
            p.y.round() as i64 - self.y_shift,
        )
    }

    fn draw_loop(&mut self, pts: &[Pt], mode: DrawMode) {
        let n = pts.len();
        for i in 0..n {
            let a = self.to_cell(&pts[i]);
            let b = self.to_cell(&pts[(i + 1) % n]);
            self.draw_line(a, b, mode);
        }
    }

    fn draw_polyline(&mut self, pts: &[Pt], mode: DrawMode) {
        for pair in pts.windows(2) {
            let a = self.to_cell(&pair[0]);
            let b = self.to_cell(&pair[1]);
            self.draw_line(a, b, mode);
        }
    }

    // Incremental line walk: unit steps along the axis of greater extent,
    // rounding the minor coordinate. Both endpoints are plotted, so the
    // shared vertex of two consecutive segments accumulates two hits.
    fn draw_line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), mode: DrawMode) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs());
        if steps == 0 {
            // Coincident endpoints are a no-op.
            return;
        }

        let sx = dx as f64 / steps as f64;
        let sy = dy as f64 / steps as f64;
        for t in 0..=steps {
            let x = x0 + (t as f64 * sx).round() as i64;
            let y = y0 + (t as f64 * sy).round() as i64;
            self.plot(x, y, mode);
        }
    }

    fn plot(&mut self, x: i64, y: i64, mode: DrawMode) {
        // Cells outside the allocation are silently skipped.
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return;
        }
        let i = y as usize * self.w + x as usize;
        match mode {
            DrawMode::Contour => self.cells[i] = self.cells[i].max(0) + 1,
            DrawMode::Cut => self.cells[i] -= 1,
        }
    }

    /// Resolves cut-line marks: a negative cell outside every contour is
    /// noise and is zeroed; inside (boundary inclusive) it flips positive
    /// and becomes part of the boundary used for the interior split.
    pub fn remove_cuts(&mut self) {
        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.idx(x, y);
                if self.cells[i] >= 0 {
                    continue;
                }
                let world = Pt::new(
                    (x as i64 + self.x_shift) as f64,
                    (y as i64 + self.y_shift) as f64,
                );
                let inside = self
                    .contours
                    .iter()
                    .any(|c| geom::point_in_polygon(world, c));
                self.cells[i] = if inside { -self.cells[i] } else { 0 };
            }
        }
    }

    /// Outer boundary polygons of the rasterized shape(s), anchor-filtered
    /// and shifted back into the input coordinate space. Disjoint inputs
    /// yield one polygon each.
    pub fn exteriors(&self) -> Vec<Vec<Pt>> {
        let mut scratch: Vec<i32> = self.cells.iter().map(|&v| (v != 0) as i32).collect();
        let boundaries = contour::trace_boundaries(&mut scratch, self.w, self.h);

        boundaries
            .iter()
            .filter(|b| b.is_outer_top_level())
            .map(|b| self.shift_back(&self.anchor_filter(&b.points)))
            .collect()
    }

    /// Interior fragment polygons after cut resolution: the boundary
    /// components enclosed by the stroke image, i.e. everything except the
    /// outermost frame boundary.
    pub fn interiors(&mut self) -> Vec<Vec<Pt>> {
        self.remove_cuts();

        let mut scratch: Vec<i32> = self.cells.iter().map(|&v| (v != 0) as i32).collect();
        let boundaries = contour::trace_boundaries(&mut scratch, self.w, self.h);

        boundaries
            .iter()
            .filter(|b| b.is_hole)
            .map(|b| self.shift_back(&self.anchor_filter(&b.points)))
            .collect()
    }

    // A traced pixel is an anchor when its hit count says two contour
    // passes met there, or when enough of its neighborhood is occupied to
    // mark a genuine corner/junction of the rasterized shape. Raw tracer
    // output is pixel-dense; this compresses it to shape-defining vertices.
    fn anchor_filter(&self, pts: &[CellPt]) -> Vec<CellPt> {
        let anchors: Vec<CellPt> = pts
            .iter()
            .copied()
            .filter(|p| self.is_anchor(p.x as i64, p.y as i64))
            .collect();

        // A fragment needs at least a triangle; keep the dense loop when
        // filtering was too aggressive.
        if anchors.len() >= 3 {
            anchors
        } else {
            pts.to_vec()
        }
    }

    fn is_anchor(&self, x: i64, y: i64) -> bool {
        if self.cell(x, y) > 1 {
            return true;
        }
        let mut occupied = 0;
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if (dx != 0 || dy != 0) && self.cell(x + dx, y + dy) != 0 {
                    occupied += 1;
                }
            }
        }
        occupied >= 3
    }

    fn shift_back(&self, pts: &[CellPt]) -> Vec<Pt> {
        pts.iter()
            .map(|p| {
                Pt::new(
                    (p.x as i64 + self.x_shift) as f64,
                    (p.y as i64 + self.y_shift) as f64,
                )
            })
            .collect()
    }

    /// ASCII dump for debugging: `.` empty, digits for hit counts,
    /// `-` for unresolved cut marks, `*` for counts above 9.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.w + 1) * self.h);
        for y in 0..self.h {
            for x in 0..self.w {
                let v = self.cells[self.idx(x, y)];
                out.push(match v {
                    0 => '.',
                    1..=9 => (b'0' + v as u8) as char,
                    v if v < 0 => '-',
                    _ => '*',
                });
            }
            out.push('\n');
        }
        out
    }

    /// Saves the binarized occupancy mask as a grayscale PNG.
    #[cfg(feature = "im-io")]
    pub fn save_mask_png<P: AsRef<std::path::Path>>(&self, path: P) -> image::ImageResult<()> {
        let raw: Vec<u8> = self
            .cells
            .iter()
            .map(|&v| if v != 0 { 255u8 } else { 0u8 })
            .collect();
        let img = image::GrayImage::from_raw(self.w as u32, self.h as u32, raw).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        img.save_with_format(path, image::ImageFormat::Png)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DrawMode {
    Contour,
    Cut,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::rect;

    #[test]
    fn build_rejects_empty_input() {
        assert!(Grid::build(&[], None).is_err());
        assert!(Grid::build(&[vec![]], None).is_err());
    }

    #[test]
    fn square_stroke_rasterizes_with_vertex_double_hits() {
        let sq = rect(0.0, 0.0, 6.0, 6.0);
        let grid = Grid::build(&[sq.clone()], None).unwrap();

        // 6x6 square with 1px margin each side -> 9x9 cells.
        assert_eq!(grid.width(), 9);
        assert_eq!(grid.height(), 9);

        // Vertices are drawn by two segments each; runs only once.
        for p in &sq {
            let x = p.x.round() as i64 + 1;
            let y = p.y.round() as i64 + 1;
            assert_eq!(grid.cell(x, y), 2, "vertex at ({x},{y})");
        }
        assert_eq!(grid.cell(4, 1), 1, "mid-run pixel hit once");
        assert_eq!(grid.cell(4, 4), 0, "interior stays empty");
    }

    #[test]
    fn exterior_of_square_recovers_square() {
        let sq = rect(0.0, 0.0, 10.0, 10.0);
        let grid = Grid::build(&[sq.clone()], None).unwrap();
        let ext = grid.exteriors();
        assert_eq!(ext.len(), 1);

        // Outer stroke boundary: same shape within a pixel of growth.
        let a = geom::area(&ext[0]);
        assert!(a >= 100.0 && a <= 130.0, "area {a} out of range");
    }

    #[test]
    fn disjoint_contours_give_two_exteriors() {
        let a = rect(0.0, 0.0, 5.0, 5.0);
        let b = rect(20.0, 0.0, 25.0, 5.0);
        let grid = Grid::build(&[a, b], None).unwrap();
        assert_eq!(grid.exteriors().len(), 2);
    }

    #[test]
    fn cut_marks_resolve_inside_and_outside() {
        let sq = rect(0.0, 0.0, 10.0, 10.0);
        // Knife crosses the square and keeps going well past it.
        let knife = vec![Pt::new(5.0, -4.0), Pt::new(5.0, 14.0)];
        let mut grid = Grid::build(&[sq], Some(&knife)).unwrap();

        // Before resolution: negative marks along the knife outside the
        // square. World (5,-4) lands at cell (6,1) after the shift.
        assert!(grid.cell(6, 1) < 0);
        grid.remove_cuts();
        // Outside marks zeroed, inside marks flipped positive.
        assert_eq!(grid.cell(6, 1), 0);
        assert!(grid.cell(6, 10) > 0, "world (5,5) kept as boundary");
    }

    #[test]
    fn interiors_of_cut_square_are_two_fragments() {
        let sq = rect(0.0, 0.0, 12.0, 12.0);
        let knife = vec![Pt::new(6.0, -2.0), Pt::new(6.0, 14.0)];
        let mut grid = Grid::build(&[sq], Some(&knife)).unwrap();
        let fragments = grid.interiors();
        assert_eq!(fragments.len(), 2);
        for f in &fragments {
            let a = geom::area(f);
            assert!(a > 20.0, "fragment area {a} too small");
        }
    }

    #[test]
    fn ascii_dump_shows_stroke() {
        let sq = rect(0.0, 0.0, 4.0, 4.0);
        let grid = Grid::build(&[sq], None).unwrap();
        let art = grid.to_ascii();
        assert!(art.contains('2'), "vertex hits visible:\n{art}");
        assert!(art.starts_with("......."), "empty margin row:\n{art}");
    }
}

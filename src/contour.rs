//! Suzuki-Abe boundary following over an i32 cell buffer.
//!
//! The grid rasterizer draws traces as 1-pixel strokes; this module
//! recovers the boundary components of that stroke image. Outer boundaries
//! (`is_hole == false`) wrap each connected stroke component from outside;
//! hole boundaries wrap the empty regions a component encloses, which is
//! exactly what interior extraction after a cut needs.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellPt {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug)]
pub struct Boundary {
    pub is_hole: bool,
    /// Index of the enclosing boundary, if any. Top-level outer boundaries
    /// have no parent.
    pub parent: Option<usize>,
    pub points: Vec<CellPt>,
}

impl Boundary {
    pub fn is_outer_top_level(&self) -> bool {
        !self.is_hole && self.parent.is_none()
    }
}

// 8-neighborhood LUTs, clockwise and counter-clockwise, dir 0 = east.
const DIR_TO_DELT_CW: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const DELT_PLUS_1_TO_DIR_CW: [i32; 9] = [
    // dy = -1, dx = -1,0,1
    5, 6, 7, //
    // dy = 0, dx = -1,0,1 (0,0 impossible)
    4, -1, 0, //
    // dy = 1, dx = -1,0,1
    3, 2, 1,
];

const DIR_TO_DELT_CCW: [(i32, i32); 8] = [
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const DELT_PLUS_1_TO_DIR_CCW: [i32; 9] = [
    // dy = -1
    3, 2, 1, //
    // dy = 0
    4, -1, 0, //
    // dy = 1
    5, 6, 7,
];

#[inline]
fn delt_to_dir_cw(dy: i32, dx: i32) -> i32 {
    DELT_PLUS_1_TO_DIR_CW[((dy + 1) * 3 + (dx + 1)) as usize]
}

#[inline]
fn delt_to_dir_ccw(dy: i32, dx: i32) -> i32 {
    DELT_PLUS_1_TO_DIR_CCW[((dy + 1) * 3 + (dx + 1)) as usize]
}

/// Traces every boundary component of the nonzero cells in `cells`
/// (row-major, `w` by `h`, stride == `w`).
///
/// The buffer is consumed as scratch: the outermost ring is forced to
/// zero, the interior is normalized to {0,1}, and border labels are
/// written in-place while following. Callers pass a binarized copy.
pub fn trace_boundaries(cells: &mut [i32], w: usize, h: usize) -> Vec<Boundary> {
    assert!(w >= 2 && h >= 2, "need at least a 1-pixel border");
    assert!(cells.len() >= w * h);

    let idx = |x: usize, y: usize| -> usize { y * w + x };
    let w1 = w - 1;
    let h1 = h - 1;

    // Force the frame to zero so following never walks off the edge.
    for y in 0..h {
        cells[idx(0, y)] = 0;
        cells[idx(w1, y)] = 0;
    }
    for x in 0..w {
        cells[idx(x, 0)] = 0;
        cells[idx(x, h1)] = 0;
    }

    // Normalize interior to {0,1}.
    for v in cells[..w * h].iter_mut() {
        *v = if *v == 0 { 0 } else { 1 };
    }

    let mut boundaries: Vec<Boundary> = Vec::new();
    let mut id_to_index: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
    let mut curr_id: i32 = 1;

    // Raster scan (step (0) of the paper).
    for y0 in 1..h1 {
        let mut last_id: i32 = 1;

        for x0 in 1..w1 {
            let f0 = cells[idx(x0, y0)];

            // ((2)) in the paper: the background neighbor we started from.
            let mut y2: i32;
            let mut x2: i32;
            let is_hole;

            if f0 == 1 && cells[idx(x0 - 1, y0)] == 0 {
                // (1a) outer boundary start
                is_hole = false;
                curr_id += 1;
                y2 = y0 as i32;
                x2 = (x0 as i32) - 1;
            } else if f0 >= 1 && cells[idx(x0 + 1, y0)] == 0 {
                // (1b) hole boundary start
                is_hole = true;
                curr_id += 1;
                y2 = y0 as i32;
                x2 = (x0 as i32) + 1;
                if f0 > 1 {
                    last_id = f0;
                }
            } else {
                // (1c) not a boundary start; update last_id and move on.
                if cells[idx(x0, y0)] != 1 {
                    last_id = cells[idx(x0, y0)].abs();
                }
                continue;
            }

            // (2) decide parent from the most recently crossed boundary.
            let new_index = boundaries.len();
            boundaries.push(Boundary {
                is_hole,
                parent: None,
                points: Vec::new(),
            });
            id_to_index.insert(curr_id, new_index);

            if let Some(&last_idx) = id_to_index.get(&last_id) {
                let last_is_hole = boundaries[last_idx].is_hole;
                let last_parent = boundaries[last_idx].parent;
                boundaries[new_index].parent = if last_is_hole == is_hole {
                    // same kind: siblings, share the parent
                    last_parent
                } else {
                    // hole inside contour, or contour inside hole
                    Some(last_idx)
                };
            }

            // (3.1) clockwise search around ((0)) starting from ((2)).
            let dir0 = delt_to_dir_cw(y2 - y0 as i32, x2 - x0 as i32);
            let mut start_nbr: Option<(i32, i32)> = None;
            for d in 0..8 {
                let (ddy, ddx) = DIR_TO_DELT_CW[((dir0 + d) % 8) as usize];
                let ny = y0 as i32 + ddy;
                let nx = x0 as i32 + ddx;
                if cells[idx(nx as usize, ny as usize)] != 0 {
                    start_nbr = Some((ny, nx));
                    break;
                }
            }

            let Some((y1, x1)) = start_nbr else {
                // Singleton pixel: a one-point boundary.
                cells[idx(x0, y0)] = -curr_id;
                boundaries[new_index].points.push(CellPt {
                    x: x0 as i32,
                    y: y0 as i32,
                });
                if cells[idx(x0, y0)] != 1 {
                    last_id = cells[idx(x0, y0)].abs();
                }
                continue;
            };

            // (3.2) ((2)) = ((1)); ((3)) = ((0)); then follow.
            y2 = y1;
            x2 = x1;
            let mut y3 = y0 as i32;
            let mut x3 = x0 as i32;

            loop {
                boundaries[new_index].points.push(CellPt { x: x3, y: y3 });

                // (3.3) counter-clockwise search for ((4)) starting after ((2)).
                let dir0 = delt_to_dir_ccw(y2 - y3, x2 - x3);
                let mut east_was_examined = false;
                let mut y4 = 0i32;
                let mut x4 = 0i32;
                let mut found = false;
                for d in 0..8 {
                    let (ddy, ddx) = DIR_TO_DELT_CCW[((dir0 + d + 1) % 8) as usize];
                    if ddy == 0 && ddx == 1 {
                        east_was_examined = true;
                    }
                    let ny = y3 + ddy;
                    let nx = x3 + ddx;
                    if cells[idx(nx as usize, ny as usize)] != 0 {
                        y4 = ny;
                        x4 = nx;
                        found = true;
                        break;
                    }
                }
                assert!(found, "nonzero pixel lost its neighborhood");

                // (3.4) label f((3)).
                let i3 = idx(x3 as usize, y3 as usize);
                if east_was_examined && cells[idx(x3 as usize + 1, y3 as usize)] == 0 {
                    cells[i3] = -curr_id;
                } else if cells[i3] == 1 {
                    cells[i3] = curr_id;
                }

                // (3.5) termination: ((4)) == ((0)) and ((3)) == ((1)).
                if y4 == y0 as i32 && x4 == x0 as i32 && y3 == y1 && x3 == x1 {
                    break;
                }

                y2 = y3;
                x2 = x3;
                y3 = y4;
                x3 = x4;
            }

            // (4) update last_id before continuing the scan.
            if cells[idx(x0, y0)] != 1 {
                last_id = cells[idx(x0, y0)].abs();
            }
        }
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::cells_from_ascii;

    #[test]
    fn single_ring_yields_outer_and_hole() {
        // Closed 1-pixel square stroke: one outer boundary plus the hole
        // it encloses.
        let (mut cells, w, h) = cells_from_ascii(
            "
            .......
            .#####.
            .#...#.
            .#...#.
            .#####.
            .......
            ",
        );
        let boundaries = trace_boundaries(&mut cells, w, h);
        assert_eq!(boundaries.len(), 2);

        let outers: Vec<_> = boundaries.iter().filter(|b| !b.is_hole).collect();
        let holes: Vec<_> = boundaries.iter().filter(|b| b.is_hole).collect();
        assert_eq!(outers.len(), 1);
        assert_eq!(holes.len(), 1);
        assert!(outers[0].is_outer_top_level());
        assert_eq!(holes[0].parent, Some(0));

        // Outer boundary walks each stroke pixel exactly once: two rows of
        // 5 plus two columns of 2 in the 5x4 ring.
        assert_eq!(outers[0].points.len(), 14);
        let mut seen = outers[0].points.clone();
        seen.sort_by_key(|p| (p.y, p.x));
        seen.dedup();
        assert_eq!(seen.len(), 14, "no pixel visited twice");
    }

    #[test]
    fn disjoint_components_are_both_top_level() {
        let (mut cells, w, h) = cells_from_ascii(
            "
            ........
            .##..##.
            .##..##.
            ........
            ",
        );
        let boundaries = trace_boundaries(&mut cells, w, h);
        let outers: Vec<_> = boundaries
            .iter()
            .filter(|b| b.is_outer_top_level())
            .collect();
        assert_eq!(outers.len(), 2);
        assert!(boundaries.iter().all(|b| !b.is_hole));
    }

    #[test]
    fn theta_shape_yields_two_holes() {
        // A ring with a chord across it: one stroke component enclosing
        // two empty regions. This is the shape a knife cut produces.
        let (mut cells, w, h) = cells_from_ascii(
            "
            .........
            .#######.
            .#..#..#.
            .#..#..#.
            .#######.
            .........
            ",
        );
        let boundaries = trace_boundaries(&mut cells, w, h);
        let holes: Vec<_> = boundaries.iter().filter(|b| b.is_hole).collect();
        assert_eq!(holes.len(), 2);
        assert_eq!(
            boundaries.iter().filter(|b| !b.is_hole).count(),
            1,
            "single stroke component"
        );
    }

    #[test]
    fn singleton_pixel_is_a_one_point_boundary() {
        let (mut cells, w, h) = cells_from_ascii(
            "
            .....
            ..#..
            .....
            ",
        );
        let boundaries = trace_boundaries(&mut cells, w, h);
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].points, vec![CellPt { x: 2, y: 1 }]);
    }
}

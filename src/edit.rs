//! Trace editing operations: self-closing exterior, multi-trace merge,
//! and knife cuts. All three are pure functions composing the grid
//! rasterizer, the boundary extractor, and the point reducer; callers
//! wrap the returned point lists back into traces (name/color/closed are
//! the caller's to assign).

use crate::error::Result;
use crate::geom::{self, Pt};
use crate::grid::Grid;
use crate::reduce::reduce_points;

// Reduction policy for extracted boundaries. Points arrive in local pixel
// units, so the tolerance is fixed below the half-pixel staircase area and
// exact corners are never pruned.
const REDUCE_TOLERANCE: f64 = 0.3;
const REDUCE_ITERATIONS: usize = 5;

/// Fragments below this share of the pre-cut area are discarded as noise.
const CUT_AREA_THRESHOLD: f64 = 0.01;

/// Union exterior of a single trace, resolving self-intersections and
/// closing the contour.
pub fn get_exterior(points: &[Pt]) -> Result<Vec<Pt>> {
    let grid = Grid::build(&[points.to_vec()], None)?;
    let mut exteriors = finish(grid.exteriors());

    // A single input stroke is one connected component, but degrade
    // gracefully on pathological input: keep the largest boundary.
    exteriors.sort_by(|a, b| {
        geom::area(b)
            .partial_cmp(&geom::area(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(exteriors.into_iter().next().unwrap_or_default())
}

/// Union exterior(s) of many traces. Overlapping traces merge into one
/// polygon; disjoint traces come back as separate polygons.
pub fn merge_traces(traces: &[Vec<Pt>]) -> Result<Vec<Vec<Pt>>> {
    let grid = Grid::build(traces, None)?;
    Ok(finish(grid.exteriors()))
}

/// Splits `trace` along `knife` into interior fragments.
///
/// Fragments smaller than 1% of the original trace area are dropped (a
/// knife barely clipping a corner should not spawn a sliver trace). A
/// knife that misses the trace entirely returns a single fragment
/// geometrically equivalent to the input; callers treat that as a no-op,
/// not an error.
pub fn cut_traces(trace: &[Pt], knife: &[Pt]) -> Result<Vec<Vec<Pt>>> {
    let threshold = geom::area(trace) * CUT_AREA_THRESHOLD;

    let mut grid = Grid::build(&[trace.to_vec()], Some(knife))?;
    let fragments: Vec<Vec<Pt>> = grid
        .interiors()
        .into_iter()
        .filter(|f| geom::area(f) >= threshold)
        .collect();

    Ok(finish(fragments))
}

fn finish(polygons: Vec<Vec<Pt>>) -> Vec<Vec<Pt>> {
    polygons
        .into_iter()
        .map(|p| reduce_points(&p, REDUCE_TOLERANCE, REDUCE_ITERATIONS, true, 1.0))
        .collect()
}

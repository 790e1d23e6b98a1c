// Library crate root.
//
// Core engine for turning hand-annotated 2D section traces into edited
// contours (merge/cut on a raster grid) and 3D objects (marching-cubes
// surfaces, spheres, slabs). The surrounding application (GUI, file I/O,
// undo) lives elsewhere; everything here is synchronous and pure.

pub mod color;
pub mod contour;
pub mod edit;
pub mod error;
pub mod geom;
pub mod grid;
pub mod mat3;
pub mod mc;
pub mod mesh;
pub mod object3d;
pub mod reduce;
pub mod smooth;
pub mod trace;
pub mod volume;

#[cfg(test)]
pub mod test_helpers;

pub use error::{Result, SectraceError};

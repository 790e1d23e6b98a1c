use thiserror::Error;

/// Top-level error type for the sectrace engine.
#[derive(Debug, Error)]
pub enum SectraceError {
    /// The caller handed us something no sensible geometry can be built
    /// from (empty contour list, zero-extent volume, mesh/trace shape
    /// mismatch). These are contract violations and fail fast.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Marching cubes found no isosurface (fully empty or fully solid
    /// volume). Reported distinctly so callers can skip the object rather
    /// than receive a zero-vertex mesh.
    #[error("no isosurface in volume for object \"{0}\"")]
    EmptySurface(String),
}

/// Convenience alias for results using [`SectraceError`].
pub type Result<T> = std::result::Result<T, SectraceError>;

use serde::{Deserialize, Serialize};

use crate::geom::{self, Pt};

/// One user annotation on one section: an ordered 2D point sequence plus
/// the flags the engine cares about. Traces are immutable inputs; editing
/// operations return new point lists, never mutate a caller's trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// Object identity: traces sharing a name across sections form one 3D
    /// object.
    pub name: String,
    pub points: Vec<Pt>,
    /// Closed polygon vs. open polyline.
    #[serde(default = "default_closed")]
    pub closed: bool,
    /// A negative trace carves a hole when building volumes.
    #[serde(default)]
    pub negative: bool,
    /// RGB 0-255, carried through for mesh metadata only.
    #[serde(default)]
    pub color: [u8; 3],
}

fn default_closed() -> bool {
    true
}

impl Trace {
    pub fn new(name: impl Into<String>, points: Vec<Pt>) -> Self {
        Self {
            name: name.into(),
            points,
            closed: true,
            negative: false,
            color: [255, 255, 255],
        }
    }

    pub fn open(mut self) -> Self {
        self.closed = false;
        self
    }

    pub fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Unsigned enclosed area (0 for open or degenerate traces).
    pub fn area(&self) -> f64 {
        if !self.closed {
            return 0.0;
        }
        geom::area(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn trace_deserializes_from_json() {
        let sample = r#"
        {
            "name": "dendrite01",
            "points": [
                {"x": 0.0, "y": 0.0},
                {"x": 2.0, "y": 0.0},
                {"x": 2.0, "y": 2.0},
                {"x": 0.0, "y": 2.0}
            ],
            "color": [255, 128, 0]
        }
        "#;

        let trace: Trace = serde_json::from_str(sample).expect("sample json should deserialize");
        assert_eq!(trace.name, "dendrite01");
        assert!(trace.closed, "closed defaults to true");
        assert!(!trace.negative, "negative defaults to false");
        assert_eq!(trace.color, [255, 128, 0]);
        assert_relative_eq!(trace.area(), 4.0);
    }

    #[test]
    fn open_trace_has_zero_area() {
        let t = Trace::new(
            "axon",
            vec![Pt::new(0.0, 0.0), Pt::new(5.0, 0.0), Pt::new(5.0, 5.0)],
        )
        .open();
        assert_eq!(t.area(), 0.0);
    }
}

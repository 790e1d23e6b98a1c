use crate::geom::Pt;

/// Builds an i32 cell buffer from an ASCII picture: `.` is empty, `#` is
/// a single hit, digits are literal cell values.
pub fn cells_from_ascii(grid: &str) -> (Vec<i32>, usize, usize) {
    let rows: Vec<&str> = grid
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let h = rows.len();
    assert!(h > 0, "grid must have at least one non-empty row");
    let w = rows[0].len();
    assert!(w > 0, "grid rows must be non-empty");
    for r in &rows {
        assert_eq!(r.len(), w, "all rows must have equal length");
    }

    let mut cells = vec![0i32; w * h];
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            cells[y * w + x] = match ch {
                '.' => 0,
                '#' => 1,
                d => d
                    .to_digit(10)
                    .unwrap_or_else(|| panic!("invalid cell char '{d}', expected . # or digit"))
                    as i32,
            };
        }
    }
    (cells, w, h)
}

/// Axis-aligned rectangle as a point loop, counter-clockwise.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Pt> {
    vec![
        Pt::new(x0, y0),
        Pt::new(x1, y0),
        Pt::new(x1, y1),
        Pt::new(x0, y1),
    ]
}

/// Regular polygon approximating a circle.
pub fn circle(cx: f64, cy: f64, r: f64, n: usize) -> Vec<Pt> {
    assert!(n >= 3, "circle needs at least 3 vertices");
    let step = std::f64::consts::TAU / n as f64;
    (0..n)
        .map(|i| {
            let a = i as f64 * step;
            Pt::new(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

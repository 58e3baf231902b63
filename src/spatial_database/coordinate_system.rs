use std::fmt;

/// One of the two lattice axes.
///
/// `X` indexes matrix rows and `Y` indexes matrix columns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Physical size of a lattice cell along each axis.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct GridSpacing {
    pub x: f64,
    pub y: f64,
}

impl GridSpacing {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Physical separation of an integer (row, col) lag.
    pub fn lag_to_offset(&self, row_lag: isize, col_lag: isize) -> [f64; 2] {
        [row_lag as f64 * self.x, col_lag as f64 * self.y]
    }

    /// Euclidean length of an integer (row, col) lag.
    pub fn lag_distance(&self, row_lag: isize, col_lag: isize) -> f64 {
        let [x, y] = self.lag_to_offset(row_lag, col_lag);
        x.hypot(y)
    }
}

impl Default for GridSpacing {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Display};

/// A single board coordinate. `x` grows eastward, `y` grows southward.
///
/// The derived ordering (x first, then y) is relied upon by state
/// fingerprinting, so keep the field order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The cell translated by `(dx, dy)`.
    pub const fn translated(&self, dx: i64, dy: i64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl From<(i64, i64)> for Cell {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Sparse board representation exchanged at the engine boundary: unique live
/// coordinates, order-irrelevant.
pub type CellSet = HashSet<Cell>;

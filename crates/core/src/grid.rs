//! Uniform periodic grid helpers.

use serde::{Deserialize, Serialize};

/// Row-major grid of `ny` rows by `nx` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid2D {
    pub nx: usize,
    pub ny: usize,
}

impl Grid2D {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    pub fn square(n: usize) -> Self {
        Self { nx: n, ny: n }
    }

    #[inline]
    pub fn idx(&self, ix: usize, iy: usize) -> usize {
        iy * self.nx + ix
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_square(&self) -> bool {
        self.nx == self.ny
    }

    /// `(rows, cols)`, the numpy-style shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }
}

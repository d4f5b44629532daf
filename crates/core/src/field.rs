//! Contiguous real-valued field storage on a uniform 2D grid.
//!
//! # Precision
//!
//! [`Field2D<T>`] is stored in exactly one precision, fixed by `T`.
//! [`RealField`] erases that parameter so fields of either precision can cross
//! the model boundary, the same way a dtype-tagged array would.
//!
//! Conversions between precisions always go through [`ensure_precision`] (or
//! [`RealField::cast`]): the input is never touched and the result is a fresh,
//! independently owned field in the target precision. Widening is exact and
//! narrowing rounds once, so repeating a conversion at the same target is a
//! no-op on the values.

use crate::grid::Grid2D;
use crate::precision::{Real, RealType};

#[derive(Debug, Clone, PartialEq)]
pub struct Field2D<T: Real> {
    grid: Grid2D,
    data: Vec<T>,
}

impl<T: Real> Field2D<T> {
    pub fn zeros(grid: Grid2D) -> Self {
        Self {
            data: vec![T::zero(); grid.len()],
            grid,
        }
    }

    pub fn from_vec(grid: Grid2D, data: Vec<T>) -> Self {
        assert_eq!(data.len(), grid.len(), "data length must match grid size");
        Self { grid, data }
    }

    /// Build a field by evaluating `f(ix, iy)` at every grid point.
    pub fn from_fn(grid: Grid2D, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(grid.len());
        for iy in 0..grid.ny {
            for ix in 0..grid.nx {
                data.push(f(ix, iy));
            }
        }
        Self { grid, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    pub fn idx(&self, ix: usize, iy: usize) -> usize {
        self.grid.idx(ix, iy)
    }

    pub fn real_type(&self) -> RealType {
        T::REAL_TYPE
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, ix: usize, iy: usize) -> T {
        self.data[self.idx(ix, iy)]
    }

    pub fn get_mut(&mut self, ix: usize, iy: usize) -> &mut T {
        let idx = self.idx(ix, iy);
        &mut self.data[idx]
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Apply `f` pointwise, producing a new field on the same grid.
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            grid: self.grid,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Arithmetic mean, accumulated in `T`. Zero for an empty field.
    pub fn mean(&self) -> T {
        if self.data.is_empty() {
            return T::zero();
        }
        let sum = self.data.iter().fold(T::zero(), |acc, &v| acc + v);
        sum / T::from_usize(self.data.len()).unwrap_or_else(T::one)
    }

    /// Copy into precision `U`. Widening is exact; narrowing rounds to nearest.
    pub fn cast<U: Real>(&self) -> Field2D<U> {
        Field2D {
            grid: self.grid,
            data: self
                .data
                .iter()
                .map(|&v| U::from_f64_lossy(v.widen()))
                .collect(),
        }
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.iter().map(|&v| v.widen()).collect()
    }
}

impl<T: Real> From<Field2D<T>> for Vec<T> {
    fn from(field: Field2D<T>) -> Self {
        field.data
    }
}

// ============================================================================
// Precision-erased field
// ============================================================================

/// A real field in whichever precision it happens to be stored in.
#[derive(Debug, Clone, PartialEq)]
pub enum RealField {
    F32(Field2D<f32>),
    F64(Field2D<f64>),
}

impl RealField {
    pub fn real_type(&self) -> RealType {
        match self {
            RealField::F32(_) => RealType::F32,
            RealField::F64(_) => RealType::F64,
        }
    }

    pub fn grid(&self) -> Grid2D {
        match self {
            RealField::F32(field) => field.grid(),
            RealField::F64(field) => field.grid(),
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.grid().shape()
    }

    pub fn len(&self) -> usize {
        self.grid().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&Field2D<f32>> {
        f32::field_ref(self)
    }

    pub fn as_f64(&self) -> Option<&Field2D<f64>> {
        f64::field_ref(self)
    }

    /// Borrow as `Field2D<T>` if stored in precision `T`.
    pub fn downcast_ref<T: Real>(&self) -> Option<&Field2D<T>> {
        T::field_ref(self)
    }

    /// Values widened to `f64`, in row-major order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            RealField::F32(field) => field.to_f64_vec(),
            RealField::F64(field) => field.to_f64_vec(),
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            RealField::F32(field) => field.mean().widen(),
            RealField::F64(field) => field.mean(),
        }
    }

    /// Copy into `target` precision. Matching precision is a plain clone.
    pub fn cast(&self, target: RealType) -> RealField {
        match (self, target) {
            (RealField::F32(field), RealType::F32) => RealField::F32(field.clone()),
            (RealField::F32(field), RealType::F64) => RealField::F64(field.cast()),
            (RealField::F64(field), RealType::F32) => RealField::F32(field.cast()),
            (RealField::F64(field), RealType::F64) => RealField::F64(field.clone()),
        }
    }
}

impl From<Field2D<f32>> for RealField {
    fn from(field: Field2D<f32>) -> Self {
        RealField::F32(field)
    }
}

impl From<Field2D<f64>> for RealField {
    fn from(field: Field2D<f64>) -> Self {
        RealField::F64(field)
    }
}

/// Return a copy of `field` whose element type is exactly `target`.
///
/// Never mutates `field`. Idempotent: `ensure_precision(&ensure_precision(a, t), t)`
/// equals `ensure_precision(a, t)` in type and values.
pub fn ensure_precision(field: &RealField, target: RealType) -> RealField {
    field.cast(target)
}

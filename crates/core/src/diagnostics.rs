//! Derived diagnostics of the Hasegawa–Wakatani state.
//!
//! Every function is generic over the field precision and returns its result
//! in that same precision; nothing here widens to `f64` internally.

use serde::Serialize;

use crate::field::Field2D;
use crate::precision::{Real, RealType};

/// Differentiation direction. `Y` runs along rows (axis 0), `X` along columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Second-order central difference with periodic wrap.
pub fn periodic_gradient<T: Real>(field: &Field2D<T>, dx: T, axis: Axis) -> Field2D<T> {
    let grid = field.grid();
    let (nx, ny) = (grid.nx, grid.ny);
    let inv_2dx = T::one() / (dx + dx);
    Field2D::from_fn(grid, |ix, iy| {
        let (plus, minus) = match axis {
            Axis::X => (
                field.get((ix + 1) % nx, iy),
                field.get((ix + nx - 1) % nx, iy),
            ),
            Axis::Y => (
                field.get(ix, (iy + 1) % ny),
                field.get(ix, (iy + ny - 1) % ny),
            ),
        };
        (plus - minus) * inv_2dx
    })
}

/// `0.5 · mean(n² + |∇φ|²)`.
pub fn energy<T: Real>(n: &Field2D<T>, phi: &Field2D<T>, dx: T) -> T {
    assert_eq!(n.grid(), phi.grid(), "fields must share a grid");
    let grad_x = periodic_gradient(phi, dx, Axis::X);
    let grad_y = periodic_gradient(phi, dx, Axis::Y);
    let total = n
        .as_slice()
        .iter()
        .zip(grad_x.as_slice())
        .zip(grad_y.as_slice())
        .fold(T::zero(), |acc, ((&n, &gx), &gy)| acc + n * n + gx * gx + gy * gy);
    half_mean(total, n.len())
}

/// `0.5 · mean((n − ω)²)`.
pub fn enstrophy<T: Real>(n: &Field2D<T>, omega: &Field2D<T>) -> T {
    assert_eq!(n.grid(), omega.grid(), "fields must share a grid");
    let total = n
        .as_slice()
        .iter()
        .zip(omega.as_slice())
        .fold(T::zero(), |acc, (&n, &w)| {
            let diff = n - w;
            acc + diff * diff
        });
    half_mean(total, n.len())
}

/// Radial particle flux `Γn = −mean(n · ∂φ/∂y)`.
pub fn gamma_n<T: Real>(n: &Field2D<T>, phi: &Field2D<T>, dx: T) -> T {
    assert_eq!(n.grid(), phi.grid(), "fields must share a grid");
    let dy_phi = periodic_gradient(phi, dx, Axis::Y);
    let total = n
        .as_slice()
        .iter()
        .zip(dy_phi.as_slice())
        .fold(T::zero(), |acc, (&n, &d)| acc + n * d);
    -mean_of(total, n.len())
}

fn mean_of<T: Real>(total: T, len: usize) -> T {
    if len == 0 {
        return T::zero();
    }
    total / T::from_usize(len).unwrap_or_else(T::one)
}

fn half_mean<T: Real>(total: T, len: usize) -> T {
    mean_of(total, len) / (T::one() + T::one())
}

/// Diagnostics of one state, computed in `precision` and reported widened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    pub precision: RealType,
    pub energy: f64,
    pub enstrophy: f64,
    pub gamma_n: f64,
}

impl Diagnostics {
    pub fn compute<T: Real>(
        n: &Field2D<T>,
        omega: &Field2D<T>,
        phi: &Field2D<T>,
        dx: T,
    ) -> Self {
        Self {
            precision: T::REAL_TYPE,
            energy: energy(n, phi, dx).widen(),
            enstrophy: enstrophy(n, omega).widen(),
            gamma_n: gamma_n(n, phi, dx).widen(),
        }
    }
}

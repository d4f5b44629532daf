//! Spectral Poisson solvers and the registry that binds one to a precision.
//!
//! Solves ∇²φ = ω on a periodic grid:
//!
//! φ̂(k) = ω̂(k) · dx² / (−(2π)² |k|²),   k = fftfreq(n) in cycles per sample
//!
//! The k = 0 mode is set to zero instead of divided, which fixes the gauge:
//! φ always has zero mean, whatever the mean of ω.
//!
//! Two solvers exist, one per precision pair. Each transforms in the complex
//! type matching its real type and returns its result in that real type.

use std::fmt;

use num_complex::Complex;

use crate::fft::{fftfreq, forward_fft_2d, inverse_fft_2d};
use crate::field::{Field2D, RealField};
use crate::grid::Grid2D;
use crate::precision::{ComplexType, PrecisionError, PrecisionPolicy, Real, RealType};

pub const FOURIER_POISSON_DOUBLE: &str = "fourier_poisson_double";
pub const FOURIER_POISSON_SINGLE: &str = "fourier_poisson_single";

// ============================================================================
// Kernels
// ============================================================================

/// Double-precision solve: `f64` in, `Complex64` spectrum, `f64` out.
pub fn fourier_poisson_double(omega: &Field2D<f64>, dx: f64) -> Field2D<f64> {
    fourier_poisson(omega, dx)
}

/// Single-precision solve: `f32` in, `Complex32` spectrum, `f32` out.
pub fn fourier_poisson_single(omega: &Field2D<f32>, dx: f32) -> Field2D<f32> {
    fourier_poisson(omega, dx)
}

fn fourier_poisson<T: Real>(omega: &Field2D<T>, dx: T) -> Field2D<T> {
    let grid = omega.grid();
    let mut spectrum = to_spectrum(omega);
    forward_fft_2d(grid, &mut spectrum);

    let kernel = laplace_kernel::<T>(grid);
    for (value, &k2) in spectrum.iter_mut().zip(&kernel) {
        *value = if k2 == T::zero() {
            Complex::new(T::zero(), T::zero())
        } else {
            *value / k2
        };
    }

    inverse_fft_2d(grid, &mut spectrum);
    let dx2 = dx * dx;
    Field2D::from_vec(grid, spectrum.iter().map(|c| c.re * dx2).collect())
}

/// Spectral Laplacian, the inverse of the Poisson solve up to the k = 0 mode.
pub fn fourier_laplace<T: Real>(field: &Field2D<T>, dx: T) -> Field2D<T> {
    let grid = field.grid();
    let mut spectrum = to_spectrum(field);
    forward_fft_2d(grid, &mut spectrum);

    let kernel = laplace_kernel::<T>(grid);
    for (value, &k2) in spectrum.iter_mut().zip(&kernel) {
        *value = value.scale(k2);
    }

    inverse_fft_2d(grid, &mut spectrum);
    let inv_dx2 = T::one() / (dx * dx);
    Field2D::from_vec(grid, spectrum.iter().map(|c| c.re * inv_dx2).collect())
}

/// `−(2π)² (kx² + ky²)` on the row-major grid, in cycles per sample.
pub(crate) fn laplace_kernel<T: Real>(grid: Grid2D) -> Vec<T> {
    let kx = fftfreq::<T>(grid.nx);
    let ky = fftfreq::<T>(grid.ny);
    let two_pi = T::PI() + T::PI();
    let factor = -(two_pi * two_pi);
    let mut values = Vec::with_capacity(grid.len());
    for &ky_val in &ky {
        for &kx_val in &kx {
            values.push(factor * (kx_val * kx_val + ky_val * ky_val));
        }
    }
    values
}

fn to_spectrum<T: Real>(field: &Field2D<T>) -> Vec<Complex<T>> {
    field
        .as_slice()
        .iter()
        .map(|&v| Complex::new(v, T::zero()))
        .collect()
}

// ============================================================================
// Solver handle
// ============================================================================

/// Handle to one of the registered Poisson solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoissonSolver {
    FourierDouble,
    FourierSingle,
}

impl PoissonSolver {
    /// Stable identifier of the kernel behind this handle.
    pub fn name(self) -> &'static str {
        match self {
            PoissonSolver::FourierDouble => FOURIER_POISSON_DOUBLE,
            PoissonSolver::FourierSingle => FOURIER_POISSON_SINGLE,
        }
    }

    pub fn real_type(self) -> RealType {
        match self {
            PoissonSolver::FourierDouble => RealType::F64,
            PoissonSolver::FourierSingle => RealType::F32,
        }
    }

    pub fn complex_type(self) -> ComplexType {
        match self {
            PoissonSolver::FourierDouble => ComplexType::Complex64,
            PoissonSolver::FourierSingle => ComplexType::Complex32,
        }
    }

    /// Run the kernel on `omega`, which must already be in [`Self::real_type`].
    ///
    /// The solver never converts its input; a field in the wrong precision is
    /// a caller defect and comes back as [`PrecisionError::SolverInputMismatch`].
    pub fn solve(self, omega: &RealField, dx: f64) -> Result<RealField, PrecisionError> {
        match (self, omega) {
            (PoissonSolver::FourierDouble, RealField::F64(field)) => {
                Ok(fourier_poisson_double(field, dx).into())
            }
            (PoissonSolver::FourierSingle, RealField::F32(field)) => {
                Ok(fourier_poisson_single(field, dx as f32).into())
            }
            (solver, field) => Err(PrecisionError::SolverInputMismatch {
                solver: solver.name(),
                expected: solver.real_type(),
                found: field.real_type(),
            }),
        }
    }
}

impl fmt::Display for PoissonSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The set of available solvers, looked up by exact `(real, complex)` pair.
#[derive(Debug, Clone)]
pub struct PoissonSolverRegistry {
    solvers: Vec<PoissonSolver>,
}

impl Default for PoissonSolverRegistry {
    fn default() -> Self {
        Self {
            solvers: vec![PoissonSolver::FourierDouble, PoissonSolver::FourierSingle],
        }
    }
}

impl PoissonSolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solvers(&self) -> &[PoissonSolver] {
        &self.solvers
    }

    /// Find the solver registered for exactly `(real, complex)`.
    pub fn bind(&self, real: RealType, complex: ComplexType) -> Result<PoissonSolver, PrecisionError> {
        self.solvers
            .iter()
            .copied()
            .find(|solver| solver.real_type() == real && solver.complex_type() == complex)
            .ok_or(PrecisionError::UnboundSolver { real, complex })
    }

    pub fn bind_policy(&self, policy: &PrecisionPolicy) -> Result<PoissonSolver, PrecisionError> {
        self.bind(policy.float_type(), policy.complex_type())
    }
}

//! Hasegawa–Wakatani model: the precision-bound field-solve surface.
//!
//! An [`HW`] instance resolves its precision label once, binds the matching
//! Poisson solver, and from then on returns every field in its configured
//! real type, whatever precision the caller hands in. Time stepping and the
//! physical right-hand side live with the caller; they reach the core through
//! [`HW::get_phi`] and [`HW::ensure_precision`].

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::HwConfig;
use crate::diagnostics::Diagnostics;
use crate::field::{ensure_precision, RealField};
use crate::grid::Grid2D;
use crate::metrics::{MetricsEvent, MetricsRecorder};
use crate::poisson::{PoissonSolver, PoissonSolverRegistry};
use crate::precision::{
    ComplexType, Precision, PrecisionError, PrecisionPolicy, Real, RealType,
};

#[derive(Debug)]
pub struct HW {
    dx: f64,
    n: u32,
    c1: f64,
    nu: f64,
    k0: f64,
    debug: bool,
    policy: PrecisionPolicy,
    poisson_solver: PoissonSolver,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl HW {
    /// Build a model, failing fast on an unknown precision label.
    pub fn new(config: &HwConfig) -> Result<Self, ModelError> {
        let policy = PrecisionPolicy::resolve(&config.precision)?;
        let poisson_solver = PoissonSolverRegistry::default().bind_policy(&policy)?;

        if config.debug {
            info!(
                "[hw] precision={} float_type={} complex_type={} poisson_solver={}",
                policy.label(),
                policy.float_type(),
                policy.complex_type(),
                poisson_solver.name()
            );
        }

        Ok(Self {
            dx: config.dx,
            n: config.n,
            c1: config.c1,
            nu: config.nu,
            k0: config.k0,
            debug: config.debug,
            policy,
            poisson_solver,
            metrics: None,
        })
    }

    /// Attach a metrics sink; records the resolved precision immediately.
    pub fn with_metrics(mut self, recorder: Arc<MetricsRecorder>) -> Self {
        recorder.emit(MetricsEvent::ModelConstructed {
            precision: self.policy.precision(),
            float_type: self.policy.float_type(),
            complex_type: self.policy.complex_type(),
            solver: self.poisson_solver.name(),
        });
        self.metrics = Some(recorder);
        self
    }

    pub fn precision(&self) -> Precision {
        self.policy.precision()
    }

    pub fn policy(&self) -> &PrecisionPolicy {
        &self.policy
    }

    pub fn float_type(&self) -> RealType {
        self.policy.float_type()
    }

    pub fn complex_type(&self) -> ComplexType {
        self.policy.complex_type()
    }

    pub fn poisson_solver(&self) -> PoissonSolver {
        self.poisson_solver
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Hyperdiffusion order.
    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn c1(&self) -> f64 {
        self.c1
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }

    pub fn k0(&self) -> f64 {
        self.k0
    }

    /// Copy `field` into this model's real type. The input is left untouched.
    pub fn ensure_precision(&self, field: &RealField) -> RealField {
        let target = self.float_type();
        if self.debug && field.real_type().bits() > target.bits() {
            debug!("[hw] narrowing {} field to {}", field.real_type(), target);
        }
        ensure_precision(field, target)
    }

    /// Solve ∇²φ = ω with the bound solver.
    ///
    /// `omega` may be in either precision; `phi` has the same shape and is
    /// always in [`Self::float_type`]. Rejects empty or non-square grids, and
    /// any `dx` whose value or square is not finite and positive once
    /// narrowed to the model's real type.
    pub fn get_phi(&self, omega: &RealField, dx: f64) -> Result<RealField, ModelError> {
        validate_grid(omega.grid())?;
        validate_dx(dx, self.float_type())?;

        let start = Instant::now();
        let coerced = self.ensure_precision(omega);
        let phi = self.poisson_solver.solve(&coerced, dx)?;

        if self.debug {
            if phi.real_type() != self.float_type() {
                return Err(ModelError::PrecisionDrift {
                    expected: self.float_type(),
                    found: phi.real_type(),
                });
            }
            let (rows, cols) = phi.shape();
            debug!(
                "[hw] get_phi {rows}x{cols}: {} -> {} via {}",
                omega.real_type(),
                phi.real_type(),
                self.poisson_solver
            );
        }

        if let Some(metrics) = &self.metrics {
            let grid = phi.grid();
            metrics.emit(MetricsEvent::PhiSolve {
                grid_nx: grid.nx,
                grid_ny: grid.ny,
                input_type: omega.real_type(),
                output_type: phi.real_type(),
                solver: self.poisson_solver.name(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            });
        }

        Ok(phi)
    }

    /// [`Self::get_phi`] over many fields in parallel. Fails on the first error.
    pub fn get_phi_batch(&self, omegas: &[RealField], dx: f64) -> Result<Vec<RealField>, ModelError> {
        omegas
            .par_iter()
            .map(|omega| self.get_phi(omega, dx))
            .collect()
    }

    /// Energy, enstrophy and particle flux of `(n, omega, phi)`, computed in
    /// this model's precision. Pass the same `dx` that produced `phi`.
    pub fn diagnostics(
        &self,
        n: &RealField,
        omega: &RealField,
        phi: &RealField,
        dx: f64,
    ) -> Result<Diagnostics, ModelError> {
        let grid = n.grid();
        validate_grid(grid)?;
        validate_dx(dx, self.float_type())?;
        for other in [omega.grid(), phi.grid()] {
            if other != grid {
                return Err(ModelError::ShapeMismatch {
                    expected: grid.shape(),
                    found: other.shape(),
                });
            }
        }
        match self.policy.precision() {
            Precision::Double => self.diagnostics_in::<f64>(n, omega, phi, dx),
            Precision::Single => self.diagnostics_in::<f32>(n, omega, phi, dx),
        }
    }

    fn diagnostics_in<T: Real>(
        &self,
        n: &RealField,
        omega: &RealField,
        phi: &RealField,
        dx: f64,
    ) -> Result<Diagnostics, ModelError> {
        let n = self.ensure_precision(n);
        let omega = self.ensure_precision(omega);
        let phi = self.ensure_precision(phi);
        let (Some(n), Some(omega), Some(phi)) = (
            n.downcast_ref::<T>(),
            omega.downcast_ref::<T>(),
            phi.downcast_ref::<T>(),
        ) else {
            return Err(ModelError::PrecisionDrift {
                expected: T::REAL_TYPE,
                found: self.float_type(),
            });
        };
        Ok(Diagnostics::compute(
            n,
            omega,
            phi,
            T::from_f64_lossy(dx),
        ))
    }
}

fn validate_grid(grid: Grid2D) -> Result<(), ModelError> {
    if grid.is_empty() {
        return Err(ModelError::EmptyGrid);
    }
    if !grid.is_square() {
        let (rows, cols) = grid.shape();
        return Err(ModelError::NonSquareGrid { rows, cols });
    }
    Ok(())
}

/// `dx` is checked after narrowing to `real_type`: an `f64` spacing can
/// overflow `f32`, and a tiny one squares to zero in the solver's `dx²`.
fn validate_dx(dx: f64, real_type: RealType) -> Result<(), ModelError> {
    let usable = match real_type {
        RealType::F64 => spacing_is_usable(dx),
        RealType::F32 => spacing_is_usable(f32::from_f64_lossy(dx)),
    };
    if usable {
        Ok(())
    } else {
        Err(ModelError::InvalidGridSpacing(dx))
    }
}

fn spacing_is_usable<T: Real>(dx: T) -> bool {
    let dx2 = dx * dx;
    dx.is_finite() && dx > T::zero() && dx2.is_finite() && dx2 > T::zero()
}

// ============================================================================
// Errors
// ============================================================================

/// Model construction and field-solve errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Precision(#[from] PrecisionError),

    #[error("grid spacing must be positive and finite in the model precision, got {0}")]
    InvalidGridSpacing(f64),

    #[error("expected a square grid, got {rows}x{cols}")]
    NonSquareGrid { rows: usize, cols: usize },

    #[error("field has no grid points")]
    EmptyGrid,

    #[error("field shape {found:?} does not match {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("precision drift: expected {expected}, found {found}")]
    PrecisionDrift { expected: RealType, found: RealType },
}

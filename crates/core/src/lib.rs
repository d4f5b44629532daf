//! Precision-configurable spectral core for a Hasegawa–Wakatani 2D model.

pub mod config;
pub mod diagnostics;
pub mod fft;
pub mod field;
pub mod grid;
pub mod metrics;
pub mod model;
pub mod poisson;
pub mod precision;

pub use config::{ConfigError, HwConfig};
pub use field::{ensure_precision, Field2D, RealField};
pub use grid::Grid2D;
pub use model::{ModelError, HW};
pub use poisson::{PoissonSolver, PoissonSolverRegistry};
pub use precision::{ComplexType, Precision, PrecisionError, PrecisionPolicy, Real, RealType};

#[cfg(test)]
mod _tests_model;

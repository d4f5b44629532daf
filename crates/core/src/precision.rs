//! Precision selection for the spectral pipeline.
//!
//! A model runs entirely in one of two precisions:
//! - **double**: `f64` fields, `Complex64` (= `Complex<f64>`) spectra
//! - **single**: `f32` fields, `Complex32` (= `Complex<f32>`) spectra
//!
//! The real and complex types always share a component width. On the runtime
//! side this is a closed [`Precision`] enum whose type pair is a pure `match`;
//! on the generic side the sealed [`Real`] trait pairs `T` with `Complex<T>`,
//! so a mixed-width pair cannot be written down.

use std::fmt;
use std::str::FromStr;

use num_traits::{Float, FloatConst, FromPrimitive, NumAssign};
use rustfft::FftNum;
use serde::{Deserialize, Serialize};

use crate::field::{Field2D, RealField};

/// Labels accepted by [`PrecisionPolicy::resolve`], in display order.
pub const ACCEPTED_LABELS: [&str; 2] = ["double", "single"];

// ============================================================================
// Labels and type tags
// ============================================================================

/// User-facing precision label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Double,
    Single,
}

impl Precision {
    pub fn label(self) -> &'static str {
        match self {
            Precision::Double => "double",
            Precision::Single => "single",
        }
    }

    pub fn real_type(self) -> RealType {
        match self {
            Precision::Double => RealType::F64,
            Precision::Single => RealType::F32,
        }
    }

    pub fn complex_type(self) -> ComplexType {
        match self {
            Precision::Double => ComplexType::Complex64,
            Precision::Single => ComplexType::Complex32,
        }
    }
}

impl FromStr for Precision {
    type Err = PrecisionError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "double" => Ok(Precision::Double),
            "single" => Ok(Precision::Single),
            other => Err(PrecisionError::InvalidPrecision {
                label: other.to_string(),
                accepted: ACCEPTED_LABELS.join(", "),
            }),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Element type of a real field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealType {
    F32,
    F64,
}

impl RealType {
    pub fn bits(self) -> u32 {
        match self {
            RealType::F32 => 32,
            RealType::F64 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RealType::F32 => "f32",
            RealType::F64 => "f64",
        }
    }

    /// The complex type whose components have this width.
    pub fn complex(self) -> ComplexType {
        match self {
            RealType::F32 => ComplexType::Complex32,
            RealType::F64 => ComplexType::Complex64,
        }
    }
}

impl fmt::Display for RealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Working type of a spectrum, named after the `num_complex` aliases
/// (`Complex64` has `f64` components).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexType {
    Complex32,
    Complex64,
}

impl ComplexType {
    /// Width of each of the real and imaginary components.
    pub fn component_bits(self) -> u32 {
        self.real().bits()
    }

    pub fn name(self) -> &'static str {
        match self {
            ComplexType::Complex32 => "Complex32",
            ComplexType::Complex64 => "Complex64",
        }
    }

    pub fn real(self) -> RealType {
        match self {
            ComplexType::Complex32 => RealType::F32,
            ComplexType::Complex64 => RealType::F64,
        }
    }
}

impl fmt::Display for ComplexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Resolved precision of one model instance.
///
/// Built once from the configured label and never mutated afterwards. There
/// is no process-wide default; each model owns its policy, so models of
/// different precision can run side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionPolicy {
    precision: Precision,
    float_type: RealType,
    complex_type: ComplexType,
}

impl PrecisionPolicy {
    /// Validate `label` and resolve its `(real, complex)` type pair.
    ///
    /// Labels are case-sensitive; anything outside [`ACCEPTED_LABELS`] is
    /// rejected with [`PrecisionError::InvalidPrecision`].
    pub fn resolve(label: &str) -> Result<Self, PrecisionError> {
        let precision: Precision = label.parse()?;
        Ok(Self::from_precision(precision))
    }

    pub fn from_precision(precision: Precision) -> Self {
        Self {
            precision,
            float_type: precision.real_type(),
            complex_type: precision.complex_type(),
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn label(&self) -> &'static str {
        self.precision.label()
    }

    pub fn float_type(&self) -> RealType {
        self.float_type
    }

    pub fn complex_type(&self) -> ComplexType {
        self.complex_type
    }

    /// `(float_type, complex_type)` as a pair.
    pub fn types(&self) -> (RealType, ComplexType) {
        (self.float_type, self.complex_type)
    }
}

// ============================================================================
// Generic scalar
// ============================================================================

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Real scalar a field can be stored in. Implemented for `f32` and `f64` only.
///
/// The matching spectral type is always `Complex<Self>`, which is what keeps
/// the generic solver path from ever pairing mismatched widths.
pub trait Real:
    sealed::Sealed
    + FftNum
    + Float
    + FloatConst
    + FromPrimitive
    + NumAssign
    + Default
    + fmt::Display
{
    const REAL_TYPE: RealType;
    const COMPLEX_TYPE: ComplexType;

    /// Convert from `f64`, rounding to nearest when narrowing.
    fn from_f64_lossy(value: f64) -> Self;

    /// Widen to `f64`. Exact for both implementors.
    fn widen(self) -> f64;

    /// Borrow the typed field if `field` is stored in this precision.
    fn field_ref(field: &RealField) -> Option<&Field2D<Self>>;
}

impl Real for f32 {
    const REAL_TYPE: RealType = RealType::F32;
    const COMPLEX_TYPE: ComplexType = ComplexType::Complex32;

    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn widen(self) -> f64 {
        self as f64
    }

    fn field_ref(field: &RealField) -> Option<&Field2D<Self>> {
        match field {
            RealField::F32(inner) => Some(inner),
            RealField::F64(_) => None,
        }
    }
}

impl Real for f64 {
    const REAL_TYPE: RealType = RealType::F64;
    const COMPLEX_TYPE: ComplexType = ComplexType::Complex64;

    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    #[inline]
    fn widen(self) -> f64 {
        self
    }

    fn field_ref(field: &RealField) -> Option<&Field2D<Self>> {
        match field {
            RealField::F64(inner) => Some(inner),
            RealField::F32(_) => None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Precision resolution and solver binding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrecisionError {
    #[error("invalid precision '{label}': expected one of [{accepted}]")]
    InvalidPrecision { label: String, accepted: String },

    #[error("no Poisson solver registered for ({real}, {complex})")]
    UnboundSolver { real: RealType, complex: ComplexType },

    #[error("solver {solver} works in {expected} but was handed a {found} field")]
    SolverInputMismatch {
        solver: &'static str,
        expected: RealType,
        found: RealType,
    },
}

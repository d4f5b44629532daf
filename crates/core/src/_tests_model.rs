#![cfg(test)]

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use super::config::HwConfig;
use super::field::{Field2D, RealField};
use super::grid::Grid2D;
use super::metrics::MetricsRecorder;
use super::model::{ModelError, HW};
use super::poisson::{FOURIER_POISSON_DOUBLE, FOURIER_POISSON_SINGLE};
use super::precision::{ComplexType, Precision, PrecisionError, RealType};

fn model(label: &str) -> HW {
    HW::new(&HwConfig::default().with_precision(label).with_debug(true)).expect("valid model")
}

fn random_omega(n: usize, seed: u64) -> Field2D<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Field2D::from_fn(Grid2D::square(n), |_, _| StandardNormal.sample(&mut rng))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn double_model_resolves_double_pipeline() {
    let hw = model("double");
    assert_eq!(hw.precision(), Precision::Double);
    assert_eq!(hw.float_type(), RealType::F64);
    assert_eq!(hw.complex_type(), ComplexType::Complex64);
    assert_eq!(hw.poisson_solver().name(), FOURIER_POISSON_DOUBLE);
}

#[test]
fn single_model_resolves_single_pipeline() {
    let hw = model("single");
    assert_eq!(hw.precision(), Precision::Single);
    assert_eq!(hw.float_type(), RealType::F32);
    assert_eq!(hw.complex_type(), ComplexType::Complex32);
    assert_eq!(hw.poisson_solver().name(), FOURIER_POISSON_SINGLE);
}

#[test]
fn policy_matches_the_model_surface() {
    for label in ["double", "single"] {
        let hw = model(label);
        let policy = hw.policy();
        assert_eq!(policy.label(), label);
        assert_eq!(policy.precision(), hw.precision());
        assert_eq!(policy.types(), (hw.float_type(), hw.complex_type()));
        assert_eq!(hw.poisson_solver().real_type(), policy.float_type());
    }
}

#[test]
fn solver_identity_is_stable_across_constructions() {
    for _ in 0..3 {
        assert_eq!(model("double").poisson_solver().name(), FOURIER_POISSON_DOUBLE);
        assert_eq!(model("single").poisson_solver().name(), FOURIER_POISSON_SINGLE);
    }
}

#[test]
fn invalid_precision_fails_construction() {
    let err = HW::new(&HwConfig::default().with_precision("invalid")).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Precision(PrecisionError::InvalidPrecision { .. })
    ));
    assert!(err.to_string().contains("invalid"));
}

#[test]
fn physical_parameters_are_carried_through() {
    let config = HwConfig {
        dx: 0.2,
        n: 2,
        c1: 0.7,
        nu: 1e-4,
        k0: 0.3,
        ..HwConfig::default()
    };
    let hw = HW::new(&config).unwrap();
    assert_eq!(hw.dx(), 0.2);
    assert_eq!(hw.n(), 2);
    assert_eq!(hw.c1(), 0.7);
    assert_eq!(hw.nu(), 1e-4);
    assert_eq!(hw.k0(), 0.3);
    assert!(!hw.debug());
}

// ============================================================================
// get_phi
// ============================================================================

#[test]
fn get_phi_output_matches_model_precision_for_any_input() {
    let omega64 = random_omega(16, 21);
    let omega32: Field2D<f32> = omega64.cast();
    for label in ["double", "single"] {
        let hw = model(label);
        for omega in [RealField::from(omega64.clone()), RealField::from(omega32.clone())] {
            let phi = hw.get_phi(&omega, 0.1).unwrap();
            assert_eq!(phi.real_type(), hw.float_type(), "{label} from {}", omega.real_type());
            assert_eq!(phi.shape(), omega.shape());
        }
    }
}

#[test]
fn get_phi_does_not_mutate_caller_input() {
    let omega = RealField::from(random_omega(8, 4));
    let snapshot = omega.clone();
    let _ = model("single").get_phi(&omega, 0.1).unwrap();
    assert_eq!(omega, snapshot);
}

#[test]
fn get_phi_rejects_non_square_grids() {
    let omega = RealField::from(Field2D::<f64>::zeros(Grid2D::new(8, 4)));
    let err = model("double").get_phi(&omega, 0.1).unwrap_err();
    assert!(matches!(err, ModelError::NonSquareGrid { rows: 4, cols: 8 }));
}

#[test]
fn get_phi_rejects_empty_fields() {
    let omega = RealField::from(Field2D::<f32>::zeros(Grid2D::square(0)));
    let err = model("single").get_phi(&omega, 0.1).unwrap_err();
    assert!(matches!(err, ModelError::EmptyGrid));
}

#[test]
fn get_phi_rejects_invalid_grid_spacing() {
    let hw = model("double");
    let omega = RealField::from(random_omega(4, 9));
    for dx in [0.0, -0.1, f64::NAN, f64::INFINITY] {
        let err = hw.get_phi(&omega, dx).unwrap_err();
        assert!(matches!(err, ModelError::InvalidGridSpacing(_)), "dx={dx}");
    }
}

#[test]
fn single_model_rejects_spacing_that_overflows_f32() {
    let omega = RealField::from(random_omega(8, 9));
    let err = model("single").get_phi(&omega, 1e39).unwrap_err();
    assert!(matches!(err, ModelError::InvalidGridSpacing(dx) if dx == 1e39));

    let phi = model("double").get_phi(&omega, 1e39).unwrap();
    assert!(phi.to_f64_vec().iter().all(|v| v.is_finite()));
}

#[test]
fn single_model_rejects_spacing_whose_square_underflows() {
    let omega = RealField::from(random_omega(8, 9));
    let err = model("single").get_phi(&omega, 1e-30).unwrap_err();
    assert!(matches!(err, ModelError::InvalidGridSpacing(_)));

    let phi = model("double").get_phi(&omega, 1e-30).unwrap();
    assert!(phi.to_f64_vec().iter().any(|&v| v != 0.0));
}

#[test]
fn double_model_rejects_spacing_whose_square_overflows() {
    let omega = RealField::from(random_omega(4, 3));
    let err = model("double").get_phi(&omega, 1e200).unwrap_err();
    assert!(matches!(err, ModelError::InvalidGridSpacing(_)));
}

#[test]
fn debug_mode_does_not_change_results() {
    let omega = RealField::from(random_omega(16, 8));
    let quiet = HW::new(&HwConfig::default().with_precision("single")).unwrap();
    let loud = model("single");
    assert_eq!(
        quiet.get_phi(&omega, 0.1).unwrap(),
        loud.get_phi(&omega, 0.1).unwrap()
    );
}

#[test]
fn ensure_precision_uses_model_type_and_is_idempotent() {
    let field = RealField::from(random_omega(10, 6));
    for label in ["double", "single"] {
        let hw = model(label);
        let once = hw.ensure_precision(&field);
        let twice = hw.ensure_precision(&once);
        assert_eq!(once.real_type(), hw.float_type());
        assert_eq!(once, twice);
    }
}

#[test]
fn models_of_different_precision_coexist() {
    let double = model("double");
    let single = model("single");
    let omega = RealField::from(random_omega(8, 12));
    let a = double.get_phi(&omega, 0.1).unwrap();
    let b = single.get_phi(&omega, 0.1).unwrap();
    let c = double.get_phi(&omega, 0.1).unwrap();
    assert_eq!(a.real_type(), RealType::F64);
    assert_eq!(b.real_type(), RealType::F32);
    assert_eq!(a, c);
}

#[test]
fn batch_solve_matches_sequential_solves() {
    let hw = model("single");
    let omegas: Vec<RealField> = (0..6).map(|seed| random_omega(16, seed).into()).collect();
    let batch = hw.get_phi_batch(&omegas, 0.1).unwrap();
    assert_eq!(batch.len(), omegas.len());
    for (phi, omega) in batch.iter().zip(&omegas) {
        assert_eq!(phi, &hw.get_phi(omega, 0.1).unwrap());
    }
}

#[test]
fn batch_solve_reports_first_invalid_field() {
    let hw = model("double");
    let omegas = vec![
        RealField::from(random_omega(8, 1)),
        RealField::from(Field2D::<f64>::zeros(Grid2D::new(3, 2))),
    ];
    assert!(matches!(
        hw.get_phi_batch(&omegas, 0.1),
        Err(ModelError::NonSquareGrid { .. })
    ));
}

#[test]
fn model_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HW>();
}

// ============================================================================
// Diagnostics and metrics
// ============================================================================

#[test]
fn diagnostics_are_computed_in_model_precision() {
    let omega = RealField::from(random_omega(16, 2));
    let n = RealField::from(random_omega(16, 3));
    for label in ["double", "single"] {
        let hw = model(label);
        let phi = hw.get_phi(&omega, hw.dx()).unwrap();
        let diagnostics = hw.diagnostics(&n, &omega, &phi, hw.dx()).unwrap();
        assert_eq!(diagnostics.precision, hw.float_type());
        assert!(diagnostics.energy > 0.0);
        assert!(diagnostics.enstrophy > 0.0);
        assert!(diagnostics.gamma_n.is_finite());
    }
}

#[test]
fn diagnostics_use_the_spacing_they_are_given() {
    let hw = model("double");
    let omega = RealField::from(random_omega(16, 2));
    let n = RealField::from(random_omega(16, 3));
    let coarse = hw.get_phi(&omega, 0.4).unwrap();
    let at_solve_dx = hw.diagnostics(&n, &omega, &coarse, 0.4).unwrap();
    let at_model_dx = hw.diagnostics(&n, &omega, &coarse, hw.dx()).unwrap();
    assert_ne!(at_solve_dx.energy, at_model_dx.energy);
    assert_eq!(at_solve_dx.enstrophy, at_model_dx.enstrophy);

    let err = hw.diagnostics(&n, &omega, &coarse, 0.0).unwrap_err();
    assert!(matches!(err, ModelError::InvalidGridSpacing(_)));
}

#[test]
fn diagnostics_reject_mismatched_shapes() {
    let hw = model("double");
    let a = RealField::from(random_omega(8, 1));
    let b = RealField::from(random_omega(4, 1));
    let err = hw.diagnostics(&a, &a, &b, 0.1).unwrap_err();
    assert!(matches!(
        err,
        ModelError::ShapeMismatch {
            expected: (8, 8),
            found: (4, 4)
        }
    ));
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn metrics_record_construction_and_each_solve() {
    let sink = SharedBuffer::default();
    let recorder = Arc::new(MetricsRecorder::from_writer(Box::new(sink.clone())));
    let hw = model("single").with_metrics(recorder);
    let omega = RealField::from(random_omega(8, 0));
    hw.get_phi(&omega, 0.1).unwrap();
    hw.get_phi(&omega, 0.1).unwrap();

    let text = String::from_utf8(sink.0.lock().clone()).unwrap();
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["event"], "model_constructed");
    assert_eq!(events[0]["solver"], FOURIER_POISSON_SINGLE);
    assert_eq!(events[1]["event"], "phi_solve");
    assert_eq!(events[1]["input_type"], "f64");
    assert_eq!(events[1]["output_type"], "f32");
}

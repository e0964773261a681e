mod common;

use proptest::prelude::*;
use serde_json::json;
use tfp_core::errors::TfError;
use tfp_core::RedshiftSchedule;
use tfp_pipeline::{
    build_schedule, corrected_amplitude, derive_parameters, normalize_amplitude,
    NormalizationPolicy,
};
use tfp_solver::{SolverAdapter, TransferTable};

use common::{fiducial_record, record_with, BrokenSolver, FixedSolver, PowerLawSolver};

fn table(redshifts: usize) -> TransferTable {
    TransferTable::from_fn([2, 3, redshifts], |q, k, z| (q + k + z) as f64)
}

#[test]
fn one_pass_rescales_by_squared_ratio() {
    let config = derive_parameters(&fiducial_record()).expect("derive");
    let schedule = build_schedule(100.0).expect("schedule");
    let sigma8 = vec![0.02, 0.03, 0.1, 0.2, 0.5, 0.9];
    let solver = FixedSolver::new(sigma8, table(schedule.len()));
    let adapter = SolverAdapter::new(&solver);
    let outcome =
        normalize_amplitude(&config, &schedule, &adapter, &NormalizationPolicy::default())
            .expect("normalize");

    let expected = 2.1e-9 * ((0.8 / 0.9) * (0.8 / 0.9));
    assert_eq!(outcome.config.inputs().a_s, expected);
    assert_eq!(outcome.request.a_s, expected);
    assert_eq!(outcome.trial_sigma8, 0.9);
    assert_eq!(outcome.trial_amplitude, 2.1e-9);
    assert_eq!(outcome.passes, 1);
    assert_eq!(*solver.amplitude_calls.borrow(), vec![2.1e-9, expected]);
    assert!(solver.transfer_calls.borrow().is_empty());
    assert_eq!(
        outcome.config.record().require_f64("As").expect("As in record"),
        expected
    );
}

#[test]
fn linear_scaling_is_matched_in_one_pass() {
    let config = derive_parameters(&fiducial_record()).expect("derive");
    let schedule = build_schedule(100.0).expect("schedule");
    let solver = PowerLawSolver::linear(vec![0.01, 0.02, 0.1, 0.2, 0.6, 1.0], 2.1e-9);
    let outcome = normalize_amplitude(
        &config,
        &schedule,
        &SolverAdapter::new(&solver),
        &NormalizationPolicy::default(),
    )
    .expect("normalize");
    assert!(outcome.residual().abs() < 1e-12);
    assert_eq!(outcome.sigma8.len(), schedule.len());
}

#[test]
fn extra_passes_converge_on_nonlinear_response() {
    let config = derive_parameters(&fiducial_record()).expect("derive");
    let schedule = build_schedule(100.0).expect("schedule");
    let mut solver = PowerLawSolver::linear(vec![0.01, 0.02, 0.1, 0.2, 0.6, 1.2], 2.1e-9);
    solver.exponent = 0.6;
    let adapter = SolverAdapter::new(&solver);

    let single = normalize_amplitude(&config, &schedule, &adapter, &NormalizationPolicy::default())
        .expect("single");
    let policy = NormalizationPolicy {
        max_passes: 20,
        tolerance: 1e-10,
    };
    let iterated = normalize_amplitude(&config, &schedule, &adapter, &policy).expect("iterated");
    assert!(single.residual().abs() > 1e-4);
    assert!((iterated.residual() / iterated.target_sigma8).abs() <= 1e-10);
    assert!(iterated.passes > 1 && iterated.passes < 20);
}

#[test]
fn zero_passes_are_sanitised_to_one() {
    let policy = NormalizationPolicy {
        max_passes: 0,
        tolerance: -1.0,
    }
    .sanitised();
    assert_eq!(policy.max_passes, 1);
    assert_eq!(policy.tolerance, 0.0);
}

#[test]
fn unchanged_when_trial_matches_target() {
    let record = record_with(&[("z_start", json!(1))]);
    let config = derive_parameters(&record).expect("derive");
    let schedule = RedshiftSchedule::from_descending(vec![1.0, 0.0]).expect("schedule");
    let solver = FixedSolver::new(vec![0.9, 0.8], table(2));
    let outcome = normalize_amplitude(
        &config,
        &schedule,
        &SolverAdapter::new(&solver),
        &NormalizationPolicy::default(),
    )
    .expect("normalize");
    assert_eq!(outcome.config.inputs().a_s, 2.1e-9);
    assert_eq!(outcome.residual(), 0.0);
}

#[test]
fn solver_failures_propagate() {
    let config = derive_parameters(&fiducial_record()).expect("derive");
    let schedule = build_schedule(100.0).expect("schedule");
    let err = normalize_amplitude(
        &config,
        &schedule,
        &SolverAdapter::new(&BrokenSolver),
        &NormalizationPolicy::default(),
    )
    .expect_err("broken");
    assert!(matches!(err, TfError::Solver(ref info) if info.code == "solver.diverged"));
}

proptest! {
    #[test]
    fn corrected_amplitude_is_exact_arithmetic(
        a_s in 1.0e-10f64..1.0e-8,
        target in 0.1f64..1.5,
        trial in 0.1f64..1.5,
    ) {
        let ratio = target / trial;
        prop_assert_eq!(corrected_amplitude(a_s, target, trial), a_s * (ratio * ratio));
    }
}

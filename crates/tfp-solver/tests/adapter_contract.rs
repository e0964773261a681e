use tfp_core::errors::{ErrorInfo, TfError};
use tfp_core::RedshiftSchedule;
use tfp_solver::{PerturbationSolver, SolverAdapter, SolverRequest, TransferTable};

struct Fixed {
    sigma8: Vec<f64>,
    table: TransferTable,
}

impl PerturbationSolver for Fixed {
    fn compute_amplitude(&self, _request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        Ok(self.sigma8.clone())
    }

    fn compute_transfer_table(&self, _request: &SolverRequest) -> Result<TransferTable, TfError> {
        Ok(self.table.clone())
    }
}

struct Failing;

impl PerturbationSolver for Failing {
    fn compute_amplitude(&self, _request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        Err(TfError::Solver(ErrorInfo::new("solver.diverged", "no convergence")))
    }

    fn compute_transfer_table(&self, _request: &SolverRequest) -> Result<TransferTable, TfError> {
        Err(TfError::Solver(ErrorInfo::new("solver.diverged", "no convergence")))
    }
}

fn request(redshifts: Vec<f64>) -> SolverRequest {
    SolverRequest {
        h: 0.7,
        omega_b: 0.045,
        omega_c: 0.255,
        omega_k: 0.0,
        w0: -1.0,
        wa: 0.0,
        a_s: 2.1e-9,
        ns: 0.96,
        kmax: 10.0,
        k_per_logint: 5,
        redshifts: RedshiftSchedule::from_descending(redshifts).expect("schedule"),
    }
}

#[test]
fn aligned_results_pass_through() {
    let solver = Fixed {
        sigma8: vec![0.01, 0.8],
        table: TransferTable::from_fn([2, 3, 2], |q, k, z| (q * 100 + k * 10 + z) as f64),
    };
    let adapter = SolverAdapter::new(&solver);
    let req = request(vec![100.0, 0.0]);
    assert_eq!(adapter.sigma8(&req).expect("sigma8"), vec![0.01, 0.8]);
    assert_eq!(adapter.sigma8_at_last(&req).expect("z0"), 0.8);
    assert_eq!(adapter.transfer_table(&req).expect("table").shape(), [2, 3, 2]);
}

#[test]
fn misaligned_lengths_are_solver_errors() {
    let solver = Fixed {
        sigma8: vec![0.8],
        table: TransferTable::from_fn([2, 3, 1], |_, _, _| 1.0),
    };
    let adapter = SolverAdapter::new(&solver);
    let req = request(vec![100.0, 0.0]);
    let err = adapter.sigma8(&req).expect_err("short sigma8");
    assert!(matches!(err, TfError::Solver(ref info) if info.code == "solver.sigma8_len"));
    let err = adapter.transfer_table(&req).expect_err("short table");
    assert!(matches!(err, TfError::Solver(ref info) if info.code == "solver.table_redshifts"));
}

#[test]
fn unphysical_sigma8_is_rejected() {
    let solver = Fixed {
        sigma8: vec![f64::NAN, 0.8],
        table: TransferTable::from_fn([1, 1, 2], |_, _, _| 1.0),
    };
    let err = SolverAdapter::new(&solver)
        .sigma8(&request(vec![1.0, 0.0]))
        .expect_err("nan");
    assert!(matches!(err, TfError::Solver(ref info) if info.code == "solver.sigma8_unphysical"));
}

#[test]
fn backend_failures_propagate_verbatim() {
    let err = SolverAdapter::new(&Failing)
        .sigma8(&request(vec![0.0]))
        .expect_err("failure");
    assert_eq!(err.info().code, "solver.diverged");
}

#[test]
fn amplitude_override_keeps_the_rest_of_the_request() {
    let req = request(vec![0.0]);
    let rescaled = req.with_amplitude(1.0e-9);
    assert_eq!(rescaled.a_s, 1.0e-9);
    assert_eq!(rescaled.with_amplitude(req.a_s), req);
}

#[test]
fn slice_is_transposed() {
    let table = TransferTable::from_fn([2, 3, 2], |q, k, z| (q * 100 + k * 10 + z) as f64);
    let slice = table.slice_at(1).expect("slice");
    assert_eq!(slice.nrows(), 3);
    assert_eq!(slice.ncols(), 2);
    assert_eq!(slice[(2, 1)], 121.0);
    assert_eq!(slice[(0, 0)], 1.0);
    assert!(matches!(table.slice_at(2), Err(TfError::Lookup(_))));
}

#[test]
fn table_buffer_must_match_shape() {
    let err = TransferTable::new([2, 2, 2], vec![0.0; 7]).expect_err("short");
    assert!(matches!(err, TfError::Solver(ref info) if info.code == "solver.table_shape"));
    let table = TransferTable::new([1, 2, 2], vec![1.0, 2.0, 3.0, 4.0]).expect("table");
    assert_eq!(table.get(0, 1, 0), Some(3.0));
    assert_eq!(table.get(1, 0, 0), None);
}

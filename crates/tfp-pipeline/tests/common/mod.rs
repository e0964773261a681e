#![allow(dead_code)]

use std::cell::RefCell;

use tfp_core::errors::{ErrorInfo, TfError};
use tfp_core::ParameterRecord;
use tfp_solver::{PerturbationSolver, SolverRequest, TransferTable};

pub const FIDUCIAL: &str = r#"{
    "h": 0.7,
    "Omega_b": 0.045,
    "Omega_m": 0.3,
    "Omega_k": 0.0,
    "w0": -1.0,
    "wa": 0.0,
    "As": 2.1e-9,
    "ns": 0.96,
    "k0": 0.05,
    "k_per_logint": 5,
    "levelmin": 8,
    "FlagAMR": 0,
    "dx_fin_kpc": 100.0,
    "z_start": 100,
    "bias8_z0_WMAP5": 1.25
}"#;

pub fn fiducial_record() -> ParameterRecord {
    ParameterRecord::from_json_slice(FIDUCIAL.as_bytes()).expect("fiducial record")
}

pub fn record_with(overrides: &[(&str, serde_json::Value)]) -> ParameterRecord {
    let mut value: serde_json::Value = serde_json::from_str(FIDUCIAL).expect("fiducial json");
    for (key, replacement) in overrides {
        value[*key] = replacement.clone();
    }
    ParameterRecord::from_json_slice(value.to_string().as_bytes()).expect("record")
}

/// Returns fixed sigma8 values and a fixed table, recording every amplitude it sees.
pub struct FixedSolver {
    pub sigma8: Vec<f64>,
    pub table: TransferTable,
    pub amplitude_calls: RefCell<Vec<f64>>,
    pub transfer_calls: RefCell<Vec<f64>>,
}

impl FixedSolver {
    pub fn new(sigma8: Vec<f64>, table: TransferTable) -> Self {
        Self {
            sigma8,
            table,
            amplitude_calls: RefCell::new(Vec::new()),
            transfer_calls: RefCell::new(Vec::new()),
        }
    }
}

impl PerturbationSolver for FixedSolver {
    fn compute_amplitude(&self, request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        self.amplitude_calls.borrow_mut().push(request.a_s);
        Ok(self.sigma8.clone())
    }

    fn compute_transfer_table(&self, request: &SolverRequest) -> Result<TransferTable, TfError> {
        self.transfer_calls.borrow_mut().push(request.a_s);
        Ok(self.table.clone())
    }
}

/// sigma8 proportional to `As^exponent`; exponent 0.5 is the linear-theory scaling.
pub struct PowerLawSolver {
    pub sigma8_per_unit: Vec<f64>,
    pub reference_amplitude: f64,
    pub exponent: f64,
    pub quantities: usize,
    pub wavenumbers: usize,
    pub amplitude_calls: RefCell<Vec<f64>>,
}

impl PowerLawSolver {
    pub fn linear(sigma8_at_reference: Vec<f64>, reference_amplitude: f64) -> Self {
        Self {
            sigma8_per_unit: sigma8_at_reference,
            reference_amplitude,
            exponent: 0.5,
            quantities: 3,
            wavenumbers: 4,
            amplitude_calls: RefCell::new(Vec::new()),
        }
    }
}

impl PerturbationSolver for PowerLawSolver {
    fn compute_amplitude(&self, request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        self.amplitude_calls.borrow_mut().push(request.a_s);
        let scale = (request.a_s / self.reference_amplitude).powf(self.exponent);
        Ok(self.sigma8_per_unit.iter().map(|s| s * scale).collect())
    }

    fn compute_transfer_table(&self, request: &SolverRequest) -> Result<TransferTable, TfError> {
        let redshifts = request.redshifts.as_slice().to_vec();
        Ok(TransferTable::from_fn(
            [self.quantities, self.wavenumbers, redshifts.len()],
            |q, k, z| (q as f64 + 1.0) * 10f64.powi(k as i32) + redshifts[z],
        ))
    }
}

/// Fails every call.
pub struct BrokenSolver;

impl PerturbationSolver for BrokenSolver {
    fn compute_amplitude(&self, _request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        Err(TfError::Solver(ErrorInfo::new("solver.diverged", "integration did not converge")))
    }

    fn compute_transfer_table(&self, _request: &SolverRequest) -> Result<TransferTable, TfError> {
        Err(TfError::Solver(ErrorInfo::new("solver.diverged", "integration did not converge")))
    }
}

use serde::{Deserialize, Serialize};
use tfp_core::{CosmologyConfig, RedshiftSchedule};

/// Cosmology subset and redshift list handed to the perturbation solver.
///
/// Nonlinear corrections are never requested; the transfer functions must be linear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverRequest {
    /// Reduced Hubble constant.
    pub h: f64,
    /// Baryon density fraction.
    #[serde(rename = "Omega_b")]
    pub omega_b: f64,
    /// Cold dark matter density fraction.
    #[serde(rename = "Omega_c")]
    pub omega_c: f64,
    /// Curvature density fraction.
    #[serde(rename = "Omega_k")]
    pub omega_k: f64,
    /// Dark-energy equation of state today.
    pub w0: f64,
    /// Dark-energy equation of state evolution.
    pub wa: f64,
    /// Primordial scalar amplitude.
    #[serde(rename = "As")]
    pub a_s: f64,
    /// Primordial spectral index.
    pub ns: f64,
    /// Largest wavenumber to resolve, in 1/Mpc.
    pub kmax: f64,
    /// Wavenumber sampling density.
    pub k_per_logint: u32,
    /// Redshifts in descending order; results are aligned to this order.
    pub redshifts: RedshiftSchedule,
}

impl SolverRequest {
    /// Builds a request from a derived configuration.
    pub fn new(config: &CosmologyConfig, schedule: &RedshiftSchedule) -> Self {
        let inputs = config.inputs();
        let derived = config.derived();
        Self {
            h: inputs.h,
            omega_b: inputs.omega_b,
            omega_c: derived.omega_c,
            omega_k: inputs.omega_k,
            w0: inputs.w0,
            wa: inputs.wa,
            a_s: inputs.a_s,
            ns: inputs.ns,
            kmax: derived.kmax,
            k_per_logint: inputs.k_per_logint,
            redshifts: schedule.clone(),
        }
    }

    /// Same request with a different primordial amplitude.
    pub fn with_amplitude(&self, a_s: f64) -> Self {
        Self {
            a_s,
            ..self.clone()
        }
    }
}

use serde::{Deserialize, Serialize};
use tfp_core::errors::{ErrorInfo, TfError};
use tfp_core::{CosmologyConfig, RedshiftSchedule};
use tfp_solver::{SolverAdapter, SolverRequest};
use tracing::{info, warn};

/// How many analytic corrections to apply when matching sigma8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationPolicy {
    /// Upper bound on correction passes. One pass is a single rescale followed by a check solve.
    pub max_passes: usize,
    /// Relative sigma8 residual at which extra passes stop early.
    pub tolerance: f64,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            max_passes: 1,
            tolerance: 1e-4,
        }
    }
}

impl NormalizationPolicy {
    /// Returns a copy with at least one pass and a non-negative tolerance.
    pub fn sanitised(&self) -> Self {
        Self {
            max_passes: self.max_passes.max(1),
            tolerance: if self.tolerance.is_finite() {
                self.tolerance.max(0.0)
            } else {
                0.0
            },
        }
    }
}

/// Result of matching the z=0 fluctuation amplitude to its target.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationOutcome {
    /// Configuration carrying the corrected `As`.
    pub config: CosmologyConfig,
    /// Solver request matching `config`, reusable for the final extraction.
    pub request: SolverRequest,
    /// Target sigma8 at z=0.
    pub target_sigma8: f64,
    /// sigma8 at z=0 from the trial amplitude.
    pub trial_sigma8: f64,
    /// Trial primordial amplitude.
    pub trial_amplitude: f64,
    /// sigma8 per scheduled redshift after the last correction.
    pub sigma8: Vec<f64>,
    /// Number of correction passes performed.
    pub passes: usize,
}

impl NormalizationOutcome {
    /// sigma8 at z=0 after the last correction.
    pub fn final_sigma8(&self) -> f64 {
        self.sigma8.last().copied().unwrap_or(f64::NAN)
    }

    /// Signed difference between the achieved and target sigma8.
    pub fn residual(&self) -> f64 {
        self.final_sigma8() - self.target_sigma8
    }
}

/// `As_new = As_trial * (sigma8_target / sigma8_trial)^2`.
pub fn corrected_amplitude(trial_amplitude: f64, target_sigma8: f64, trial_sigma8: f64) -> f64 {
    let ratio = target_sigma8 / trial_sigma8;
    trial_amplitude * (ratio * ratio)
}

/// Rescales `As` so that sigma8 at z=0 matches `sigma8_z0_WMAP5`.
///
/// The default policy performs exactly one correction: a trial solve, the
/// analytic rescale, and one diagnostic solve at the new amplitude.
pub fn normalize_amplitude(
    config: &CosmologyConfig,
    schedule: &RedshiftSchedule,
    solver: &SolverAdapter<'_>,
    policy: &NormalizationPolicy,
) -> Result<NormalizationOutcome, TfError> {
    if schedule.last() != 0.0 {
        return Err(TfError::InvalidConfig(
            ErrorInfo::new(
                "normalize.no_z0",
                "redshifts must end at z=0, sigma8 is normalized there",
            )
            .with_context("last", schedule.last().to_string()),
        ));
    }
    let policy = policy.sanitised();
    let target = config.derived().sigma8_z0_wmap5;
    let trial_request = SolverRequest::new(config, schedule);
    let trial_amplitude = trial_request.a_s;
    let trial_sigma8 = solver.sigma8_at_last(&trial_request)?;
    info!(sigma8 = target, z = schedule.last(), "target sigma8");
    info!(sigma8 = trial_sigma8, a_s = trial_amplitude, "initial sigma8 (trial)");

    let mut request = trial_request;
    let mut current = trial_sigma8;
    let mut sigma8 = Vec::new();
    let mut passes = 0;
    while passes < policy.max_passes {
        let a_s = corrected_amplitude(request.a_s, target, current);
        request = request.with_amplitude(a_s);
        sigma8 = solver.sigma8(&request)?;
        current = sigma8.last().copied().unwrap_or(f64::NAN);
        passes += 1;
        info!(
            pass = passes,
            sigma8 = current,
            diff = current - target,
            a_s,
            "normalized sigma8"
        );
        if ((current - target) / target).abs() <= policy.tolerance {
            break;
        }
    }
    if policy.max_passes > 1 && ((current - target) / target).abs() > policy.tolerance {
        warn!(
            passes,
            residual = current - target,
            tolerance = policy.tolerance,
            "sigma8 normalization stopped before reaching tolerance"
        );
    }

    Ok(NormalizationOutcome {
        config: config.with_amplitude(request.a_s)?,
        request,
        target_sigma8: target,
        trial_sigma8,
        trial_amplitude,
        sigma8,
        passes,
    })
}

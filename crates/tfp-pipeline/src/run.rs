use std::path::PathBuf;

use serde::Serialize;
use tfp_core::errors::TfError;
use tfp_core::{ParameterRecord, INPUT_FILE_NAME};
use tfp_solver::{PerturbationSolver, SolverAdapter};
use tracing::info;

use crate::derive::derive_parameters;
use crate::export::{export_transfer, ArtifactPaths};
use crate::normalize::{normalize_amplitude, NormalizationPolicy};
use crate::schedule::build_schedule;

/// Options for a single preparation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Input parameter document.
    pub input: PathBuf,
    /// Directory receiving both artifacts.
    pub out_dir: PathBuf,
    /// sigma8 correction policy.
    pub normalization: NormalizationPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(INPUT_FILE_NAME),
            out_dir: PathBuf::from("."),
            normalization: NormalizationPolicy::default(),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// SHA-256 of the canonical input record.
    pub input_digest: String,
    /// Written artifacts.
    pub artifacts: ArtifactPaths,
    /// Redshifts requested from the solver.
    pub redshifts: Vec<f64>,
    /// Target sigma8 at z=0.
    pub target_sigma8: f64,
    /// sigma8 at z=0 from the trial amplitude.
    pub trial_sigma8: f64,
    /// sigma8 at z=0 after normalization.
    pub sigma8: f64,
    /// Trial primordial amplitude.
    pub trial_amplitude: f64,
    /// Normalized primordial amplitude.
    pub amplitude: f64,
    /// Power-spectrum normalization constant.
    pub force_pnorm: f64,
    /// Normalization passes performed.
    pub passes: usize,
    /// Rows written to the transfer table.
    pub wavenumbers: usize,
    /// Columns written to the transfer table.
    pub quantities: usize,
}

/// Loads the input document and runs the full pipeline.
pub fn run(options: &RunOptions, solver: &dyn PerturbationSolver) -> Result<RunSummary, TfError> {
    info!(path = %options.input.display(), "reading parameters");
    let record = ParameterRecord::load(&options.input)?;
    run_record(&record, options, solver)
}

/// Derive, schedule, normalize, extract and export for an in-memory record.
///
/// Nothing is written unless every step before the export succeeds.
pub fn run_record(
    record: &ParameterRecord,
    options: &RunOptions,
    solver: &dyn PerturbationSolver,
) -> Result<RunSummary, TfError> {
    let input_digest = record.digest()?;
    let config = derive_parameters(record)?;
    let schedule = build_schedule(config.inputs().z_start)?;
    let adapter = SolverAdapter::new(solver);

    info!("normalization of power spectrum");
    let outcome = normalize_amplitude(&config, &schedule, &adapter, &options.normalization)?;

    info!("generating final result");
    let table = adapter.transfer_table(&outcome.request)?;
    let (prepared, artifacts) = export_transfer(&outcome.config, &schedule, &table, &options.out_dir)?;

    Ok(RunSummary {
        input_digest,
        artifacts,
        redshifts: schedule.as_slice().to_vec(),
        target_sigma8: outcome.target_sigma8,
        trial_sigma8: outcome.trial_sigma8,
        sigma8: outcome.final_sigma8(),
        trial_amplitude: outcome.trial_amplitude,
        amplitude: prepared.config.inputs().a_s,
        force_pnorm: prepared.config.force_pnorm().unwrap_or(f64::NAN),
        passes: outcome.passes,
        wavenumbers: prepared.rows.nrows(),
        quantities: prepared.rows.ncols(),
    })
}

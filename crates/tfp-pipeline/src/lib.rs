//! Transfer-function preparation pipeline.
//!
//! Derives box geometry from the input record, builds the redshift
//! schedule, normalizes the primordial amplitude against the target sigma8
//! and exports the `z_start` transfer table together with the parameter
//! record it was produced from.

pub mod derive;
pub mod export;
pub mod format;
pub mod normalize;
pub mod run;
pub mod schedule;

pub use derive::{
    derive_parameters, derived_parameters, RefinementMode, REFINEMENT_EXPANSION_FACTORS,
};
pub use export::{
    export_transfer, force_pnorm, prepare_export, render_transfer_text, transfer_file_name,
    write_artifacts, ArtifactPaths, PreparedExport,
};
pub use normalize::{
    corrected_amplitude, normalize_amplitude, NormalizationOutcome, NormalizationPolicy,
};
pub use run::{run, run_record, RunOptions, RunSummary};
pub use schedule::{build_schedule, STANDARD_REDSHIFTS};

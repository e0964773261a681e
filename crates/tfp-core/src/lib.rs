#![deny(missing_docs)]
#![doc = "Core parameter record, typed cosmology configuration and error taxonomy shared by every tfprep crate."]

pub mod config;
pub mod errors;
pub mod record;
pub mod schedule;
pub mod serde;

pub use config::{keys, CosmologyConfig, CosmologyInputs, DerivedParameters};
pub use errors::{ErrorInfo, TfError};
pub use record::ParameterRecord;
pub use schedule::RedshiftSchedule;
pub use serde::{stable_hash_string, to_canonical_json_bytes};

/// File name of the provenance record written next to the transfer table.
pub const PROVENANCE_FILE_NAME: &str = "cosmo_params_update.json";

/// Default name of the input parameter document.
pub const INPUT_FILE_NAME: &str = "cosmo_params.json";

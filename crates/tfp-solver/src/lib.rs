//! Contract for the external linear perturbation solver.
//!
//! The solver itself is a black box: it accepts a [`SolverRequest`] and
//! produces fluctuation amplitudes and a [`TransferTable`]. Backends
//! implement [`PerturbationSolver`]; pipeline code talks to them through
//! [`SolverAdapter`], which enforces index discipline on the results.

mod command;
mod request;
mod table;

pub use command::{CommandSolver, SolverCall, SolverOperation, SolverResponse};
pub use request::SolverRequest;
pub use table::TransferTable;

use tfp_core::errors::{ErrorInfo, TfError};
use tracing::debug;

/// A linear perturbation backend.
///
/// Each call is atomic and blocking. Failures surface as [`TfError::Solver`]
/// and are never retried.
pub trait PerturbationSolver {
    /// Fluctuation amplitude sigma8 for every scheduled redshift, in request order.
    fn compute_amplitude(&self, request: &SolverRequest) -> Result<Vec<f64>, TfError>;

    /// Transfer table whose redshift axis is aligned with the request order.
    fn compute_transfer_table(&self, request: &SolverRequest) -> Result<TransferTable, TfError>;
}

impl<S: PerturbationSolver + ?Sized> PerturbationSolver for &S {
    fn compute_amplitude(&self, request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        (**self).compute_amplitude(request)
    }

    fn compute_transfer_table(&self, request: &SolverRequest) -> Result<TransferTable, TfError> {
        (**self).compute_transfer_table(request)
    }
}

/// Validating front for a [`PerturbationSolver`].
pub struct SolverAdapter<'a> {
    backend: &'a dyn PerturbationSolver,
}

impl std::fmt::Debug for SolverAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverAdapter").finish_non_exhaustive()
    }
}

impl<'a> SolverAdapter<'a> {
    /// Wraps a backend.
    pub fn new(backend: &'a dyn PerturbationSolver) -> Self {
        Self { backend }
    }

    /// sigma8 per scheduled redshift, checked for length and finiteness.
    pub fn sigma8(&self, request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        debug!(
            a_s = request.a_s,
            kmax = request.kmax,
            redshifts = ?request.redshifts.as_slice(),
            "requesting sigma8"
        );
        let values = self.backend.compute_amplitude(request)?;
        if values.len() != request.redshifts.len() {
            return Err(TfError::Solver(
                ErrorInfo::new(
                    "solver.sigma8_len",
                    "solver returned a sigma8 list misaligned with the schedule",
                )
                .with_context("expected", request.redshifts.len().to_string())
                .with_context("received", values.len().to_string()),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(TfError::Solver(
                ErrorInfo::new("solver.sigma8_unphysical", "solver returned an unphysical sigma8")
                    .with_context("value", bad.to_string()),
            ));
        }
        Ok(values)
    }

    /// sigma8 at the final (lowest) scheduled redshift.
    pub fn sigma8_at_last(&self, request: &SolverRequest) -> Result<f64, TfError> {
        let values = self.sigma8(request)?;
        values.last().copied().ok_or_else(|| {
            TfError::Solver(ErrorInfo::new("solver.sigma8_empty", "solver returned no sigma8"))
        })
    }

    /// Transfer table checked against the schedule length.
    pub fn transfer_table(&self, request: &SolverRequest) -> Result<TransferTable, TfError> {
        debug!(a_s = request.a_s, "requesting transfer table");
        let table = self.backend.compute_transfer_table(request)?;
        if table.redshifts() != request.redshifts.len() {
            return Err(TfError::Solver(
                ErrorInfo::new(
                    "solver.table_redshifts",
                    "transfer table redshift axis is misaligned with the schedule",
                )
                .with_context("expected", request.redshifts.len().to_string())
                .with_context("received", table.redshifts().to_string()),
            ));
        }
        Ok(table)
    }
}

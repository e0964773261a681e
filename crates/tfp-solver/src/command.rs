use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tfp_core::errors::{ErrorInfo, TfError};
use tracing::debug;

use crate::{PerturbationSolver, SolverRequest, TransferTable};

/// Which product the external solver should compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverOperation {
    /// sigma8 per scheduled redshift.
    Sigma8,
    /// Matter transfer table.
    Transfer,
}

/// Message written to the solver's standard input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverCall {
    /// Requested product.
    pub operation: SolverOperation,
    /// Cosmology and redshifts.
    pub request: SolverRequest,
}

/// Message read from the solver's standard output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolverResponse {
    /// sigma8 values in request order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma8: Option<Vec<f64>>,
    /// Transfer table with `shape` and flat `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferTable>,
    /// Diagnostic reported by the solver instead of a result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs an external program once per solver call, speaking JSON over stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSolver {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSolver {
    /// Creates a solver invoking `program` with `args`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a whitespace separated command line into program and arguments.
    pub fn from_command_line(line: &str) -> Result<Self, TfError> {
        let mut parts = line.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            TfError::Config(
                ErrorInfo::new("solver.command_empty", "solver command line is empty")
                    .with_hint("pass --solver or set TFPREP_SOLVER"),
            )
        })?;
        Ok(Self::new(program, parts.map(str::to_owned).collect()))
    }

    fn invoke(&self, call: &SolverCall) -> Result<SolverResponse, TfError> {
        let payload = serde_json::to_vec(call).map_err(|err| {
            TfError::Serde(ErrorInfo::new("solver.encode_call", err.to_string()))
        })?;
        debug!(program = %self.program.display(), operation = ?call.operation, "spawning solver");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.solver_error("solver.spawn", err.to_string()))?;
        // Dropping stdin closes the pipe before the child is waited on.
        let write_result = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(&payload));
        let output = child
            .wait_with_output()
            .map_err(|err| self.solver_error("solver.wait", err.to_string()))?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        if !output.status.success() {
            let info = ErrorInfo::new("solver.exit", format!("solver exited with {}", output.status))
                .with_context("program", self.program.display().to_string())
                .with_context("stderr", stderr);
            return Err(TfError::Solver(info));
        }
        if let Err(err) = write_result {
            let info = ErrorInfo::new("solver.stdin", err.to_string())
                .with_context("program", self.program.display().to_string())
                .with_context("stderr", stderr);
            return Err(TfError::Solver(info));
        }
        let response: SolverResponse = serde_json::from_slice(&output.stdout).map_err(|err| {
            TfError::Solver(
                ErrorInfo::new("solver.decode", err.to_string())
                    .with_context("program", self.program.display().to_string())
                    .with_context("stderr", stderr.clone()),
            )
        })?;
        if let Some(message) = &response.error {
            return Err(self.solver_error("solver.reported", message.clone()));
        }
        Ok(response)
    }

    fn solver_error(&self, code: &str, message: impl Into<String>) -> TfError {
        TfError::Solver(
            ErrorInfo::new(code, message).with_context("program", self.program.display().to_string()),
        )
    }
}

impl PerturbationSolver for CommandSolver {
    fn compute_amplitude(&self, request: &SolverRequest) -> Result<Vec<f64>, TfError> {
        let call = SolverCall {
            operation: SolverOperation::Sigma8,
            request: request.clone(),
        };
        self.invoke(&call)?
            .sigma8
            .ok_or_else(|| self.solver_error("solver.missing_sigma8", "response lacks sigma8"))
    }

    fn compute_transfer_table(&self, request: &SolverRequest) -> Result<TransferTable, TfError> {
        let call = SolverCall {
            operation: SolverOperation::Transfer,
            request: request.clone(),
        };
        self.invoke(&call)?
            .transfer
            .ok_or_else(|| self.solver_error("solver.missing_transfer", "response lacks transfer"))
    }
}

//! Structured error types shared across tfprep crates.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`TfError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (parameter names, paths, redshifts).
    #[serde(default)]
    pub context: IndexMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: IndexMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for a transfer-function preparation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum TfError {
    /// Input record missing, malformed, or lacking a required key.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// A derived-value precondition was violated.
    #[error("invalid config: {0}")]
    InvalidConfig(ErrorInfo),
    /// A reciprocal was requested of a zero-valued parameter.
    #[error("division by zero: {0}")]
    DivisionByZero(ErrorInfo),
    /// The external perturbation solver failed or returned unusable output.
    #[error("solver error: {0}")]
    Solver(ErrorInfo),
    /// A redshift expected on the transfer table axis is absent.
    #[error("lookup error: {0}")]
    Lookup(ErrorInfo),
    /// Filesystem failures while reading inputs or writing artifacts.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl TfError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            TfError::Config(info)
            | TfError::InvalidConfig(info)
            | TfError::DivisionByZero(info)
            | TfError::Solver(info)
            | TfError::Lookup(info)
            | TfError::Io(info)
            | TfError::Serde(info) => info,
        }
    }

    /// Process exit code reported by the command line front-end.
    pub fn exit_code(&self) -> u8 {
        match self {
            TfError::Config(_) => 2,
            TfError::InvalidConfig(_) | TfError::DivisionByZero(_) => 3,
            TfError::Solver(_) => 4,
            TfError::Lookup(_) => 5,
            TfError::Io(_) | TfError::Serde(_) => 6,
        }
    }
}

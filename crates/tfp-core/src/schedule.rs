//! Redshift sampling requested from the perturbation solver.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, TfError};

/// Strictly descending list of redshifts ending at exactly `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct RedshiftSchedule {
    redshifts: Vec<f64>,
}

impl RedshiftSchedule {
    /// Validates an already sorted sequence.
    pub fn from_descending(redshifts: Vec<f64>) -> Result<Self, TfError> {
        if let Some(bad) = redshifts.iter().find(|z| !z.is_finite()) {
            return Err(TfError::InvalidConfig(
                ErrorInfo::new("schedule.non_finite", "redshifts must be finite")
                    .with_context("redshift", bad.to_string()),
            ));
        }
        if let Some(pair) = redshifts.windows(2).find(|pair| pair[0] <= pair[1]) {
            return Err(TfError::InvalidConfig(
                ErrorInfo::new("schedule.not_descending", "redshifts must be strictly descending")
                    .with_context("previous", pair[0].to_string())
                    .with_context("next", pair[1].to_string()),
            ));
        }
        match redshifts.last().copied() {
            Some(last) if last == 0.0 => Ok(Self { redshifts }),
            last => Err(TfError::InvalidConfig(
                ErrorInfo::new(
                    "schedule.no_z0",
                    "the final scheduled redshift must be exactly 0 for sigma8 normalization",
                )
                .with_context(
                    "last",
                    last.map_or_else(|| "none".to_owned(), |z| z.to_string()),
                ),
            )),
        }
    }

    /// Redshifts in request order.
    pub fn as_slice(&self) -> &[f64] {
        &self.redshifts
    }

    /// Number of scheduled redshifts.
    pub fn len(&self) -> usize {
        self.redshifts.len()
    }

    /// Always false for a validated schedule; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.redshifts.is_empty()
    }

    /// The lowest (final) redshift.
    pub fn last(&self) -> f64 {
        self.redshifts.last().copied().unwrap_or(f64::NAN)
    }

    /// Index of `z` under exact floating point comparison.
    pub fn index_of(&self, z: f64) -> Option<usize> {
        self.redshifts.iter().position(|candidate| *candidate == z)
    }
}

impl TryFrom<Vec<f64>> for RedshiftSchedule {
    type Error = TfError;

    fn try_from(redshifts: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_descending(redshifts)
    }
}

impl From<RedshiftSchedule> for Vec<f64> {
    fn from(schedule: RedshiftSchedule) -> Self {
        schedule.redshifts
    }
}

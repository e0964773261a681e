use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tfp_core::errors::{ErrorInfo, TfError};

/// Transfer functions indexed by `[quantity, wavenumber, redshift]`.
///
/// Stored as a flat row-major buffer: the redshift index varies fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct TransferTable {
    quantities: usize,
    wavenumbers: usize,
    redshifts: usize,
    data: Vec<f64>,
}

/// Wire form of [`TransferTable`]: `{"shape": [q, k, z], "data": [...]}`.
#[doc(hidden)]
#[derive(Serialize, Deserialize)]
pub struct RawTable {
    shape: [usize; 3],
    data: Vec<f64>,
}

impl TransferTable {
    /// Wraps a flat buffer, checking it against the declared shape.
    pub fn new(shape: [usize; 3], data: Vec<f64>) -> Result<Self, TfError> {
        let [quantities, wavenumbers, redshifts] = shape;
        let expected = quantities
            .checked_mul(wavenumbers)
            .and_then(|n| n.checked_mul(redshifts));
        if expected != Some(data.len()) {
            return Err(TfError::Solver(
                ErrorInfo::new("solver.table_shape", "transfer buffer does not match its shape")
                    .with_context("shape", format!("{quantities}x{wavenumbers}x{redshifts}"))
                    .with_context("len", data.len().to_string()),
            ));
        }
        Ok(Self {
            quantities,
            wavenumbers,
            redshifts,
            data,
        })
    }

    /// Builds a table from a generating function.
    pub fn from_fn(shape: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> f64) -> Self {
        let [quantities, wavenumbers, redshifts] = shape;
        let mut data = Vec::with_capacity(quantities * wavenumbers * redshifts);
        for q in 0..quantities {
            for k in 0..wavenumbers {
                for z in 0..redshifts {
                    data.push(f(q, k, z));
                }
            }
        }
        Self {
            quantities,
            wavenumbers,
            redshifts,
            data,
        }
    }

    /// `[quantities, wavenumbers, redshifts]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.quantities, self.wavenumbers, self.redshifts]
    }

    /// Number of physical quantities.
    pub fn quantities(&self) -> usize {
        self.quantities
    }

    /// Number of wavenumber samples.
    pub fn wavenumbers(&self) -> usize {
        self.wavenumbers
    }

    /// Length of the redshift axis.
    pub fn redshifts(&self) -> usize {
        self.redshifts
    }

    /// Element accessor.
    pub fn get(&self, quantity: usize, wavenumber: usize, redshift: usize) -> Option<f64> {
        if quantity >= self.quantities
            || wavenumber >= self.wavenumbers
            || redshift >= self.redshifts
        {
            return None;
        }
        let offset = (quantity * self.wavenumbers + wavenumber) * self.redshifts + redshift;
        self.data.get(offset).copied()
    }

    /// All quantities at one redshift, transposed: rows are wavenumbers, columns quantities.
    pub fn slice_at(&self, redshift: usize) -> Result<DMatrix<f64>, TfError> {
        if redshift >= self.redshifts {
            return Err(TfError::Lookup(
                ErrorInfo::new("table.redshift_index", "redshift index outside the table")
                    .with_context("index", redshift.to_string())
                    .with_context("redshifts", self.redshifts.to_string()),
            ));
        }
        Ok(DMatrix::from_fn(self.wavenumbers, self.quantities, |k, q| {
            self.data[(q * self.wavenumbers + k) * self.redshifts + redshift]
        }))
    }
}

impl TryFrom<RawTable> for TransferTable {
    type Error = TfError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::new(raw.shape, raw.data)
    }
}

impl From<TransferTable> for RawTable {
    fn from(table: TransferTable) -> Self {
        Self {
            shape: table.shape(),
            data: table.data,
        }
    }
}

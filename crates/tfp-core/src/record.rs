//! Insertion-ordered parameter record backing both output artifacts.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::{ErrorInfo, TfError};
use crate::serde::{stable_hash_string, to_pretty_json_string};

/// Flat key to scalar mapping that remembers the order keys were first inserted.
///
/// Overwriting an existing key keeps its original position, new keys are
/// appended. This is the order used for the `key: value` header of the
/// transfer table and for the provenance document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterRecord {
    entries: IndexMap<String, Value>,
}

impl ParameterRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a record from JSON bytes. The document must be a flat object of scalars.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, TfError> {
        let value: Value = serde_json::from_slice(data).map_err(|err| {
            TfError::Config(
                ErrorInfo::new("config.malformed", err.to_string())
                    .with_context("line", err.line().to_string()),
            )
        })?;
        let Value::Object(map) = value else {
            return Err(TfError::Config(ErrorInfo::new(
                "config.not_object",
                "parameter document must be a JSON object",
            )));
        };
        let mut entries = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            if value.is_array() || value.is_object() {
                return Err(TfError::Config(
                    ErrorInfo::new("config.non_scalar", "parameter values must be scalars")
                        .with_context("key", key),
                ));
            }
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    /// Reads and parses a record from disk.
    pub fn load(path: &Path) -> Result<Self, TfError> {
        let bytes = fs::read(path).map_err(|err| {
            TfError::Config(
                ErrorInfo::new("config.read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_json_slice(&bytes).map_err(|err| match err {
            TfError::Config(info) => {
                TfError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the record holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns true when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reads a required numeric entry.
    pub fn require_f64(&self, key: &str) -> Result<f64, TfError> {
        let value = self.require(key)?;
        value.as_f64().ok_or_else(|| {
            TfError::Config(
                ErrorInfo::new("config.not_numeric", format!("parameter '{key}' must be numeric"))
                    .with_context("key", key)
                    .with_context("value", value.to_string()),
            )
        })
    }

    /// Reads a required non-negative integer entry. Integral floats are accepted.
    pub fn require_u32(&self, key: &str) -> Result<u32, TfError> {
        let value = self.require(key)?;
        let parsed = match value.as_u64() {
            Some(raw) => u32::try_from(raw).ok(),
            None => value
                .as_f64()
                .filter(|raw| raw.fract() == 0.0 && *raw >= 0.0 && *raw <= f64::from(u32::MAX))
                .map(|raw| raw as u32),
        };
        parsed.ok_or_else(|| {
            TfError::Config(
                ErrorInfo::new(
                    "config.not_integer",
                    format!("parameter '{key}' must be a non-negative integer"),
                )
                .with_context("key", key)
                .with_context("value", value.to_string()),
            )
        })
    }

    /// Reads an optional numeric entry; present but non-numeric values are an error.
    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, TfError> {
        if self.contains_key(key) {
            self.require_f64(key).map(Some)
        } else {
            Ok(None)
        }
    }

    fn require(&self, key: &str) -> Result<&Value, TfError> {
        self.entries.get(key).ok_or_else(|| {
            TfError::Config(
                ErrorInfo::new(
                    "config.missing_key",
                    format!("required parameter '{key}' is missing"),
                )
                .with_context("key", key),
            )
        })
    }

    /// Stores a floating point entry. Non-finite values cannot be represented.
    pub fn set_f64(&mut self, key: &str, value: f64) -> Result<(), TfError> {
        let number = Number::from_f64(value).ok_or_else(|| {
            TfError::InvalidConfig(
                ErrorInfo::new(
                    "config.non_finite",
                    format!("parameter '{key}' evaluated to a non-finite value"),
                )
                .with_context("key", key)
                .with_context("value", value.to_string()),
            )
        })?;
        self.entries.insert(key.to_owned(), Value::Number(number));
        Ok(())
    }

    /// Stores an integer entry.
    pub fn set_u32(&mut self, key: &str, value: u32) {
        self.entries.insert(key.to_owned(), Value::from(value));
    }

    /// Renders one `key: value` line per entry.
    ///
    /// Strings are written unquoted, integers as written and floats in their
    /// shortest round-trip form with a signed two-digit exponent (`2.1e-09`)
    /// outside `1e-4 <= |x| < 1e16`.
    pub fn header_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}: {}", header_value(value)))
            .collect()
    }

    /// Pretty JSON document, four-space indent, insertion order preserved.
    pub fn to_pretty_json(&self) -> Result<String, TfError> {
        to_pretty_json_string(self)
    }

    /// SHA-256 digest over the canonical (key-sorted) JSON form.
    pub fn digest(&self) -> Result<String, TfError> {
        stable_hash_string(self)
    }
}

fn header_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .map_or_else(|| number.to_string(), shortest_float),
        other => other.to_string(),
    }
}

fn shortest_float(value: f64) -> String {
    let exp_form = format!("{value:e}");
    let (mantissa, exponent) = match exp_form.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (exp_form.as_str(), 0),
    };
    if value == 0.0 || (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

/// Two records are equal when they hold the same entries in the same order.
impl PartialEq for ParameterRecord {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl FromIterator<(String, Value)> for ParameterRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

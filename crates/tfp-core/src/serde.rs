//! Canonical JSON, digest and pretty-printing helpers.

use std::collections::BTreeMap;
use std::iter::FromIterator;

use ::serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::errors::{ErrorInfo, TfError};

fn serde_error(code: &str, err: impl ToString) -> TfError {
    TfError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut ordered = BTreeMap::new();
            for (key, val) in map {
                ordered.insert(key, canonicalize(val));
            }
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into canonical JSON bytes with sorted object keys.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, TfError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json.encode", err))?;
    let canonical = canonicalize(value);
    let mut bytes = Vec::new();
    serde_json::to_writer(&mut bytes, &canonical).map_err(|err| serde_error("json.write", err))?;
    Ok(bytes)
}

/// Computes a stable hexadecimal SHA-256 digest of the canonical JSON form.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, TfError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(hex::encode(Sha256::digest(bytes)))
}

/// Serializes a value as pretty JSON indented with four spaces, keeping key order.
pub fn to_pretty_json_string<T: Serialize>(value: &T) -> Result<String, TfError> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| serde_error("json.pretty", err))?;
    String::from_utf8(bytes).map_err(|err| serde_error("json.utf8", err))
}

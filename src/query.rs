//! Query string encoding of [`Parameters`].
//!
//! Nested objects become `key[sub]`, arrays become `key[]`, booleans are written as `true` and
//! `false`. Top-level keys are sorted.
use serde_json::Value;

use crate::Parameters;

/// Parameters that have no query string form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryEncodingError {
    /// A value is JSON `null`.
    #[error("query parameter {key:?} is null")]
    NullValue {
        /// Key of the null value.
        key: String,
    },
}

pub(crate) fn encode(parameters: &Parameters) -> Result<Vec<(String, String)>, QueryEncodingError> {
    let mut keys: Vec<&String> = parameters.keys().collect();
    keys.sort();

    let mut pairs = Vec::new();
    for key in keys {
        append_components(&mut pairs, key.clone(), &parameters[key])?;
    }
    Ok(pairs)
}

fn append_components(
    pairs: &mut Vec<(String, String)>,
    key: String,
    value: &Value,
) -> Result<(), QueryEncodingError> {
    match value {
        Value::Object(object) => {
            for (nested_key, nested_value) in object {
                append_components(pairs, format!("{key}[{nested_key}]"), nested_value)?;
            }
        }
        Value::Array(array) => {
            for element in array {
                append_components(pairs, format!("{key}[]"), element)?;
            }
        }
        Value::Bool(value) => pairs.push((key, value.to_string())),
        Value::Number(value) => pairs.push((key, value.to_string())),
        Value::String(value) => pairs.push((key, value.clone())),
        Value::Null => return Err(QueryEncodingError::NullValue { key }),
    }
    Ok(())
}

//! Loosely-typed field bags as they come back from the record store.
//!
//! The store owns its schema, so every record is decoded into a
//! [`FieldMap`] of [`FieldValue`]s. Only the accessors in this module read
//! those values; the product, review and lead normalizers build strict types
//! on top of them and nothing past that boundary sees a `FieldValue`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix the store uses for its own record identifiers (`recXXXXXXXXXXXXXX`).
pub const RECORD_ID_PREFIX: &str = "rec";

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
    /// Structured cells such as attachments (`{ "url": ..., "filename": ... }`).
    Object(FieldMap),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> &[FieldValue] {
        match self {
            FieldValue::List(items) => items.as_slice(),
            _ => &[],
        }
    }

    /// Truthiness the way the store's checkbox and lookup cells behave.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(value) => *value,
            FieldValue::Number(value) => *value != 0.0 && !value.is_nan(),
            FieldValue::Text(value) => !value.is_empty(),
            FieldValue::List(_) | FieldValue::Object(_) => true,
        }
    }

    /// Render scalar cells as labels; structured cells have no label.
    pub fn to_label(&self) -> Option<String> {
        match self {
            FieldValue::Text(value) => Some(value.clone()),
            FieldValue::Number(value) => Some(value.to_string()),
            FieldValue::Bool(value) => Some(value.to_string()),
            FieldValue::Null | FieldValue::List(_) | FieldValue::Object(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

/// One row of a store table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    #[serde(default)]
    pub fields: FieldMap,
}

impl StoreRecord {
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Whether `value` has the shape of a store record identifier.
pub fn is_record_id(value: &str) -> bool {
    value.len() > RECORD_ID_PREFIX.len() && value.starts_with(RECORD_ID_PREFIX)
}

/// Non-empty text stored under `key`.
pub fn text<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(FieldValue::as_text)
        .filter(|value| !value.is_empty())
}

/// Text under `key`, or `default` when the cell is missing, empty or not text.
pub fn text_or(fields: &FieldMap, key: &str, default: &str) -> String {
    text(fields, key).unwrap_or(default).to_string()
}

/// First non-empty text among `keys`, in order.
pub fn first_text<'a>(fields: &'a FieldMap, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| text(fields, key))
}

pub fn truthy(fields: &FieldMap, key: &str) -> bool {
    fields.get(key).is_some_and(FieldValue::is_truthy)
}

pub fn list<'a>(fields: &'a FieldMap, key: &str) -> &'a [FieldValue] {
    fields.get(key).map(FieldValue::as_list).unwrap_or(&[])
}

/// Scalar entries of a list cell rendered as labels, dropping structured ones.
pub fn labels(values: &[FieldValue]) -> Vec<String> {
    values.iter().filter_map(FieldValue::to_label).collect()
}

/// Numeric coercion: numbers pass through, numeric strings are parsed,
/// anything else (or a failed parse) is zero.
pub fn coerce_number(value: Option<&FieldValue>) -> f64 {
    let parsed = match value {
        Some(FieldValue::Number(number)) => *number,
        Some(FieldValue::Text(raw)) => parse_decimal(raw),
        _ => 0.0,
    };
    finite_or_zero(parsed)
}

/// Percentage coercion: like [`coerce_number`] but strings may carry a `%`.
pub fn coerce_percent(value: Option<&FieldValue>) -> f64 {
    let parsed = match value {
        Some(FieldValue::Number(number)) => *number,
        Some(FieldValue::Text(raw)) => parse_decimal(&raw.replacen('%', "", 1)),
        _ => 0.0,
    };
    finite_or_zero(parsed)
}

fn parse_decimal(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(0.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

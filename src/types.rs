//! Core types for the Sleep Screen pipeline
//!
//! This module defines the data structures that flow between the components:
//! scalar cell values, canonical rows with provenance, synthetic rows, and the
//! persisted result records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single scalar cell of tabular data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parse a raw cell the way the loader sees it: missing tokens, then
    /// integers, then finite floats, then text.
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            return Value::Missing;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Render the value as a list literal for oracle prompts
    pub fn prompt_literal(&self) -> String {
        match self {
            Value::Missing => "nan".to_string(),
            Value::Text(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

fn is_missing_token(cell: &str) -> bool {
    matches!(cell, "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "None")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            // Debug keeps the fractional part of whole floats: 6.0, not 6
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

// Strict equality: variants never compare equal to each other and floats
// compare by bit pattern. Sampling domains merge numerically equal values
// separately (see `sampler::column_domain`).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Missing => {}
            Value::Integer(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// How the canonical row was obtained, for provenance tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMethod {
    #[serde(rename = "Sample Data")]
    SampleData,
    #[serde(rename = "Upload File")]
    UploadFile,
    #[serde(rename = "Answer Questions")]
    AnswerQuestions,
}

impl InputMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMethod::SampleData => "Sample Data",
            InputMethod::UploadFile => "Upload File",
            InputMethod::AnswerQuestions => "Answer Questions",
        }
    }
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single normalized feature vector used for detection, tagged with
/// where it came from. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRow {
    method: InputMethod,
    details: String,
    columns: Option<Vec<String>>,
    values: Vec<Value>,
}

impl CanonicalRow {
    pub(crate) fn new(
        method: InputMethod,
        details: impl Into<String>,
        columns: Option<Vec<String>>,
        values: Vec<Value>,
    ) -> Self {
        Self {
            method,
            details: details.into(),
            columns,
            values,
        }
    }

    pub fn method(&self) -> InputMethod {
        self.method
    }

    /// Origin descriptor: a file path or "User Input"
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Column names, when the source had a header
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One generated record; each value is a member of its column's observed domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticRow(Vec<Value>);

impl SyntheticRow {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

/// A persisted classification event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub input_method: String,
    pub details: String,
    pub result: String,
    /// Local time formatted as `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

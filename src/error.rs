//! Error types for Sleep Screen

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while normalizing input, sampling, or recording results
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to parse {source_name} at line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("No data rows in {source_name}")]
    EmptyTable { source_name: String },

    #[error("Column '{column}' has no non-missing values to sample from")]
    EmptyDomain { column: String },

    #[error("Row {row} has {found} values but the header has {expected}")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Result store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Input ended after {answered} of {total} questions were answered")]
    AnswersExhausted { answered: usize, total: usize },

    #[error("No input found. Choose an input method first.")]
    NoInput,

    #[error("No detection result to explain. Run detection first.")]
    NoDetection,

    #[error("Oracle request failed: {0}")]
    Oracle(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for ScreenError {
    fn from(err: rusqlite::Error) -> Self {
        ScreenError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ScreenError {
    fn from(err: serde_json::Error) -> Self {
        ScreenError::Config(err.to_string())
    }
}

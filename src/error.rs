//! Error types shared by the record store, persistence and sales modules.

use std::path::PathBuf;
use thiserror::Error;

/// A field value that breaks a record invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} has leading or trailing whitespace ({value:?})")]
    Padded { field: &'static str, value: String },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a number, got {input:?}")]
    NotANumber { field: &'static str, input: String },

    #[error("{field} must be a whole number, got {input:?}")]
    NotAnInteger { field: &'static str, input: String },

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Failures of [`RecordStore`](crate::store::RecordStore) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("no record named '{key}'")]
    NotFound { key: String },

    #[error("a record named '{key}' already exists")]
    DuplicateKey { key: String },

    /// A name was omitted and no record has been selected yet.
    #[error("no current {kind}; name one explicitly")]
    NoCurrent { kind: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// File-level failures of CSV save and load.
///
/// Row-level problems never surface here; they are counted as
/// [`SkippedRow`](crate::persist::SkippedRow)s instead.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {path} does not exist")]
    FileNotFound { path: PathBuf },

    #[error("invalid header in {path}: expected '{expected}', found '{found}'")]
    HeaderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("{path} is not valid UTF-8 (line {line})")]
    Encoding { path: PathBuf, line: u64 },

    #[error("malformed CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// Why a sale was refused. No state is touched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("product '{key}' does not exist")]
    UnknownProduct { key: String },

    #[error("invalid customer class '{given}' (valid: {valid})")]
    InvalidClass { given: String, valid: String },

    #[error("insufficient stock for '{product}': available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },
}

/// Reason a CSV data row was rejected during load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

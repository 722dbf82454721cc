//! Typed error handling for dataset operations.

use std::io;

use thiserror::Error;

/// Top-level dataset error type.
///
/// Categorizes failures into I/O, tabular-file parsing, and validation
/// errors. Validation errors are fatal to starting a run and are surfaced
/// before any state is mutated.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// I/O operation failed (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The tabular file could not be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset is structurally unusable for a run.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal error (buffer recovery, encoding).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Dataset validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The file parsed but contained no data rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// No header matched the contact column (case-insensitive).
    #[error("No {0:?} column found")]
    MissingContactColumn(String),

    /// Every row was either contact-less or already marked sent.
    #[error("No unsent recipients found")]
    NoEligibleRows,
}

/// Specialized `Result` type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

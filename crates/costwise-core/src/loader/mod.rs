//! Row-tagged ingestion of the flat-file inputs.
//!
//! Every input is a CSV whose rows are dispatched on the first cell. The
//! loaders classify rows into typed records before touching the model,
//! so format concerns stay out of the aggregation code. Unrecognized
//! tags are logged and skipped; missing files and malformed recognized
//! rows are fatal.

mod progress;
mod staff_db;
mod work_package;

pub use progress::load_progress;
pub use staff_db::load_staff_database;
pub use work_package::load_work_package;

use std::path::Path;

use thiserror::Error;

use crate::model::{LookupError, ModelError};

/// Errors raised while loading input files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoaderError {
    /// The input file does not exist.
    #[error("input file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: String,
    },

    /// The input file could not be read as CSV.
    #[error("failed to read input file: {0}")]
    Csv(#[from] csv::Error),

    /// A required row is absent from a definition file.
    #[error("definition file {path} has no '{tag}' row")]
    MissingRow {
        /// The required row tag.
        tag: &'static str,
        /// The file missing it.
        path: String,
    },

    /// A numeric cell in a recognized row could not be parsed.
    #[error("invalid number '{value}' in row tagged '{tag}'")]
    InvalidNumber {
        /// The row tag.
        tag: String,
        /// The offending cell content.
        value: String,
    },

    /// A date cell could not be parsed.
    #[error("invalid date '{value}' (expected '%d %B %Y', e.g. '17 June 2025')")]
    InvalidDate {
        /// The offending cell content.
        value: String,
    },

    /// The model rejected an entity built from the file.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An identity referenced by the file is ambiguous in the model.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Reads all rows of a headerless CSV file.
pub(crate) fn read_rows(path: &Path) -> Result<Vec<csv::StringRecord>, LoaderError> {
    if !path.is_file() {
        return Err(LoaderError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.records() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Parses a cost cell: blank and `nan` cells read as zero, anything else
/// must be a number.
pub(crate) fn parse_cost(cell: Option<&str>, tag: &str) -> Result<f64, LoaderError> {
    let value = cell.unwrap_or("").trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(0.0);
    }
    value.parse().map_err(|_| LoaderError::InvalidNumber {
        tag: tag.to_string(),
        value: value.to_string(),
    })
}

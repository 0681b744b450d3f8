//! Economic parameters controlling the costing pass.
//!
//! One [`EconomicParameters`] value is constructed at process start -
//! either from defaults or from a tagged-row parameter file - and is
//! immutable for the remainder of the run. It is passed down through the
//! costing call graph by reference; there is no global singleton.
//!
//! The parameter file is a CSV whose rows are dispatched on the first
//! cell: `Issue date` (date in `%d-%b-%y`), `Inflation` (capital %,
//! staff %, start year), `VAT`, `WorkingMargin` (rate %, start year),
//! `Contingency` (material %, project-staff %, CG-staff %, start year),
//! and `fEC` (project %, CG %). Rates carry a trailing `%` and are stored
//! as fractions. Unrecognized rows are logged and skipped.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Date format used by the `Issue date` row, e.g. `01-Apr-24`.
const ISSUE_DATE_FORMAT: &str = "%d-%b-%y";

/// Errors raised while loading an economic-parameters file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The parameter file does not exist.
    #[error("economic-parameters file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: String,
    },

    /// The parameter file could not be read as CSV.
    #[error("failed to read economic-parameters file: {0}")]
    Csv(#[from] csv::Error),

    /// A row is missing a required cell.
    #[error("row tagged '{tag}' is missing cell {column}")]
    MissingCell {
        /// The row tag.
        tag: String,
        /// Zero-based column index of the missing cell.
        column: usize,
    },

    /// A rate cell could not be parsed as a percentage.
    #[error("invalid rate '{value}' in row tagged '{tag}'")]
    InvalidRate {
        /// The row tag.
        tag: String,
        /// The offending cell content.
        value: String,
    },

    /// A start-year cell could not be parsed as an integer.
    #[error("invalid start year '{value}' in row tagged '{tag}'")]
    InvalidStartYear {
        /// The row tag.
        tag: String,
        /// The offending cell content.
        value: String,
    },

    /// The issue date could not be parsed.
    #[error("invalid issue date '{value}' (expected {ISSUE_DATE_FORMAT})")]
    InvalidIssueDate {
        /// The offending cell content.
        value: String,
    },
}

/// Immutable economic parameters for one costing run.
///
/// All rates are fractions in `[0, 1]`; start years are offsets from the
/// first financial year of the project (year index 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicParameters {
    /// Date stamped on generated reports.
    pub issue_date: NaiveDate,

    /// Annual inflation rate applied to equipment (capital) cost.
    pub inflation_capital_rate: f64,

    /// Annual inflation rate applied to staff cost.
    pub inflation_staff_rate: f64,

    /// First year index at which inflation is applied.
    pub inflation_start_year: usize,

    /// VAT rate.
    pub vat_rate: f64,

    /// Working-margin rate applied to staff plus equipment cost.
    pub working_margin_rate: f64,

    /// First year index at which working margin applies.
    ///
    /// Carried for parity with the parameter file; the work-package
    /// rollup applies the margin to every year (see
    /// [`crate::costing`]).
    pub working_margin_start_year: usize,

    /// Contingency rate on equipment (material) cost.
    pub contingency_material_rate: f64,

    /// Contingency rate on project-funded staff cost.
    pub contingency_staff_project_rate: f64,

    /// Contingency rate on consolidated-grant staff cost.
    pub contingency_staff_cg_rate: f64,

    /// First year index at which contingency applies.
    ///
    /// Carried for parity with the parameter file; see
    /// [`Self::working_margin_start_year`].
    pub contingency_start_year: usize,

    /// fEC charge fraction recovered on project-funded staff.
    pub fec_fraction_project: f64,

    /// fEC charge fraction recovered on consolidated-grant staff.
    pub fec_fraction_cg: f64,
}

impl Default for EconomicParameters {
    fn default() -> Self {
        Self {
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 1)
                .expect("static default date is valid"),
            inflation_capital_rate: 0.01,
            inflation_staff_rate: 0.02,
            inflation_start_year: 0,
            vat_rate: 0.2,
            working_margin_rate: 0.1,
            working_margin_start_year: 1,
            contingency_material_rate: 0.2,
            contingency_staff_project_rate: 0.3,
            contingency_staff_cg_rate: 0.4,
            contingency_start_year: 1,
            fec_fraction_project: 0.8,
            fec_fraction_cg: 0.8,
        }
    }
}

impl EconomicParameters {
    /// Loads parameters from a tagged-row CSV file.
    ///
    /// Rows with unrecognized tags are skipped with a warning; rows that
    /// are recognized but malformed are errors. Parameters not present in
    /// the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, or a
    /// recognized row cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let mut params = Self::default();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        for row in reader.records() {
            let row = row?;
            let tag = row.get(0).unwrap_or("").trim();
            if tag.is_empty() {
                continue;
            }

            if tag == "Issue date" {
                let value = cell(&row, 1, tag)?;
                params.issue_date = NaiveDate::parse_from_str(&value, ISSUE_DATE_FORMAT)
                    .map_err(|_| ConfigError::InvalidIssueDate { value })?;
            } else if tag.contains("Inflation") {
                params.inflation_capital_rate = rate(&row, 1, tag)?;
                params.inflation_staff_rate = rate(&row, 2, tag)?;
                // The file carries a 1-based start year; year 1 means
                // "from the first financial year", stored as offset 0.
                params.inflation_start_year = start_year(&row, 3, tag)?.saturating_sub(1);
            } else if tag.contains("VAT") {
                params.vat_rate = rate(&row, 1, tag)?;
            } else if tag.contains("WorkingMargin") {
                params.working_margin_rate = rate(&row, 1, tag)?;
                params.working_margin_start_year = start_year(&row, 2, tag)?;
            } else if tag.contains("Contingency") {
                params.contingency_material_rate = rate(&row, 1, tag)?;
                params.contingency_staff_project_rate = rate(&row, 2, tag)?;
                params.contingency_staff_cg_rate = rate(&row, 3, tag)?;
                params.contingency_start_year = start_year(&row, 4, tag)?;
            } else if tag.contains("fEC") {
                params.fec_fraction_project = rate(&row, 1, tag)?;
                params.fec_fraction_cg = rate(&row, 2, tag)?;
            } else {
                warn!(tag, "skipping unrecognized parameter row");
            }
        }

        Ok(params)
    }
}

fn cell(row: &csv::StringRecord, column: usize, tag: &str) -> Result<String, ConfigError> {
    row.get(column)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingCell {
            tag: tag.to_string(),
            column,
        })
}

/// Parses a percentage cell (`"2%"` → `0.02`) into a fraction.
fn rate(row: &csv::StringRecord, column: usize, tag: &str) -> Result<f64, ConfigError> {
    let value = cell(row, column, tag)?;
    let number = value.trim_end_matches('%').trim();
    let percent: f64 = number.parse().map_err(|_| ConfigError::InvalidRate {
        tag: tag.to_string(),
        value: value.clone(),
    })?;
    Ok(percent / 100.0)
}

fn start_year(row: &csv::StringRecord, column: usize, tag: &str) -> Result<usize, ConfigError> {
    let value = cell(row, column, tag)?;
    value
        .parse()
        .map_err(|_| ConfigError::InvalidStartYear {
            tag: tag.to_string(),
            value,
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_params(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should create");
        file.write_all(content.as_bytes())
            .expect("temp file should accept writes");
        file
    }

    #[test]
    fn default_rates_are_filled_in() {
        let params = EconomicParameters::default();
        assert_eq!(params.inflation_capital_rate, 0.01);
        assert_eq!(params.inflation_staff_rate, 0.02);
        assert_eq!(params.inflation_start_year, 0);
        assert_eq!(params.vat_rate, 0.2);
        assert_eq!(params.working_margin_rate, 0.1);
        assert_eq!(params.contingency_material_rate, 0.2);
        assert_eq!(params.contingency_staff_project_rate, 0.3);
        assert_eq!(params.contingency_staff_cg_rate, 0.4);
        assert_eq!(params.fec_fraction_project, 0.8);
        assert_eq!(params.fec_fraction_cg, 0.8);
    }

    #[test]
    fn parses_tagged_rows() {
        let file = write_params(
            "Issue date,01-Apr-24\n\
             Inflation (capital; staff; start),1%,2%,2\n\
             VAT,20%\n\
             WorkingMargin,10%,2\n\
             Contingency,20%,30%,40%,2\n\
             fEC,80%,80%\n",
        );
        let params =
            EconomicParameters::from_file(file.path()).expect("parameter file should parse");

        assert_eq!(
            params.issue_date,
            NaiveDate::from_ymd_opt(2024, 4, 1).expect("date should be valid")
        );
        assert!((params.inflation_capital_rate - 0.01).abs() < 1e-12);
        assert!((params.inflation_staff_rate - 0.02).abs() < 1e-12);
        // 1-based file year 2 is stored as offset 1.
        assert_eq!(params.inflation_start_year, 1);
        assert!((params.vat_rate - 0.2).abs() < 1e-12);
        assert!((params.working_margin_rate - 0.1).abs() < 1e-12);
        assert_eq!(params.working_margin_start_year, 2);
        assert!((params.contingency_staff_cg_rate - 0.4).abs() < 1e-12);
        assert_eq!(params.contingency_start_year, 2);
    }

    #[test]
    fn inflation_start_year_one_becomes_offset_zero() {
        let file = write_params("Inflation,1%,2%,1\n");
        let params =
            EconomicParameters::from_file(file.path()).expect("parameter file should parse");
        assert_eq!(params.inflation_start_year, 0);
    }

    #[test]
    fn unrecognized_rows_are_skipped() {
        let file = write_params("Frobnication,9%\nVAT,5%\n");
        let params =
            EconomicParameters::from_file(file.path()).expect("parameter file should parse");
        assert!((params.vat_rate - 0.05).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let error = EconomicParameters::from_file(Path::new("/nonexistent/params.csv"))
            .expect_err("missing file should fail");
        assert!(matches!(error, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn malformed_rate_is_rejected() {
        let file = write_params("VAT,twenty\n");
        let error = EconomicParameters::from_file(file.path())
            .expect_err("malformed rate should fail");
        assert!(matches!(error, ConfigError::InvalidRate { .. }));
    }
}

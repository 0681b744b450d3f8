//! Progress report loader.
//!
//! A progress report is a headerless CSV: `Work package` rows select the
//! work package whose tasks the following lines report on, and
//! `ProgressLine` rows carry one observation (task name, date in
//! `%d %B %Y`, planned fraction, planned value, actual fraction, actual
//! spend). Lines naming unknown work packages or tasks are skipped with
//! a warning; blank or `nan` actuals leave the record in the planned
//! state.

use std::path::Path;

use chrono::NaiveDate;
use tracing::warn;

use super::{read_rows, LoaderError};
use crate::model::{CostModel, WorkPackageId};
use crate::progress::{EntityRef, Progress, ProgressLedger};

/// Date format of a `ProgressLine` row, e.g. `17 June 2025`.
const PROGRESS_DATE_FORMAT: &str = "%d %B %Y";

/// Column layout of a `ProgressLine` row.
const TASK_COLUMN: usize = 1;
const DATE_COLUMN: usize = 3;
const PLANNED_FRACTION_COLUMN: usize = 4;
const PLANNED_VALUE_COLUMN: usize = 5;
const FRACTION_COMPLETE_COLUMN: usize = 6;
const SPEND_COLUMN: usize = 7;

/// Loads one progress report into the ledger, returning the number of
/// records created.
///
/// # Errors
///
/// Returns [`LoaderError`] for a missing or unreadable file, a malformed
/// date, or an ambiguous task identity.
pub fn load_progress(
    model: &CostModel,
    ledger: &mut ProgressLedger,
    path: &Path,
) -> Result<usize, LoaderError> {
    let rows = read_rows(path)?;

    let mut current_wp: Option<WorkPackageId> = None;
    let mut loaded = 0;

    for row in &rows {
        match row.get(0).unwrap_or("").trim() {
            "Work package" => {
                let name = row.get(1).unwrap_or("").trim();
                current_wp = model.find_work_package(name)?;
                if current_wp.is_none() {
                    warn!(name, "progress report names an unknown work package");
                }
            },
            "ProgressLine" => {
                let task_name = row.get(TASK_COLUMN).unwrap_or("").trim();
                let task = match current_wp {
                    Some(wp) => model.find_task(task_name, wp)?,
                    None => model.find_task_by_name(task_name)?,
                };
                let Some(task) = task else {
                    warn!(task = task_name, "progress line names an unknown task");
                    continue;
                };

                let date_cell = row.get(DATE_COLUMN).unwrap_or("").trim();
                let date = NaiveDate::parse_from_str(date_cell, PROGRESS_DATE_FORMAT)
                    .map_err(|_| LoaderError::InvalidDate {
                        value: date_cell.to_string(),
                    })?;

                ledger.add(Progress {
                    entity: EntityRef::Task(task),
                    date,
                    planned_fraction: required_number(row, PLANNED_FRACTION_COLUMN),
                    planned_value: required_number(row, PLANNED_VALUE_COLUMN),
                    fraction_complete: optional_number(row, FRACTION_COMPLETE_COLUMN),
                    spend: optional_number(row, SPEND_COLUMN),
                });
                loaded += 1;
            },
            "" => {},
            other => {
                warn!(tag = other, "skipping unrecognized progress row");
            },
        }
    }

    Ok(loaded)
}

/// Planned figures default to zero when absent.
fn required_number(row: &csv::StringRecord, column: usize) -> f64 {
    optional_number(row, column).unwrap_or(0.0)
}

/// Actuals stay absent when the cell is blank, `nan`, or unparsable,
/// leaving the record in the planned state.
fn optional_number(row: &csv::StringRecord, column: usize) -> Option<f64> {
    let value = row.get(column)?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return None;
    }
    value.parse().ok()
}

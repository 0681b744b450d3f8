//! Staff database loader.
//!
//! The staff database is a headed CSV with one row per staff member or
//! post: institute code, staff code, name or post, grade, annual
//! fully-burdened cost, funding source (`CG` marks consolidated grant),
//! and a free-format comment. An unparsable annual cost loads as NaN so
//! the prune pass collects the entry instead of aborting the run.

use std::path::Path;

use tracing::debug;

use super::LoaderError;
use crate::model::{CostModel, FundingSource, Staff};

/// Loads the staff database, returning the number of entries registered.
///
/// Rows with a blank institute or staff code are skipped with a warning
/// (the model would reject them); duplicate identities are accepted here
/// and surface at lookup time.
///
/// # Errors
///
/// Returns [`LoaderError::FileNotFound`] for a missing file and
/// [`LoaderError::Csv`] for unreadable content.
pub fn load_staff_database(model: &mut CostModel, path: &Path) -> Result<usize, LoaderError> {
    if !path.is_file() {
        return Err(LoaderError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut registered = 0;
    for row in reader.records() {
        let row = row?;
        let institute_code = row.get(0).unwrap_or("").trim().to_string();
        let staff_code = row.get(1).unwrap_or("").trim().to_string();
        if institute_code.is_empty() || staff_code.is_empty() {
            tracing::warn!(?row, "skipping staff row without identity");
            continue;
        }

        let entry = Staff {
            institute_code,
            staff_code,
            name_or_post: row.get(2).unwrap_or("").trim().to_string(),
            grade: row.get(3).unwrap_or("").trim().to_string(),
            annual_cost: parse_annual_cost(row.get(4).unwrap_or("")),
            funding_source: FundingSource::from_tag(row.get(5).unwrap_or("")),
            comments: row.get(6).unwrap_or("").trim().to_string(),
        };
        model.add_staff(entry)?;
        registered += 1;
    }

    debug!(registered, path = %path.display(), "staff database loaded");
    Ok(registered)
}

/// Parses the annual-cost cell. The database sometimes carries a
/// trailing `%` on derived figures; an unparsable cell becomes NaN for
/// the prune pass to remove.
fn parse_annual_cost(cell: &str) -> f64 {
    let value = cell.trim().trim_end_matches('%').trim();
    value.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_rows_and_defers_bad_costs_to_prune() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should create");
        writeln!(
            file,
            "Institute code,Staff code,Name or post,Grade,Annual cost,Funding,Comment\n\
             Imperial-Physics,A1,J. Smith,Lecturer,55.5,Project,\n\
             Imperial-Physics,B2,Post TBC,RA,not-a-number,CG,to be hired"
        )
        .expect("temp file should accept writes");

        let mut model = CostModel::new();
        let registered =
            load_staff_database(&mut model, file.path()).expect("database should load");
        assert_eq!(registered, 2);

        let good = model
            .find_staff("Imperial-Physics", "A1")
            .expect("lookup should succeed")
            .expect("entry should exist");
        let good = model.staff(good).expect("entry should be live");
        assert!((good.annual_cost - 55.5).abs() < 1e-12);
        assert_eq!(good.funding_source, FundingSource::Project);

        let bad = model
            .find_staff("Imperial-Physics", "B2")
            .expect("lookup should succeed")
            .expect("entry should exist");
        assert!(model
            .staff(bad)
            .expect("entry should be live")
            .annual_cost
            .is_nan());

        let summary = model.prune();
        assert_eq!(summary.staff, 1);
    }

    #[test]
    fn missing_database_is_fatal() {
        let mut model = CostModel::new();
        let error = load_staff_database(&mut model, Path::new("/nonexistent/staff.csv"))
            .expect_err("missing file should fail");
        assert!(matches!(error, LoaderError::FileNotFound { .. }));
    }
}

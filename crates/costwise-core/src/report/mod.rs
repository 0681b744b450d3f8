//! CSV report emission over the finished object graph.
//!
//! Reports are written after the costing pass and never influence it.
//! One [`ReportSuite`] targets a directory and writes one file per
//! report: the work-package list, a per-work-package summary, the staff
//! list, a per-project staff-effort summary, the project overview, and
//! the earned-value series.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::model::{CostModel, ProjectId, WorkPackageId};
use crate::progress::{
    cost_performance_index, cost_variance, schedule_performance_index, schedule_variance,
    ProgressLedger,
};

/// Errors raised while writing reports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// The report directory could not be created.
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        /// The directory path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A report file could not be written.
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),

    /// A referenced entity is not live in the model.
    #[error("cannot report on {entity}: not live in the model")]
    UnknownEntity {
        /// Description of the entity.
        entity: String,
    },
}

/// Formats a currency or fraction cell.
fn number(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.3}")
    } else {
        String::new()
    }
}

/// Writes the report set for one run into a target directory.
pub struct ReportSuite {
    dir: PathBuf,
}

impl ReportSuite {
    /// Creates a suite targeting `dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::CreateDir`] when the directory cannot be
    /// created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ReportError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes every report for the model: the work-package list, one
    /// summary per work package, the staff list, and per-project the
    /// staff-effort summary, overview, and progress series. Returns the
    /// paths written.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on the first report that fails to write.
    pub fn write_all(
        &self,
        model: &CostModel,
        ledger: &ProgressLedger,
    ) -> Result<Vec<PathBuf>, ReportError> {
        let mut written = Vec::new();
        written.push(self.work_package_list(model)?);
        for (id, _) in model.work_package_entries() {
            written.push(self.work_package_summary(model, id)?);
        }
        written.push(self.staff_list(model)?);
        for (id, _) in model.project_entries() {
            written.push(self.staff_effort_summary(model, id)?);
            written.push(self.overview(model, id)?);
            written.push(self.progress_series(model, ledger, id)?);
        }
        info!(reports = written.len(), dir = %self.dir.display(), "reports written");
        Ok(written)
    }

    /// One row per work package with its headline totals.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] when the file cannot be written.
    pub fn work_package_list(&self, model: &CostModel) -> Result<PathBuf, ReportError> {
        let path = self.dir.join("WorkPackageList.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "Code",
            "Name",
            "Project",
            "Manager",
            "Staff cost",
            "CG staff cost",
            "Equipment cost",
            "Other non-staff cost",
            "Travel",
            "Consumables",
            "Working margin",
            "Inflation",
            "Grand total",
        ])?;
        for (_, wp) in model.work_package_entries() {
            let project = model
                .project(wp.project)
                .map_or(String::new(), |project| project.name.clone());
            writer.write_record([
                wp.code.clone(),
                wp.name.clone(),
                project,
                wp.manager.clone(),
                number(wp.total_staff_cost),
                number(wp.total_cg_staff_cost),
                number(wp.total_equipment_cost),
                number(wp.total_other_non_staff_cost),
                number(wp.total_travel),
                number(wp.total_consumables),
                number(wp.total_working_margin),
                number(wp.total_inflation),
                number(wp.grand_total),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(path)
    }

    /// Per-year cost breakdown for one work package.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownEntity`] for a dead handle and
    /// [`ReportError::Csv`] when the file cannot be written.
    pub fn work_package_summary(
        &self,
        model: &CostModel,
        id: WorkPackageId,
    ) -> Result<PathBuf, ReportError> {
        let wp = model.work_package(id).ok_or_else(|| ReportError::UnknownEntity {
            entity: "work package".to_string(),
        })?;
        let path = self.dir.join(format!("{}.csv", wp.code));
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["Category".to_string()];
        header.extend(wp.financial_years.iter().cloned());
        header.push("Total".to_string());
        writer.write_record(&header)?;

        let lines: [(&str, &[f64], f64); 12] = [
            ("Staff fraction", &wp.staff_fraction_by_year, wp.total_staff_fraction),
            ("Staff cost", &wp.staff_cost_by_year, wp.total_staff_cost),
            ("CG staff cost", &wp.cg_staff_cost_by_year, wp.total_cg_staff_cost),
            ("Equipment", &wp.equipment_cost_by_year, wp.total_equipment_cost),
            (
                "Other non-staff",
                &wp.other_non_staff_cost_by_year,
                wp.total_other_non_staff_cost,
            ),
            ("Travel", &wp.travel_by_year, wp.total_travel),
            ("Consumables", &wp.consumables_by_year, wp.total_consumables),
            ("Inflation", &wp.inflation_by_year, wp.total_inflation),
            ("Working margin", &wp.working_margin_by_year, wp.total_working_margin),
            (
                "Contingency, equipment",
                &wp.contingency.equipment_by_year,
                wp.contingency.totals[0],
            ),
            (
                "Contingency, all staff",
                &wp.contingency.all_staff_by_year,
                wp.contingency.totals[1],
            ),
            (
                "Contingency, CG staff",
                &wp.contingency.cg_staff_by_year,
                wp.contingency.totals[2],
            ),
        ];
        for (label, by_year, total) in lines {
            writer.write_record(summary_line(label, by_year, total, wp.financial_years.len()))?;
        }
        writer.write_record(summary_line(
            "Total",
            &wp.total_cost_by_year,
            wp.grand_total,
            wp.financial_years.len(),
        ))?;
        writer.flush().map_err(csv::Error::from)?;
        Ok(path)
    }

    /// One row per staff entry.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] when the file cannot be written.
    pub fn staff_list(&self, model: &CostModel) -> Result<PathBuf, ReportError> {
        let path = self.dir.join("StaffList.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "Institute code",
            "Staff code",
            "Name or post",
            "Grade",
            "Annual cost",
            "Funding source",
            "Comment",
        ])?;
        for (_, entry) in model.staff_entries() {
            writer.write_record([
                entry.institute_code.clone(),
                entry.staff_code.clone(),
                entry.name_or_post.clone(),
                entry.grade.clone(),
                number(entry.annual_cost),
                entry.funding_source.as_str().to_string(),
                entry.comments.clone(),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(path)
    }

    /// Per-staff effort fraction and cost by year across the project.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownEntity`] for a dead handle and
    /// [`ReportError::Csv`] when the file cannot be written.
    pub fn staff_effort_summary(
        &self,
        model: &CostModel,
        id: ProjectId,
    ) -> Result<PathBuf, ReportError> {
        let project = model.project(id).ok_or_else(|| ReportError::UnknownEntity {
            entity: "project".to_string(),
        })?;
        let years = project.financial_years.len();
        let path = self.dir.join("StaffEffortSummary.csv");
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["Institute".to_string(), "Staff".to_string()];
        for year in &project.financial_years {
            header.push(format!("{year} fraction"));
            header.push(format!("{year} cost"));
        }
        header.push("Total fraction".to_string());
        header.push("Total cost".to_string());
        writer.write_record(&header)?;

        let mut fraction_totals = vec![0.0; years];
        let mut cost_totals = vec![0.0; years];

        for (staff_id, entry) in model.staff_entries() {
            let mut fraction = vec![0.0; years];
            let mut cost = vec![0.0; years];
            let mut contributes = false;
            for (_, link) in model.task_staff_entries().filter(|(_, l)| l.staff == staff_id) {
                contributes = true;
                for (year, value) in link.fraction_by_year.iter().enumerate().take(years) {
                    fraction[year] += value;
                }
                for (year, value) in link.cost_by_year.iter().enumerate().take(years) {
                    cost[year] += value;
                }
            }
            if !contributes {
                continue;
            }

            let mut record = vec![entry.institute_code.clone(), entry.name_or_post.clone()];
            for year in 0..years {
                record.push(number(fraction[year]));
                record.push(number(cost[year]));
                fraction_totals[year] += fraction[year];
                cost_totals[year] += cost[year];
            }
            record.push(number(fraction.iter().sum()));
            record.push(number(cost.iter().sum()));
            writer.write_record(&record)?;
        }

        let mut totals = vec![String::new(), "Staff totals".to_string()];
        for year in 0..years {
            totals.push(number(fraction_totals[year]));
            totals.push(number(cost_totals[year]));
        }
        totals.push(number(fraction_totals.iter().sum()));
        totals.push(number(cost_totals.iter().sum()));
        writer.write_record(&totals)?;
        writer.flush().map_err(csv::Error::from)?;
        Ok(path)
    }

    /// Project overview: per-work-package staff, non-staff, and total
    /// lines, then the grand totals.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownEntity`] for a dead handle and
    /// [`ReportError::Csv`] when the file cannot be written.
    pub fn overview(&self, model: &CostModel, id: ProjectId) -> Result<PathBuf, ReportError> {
        let project = model.project(id).ok_or_else(|| ReportError::UnknownEntity {
            entity: "project".to_string(),
        })?;
        let path = self.dir.join("Overview.csv");
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["Section".to_string(), "Work package".to_string()];
        header.extend(project.financial_years.iter().cloned());
        header.push("Total".to_string());
        writer.write_record(&header)?;

        let members: Vec<_> = model
            .work_package_entries()
            .filter(|(_, wp)| wp.project == id)
            .collect();

        for (_, wp) in &members {
            writer.write_record(overview_line(
                "Staff cost",
                &wp.name,
                &wp.staff_cost_by_year,
                wp.total_staff_cost,
            ))?;
        }
        for (_, wp) in &members {
            let non_staff = wp.total_non_staff_by_year();
            let total = non_staff.iter().sum();
            writer.write_record(overview_line("Non-staff cost", &wp.name, &non_staff, total))?;
        }
        for (_, wp) in &members {
            writer.write_record(overview_line(
                "Total cost",
                &wp.name,
                &wp.total_cost_by_year,
                wp.grand_total,
            ))?;
        }

        let by_year: Vec<f64> = members.iter().fold(
            vec![0.0; project.financial_years.len()],
            |mut acc, (_, wp)| {
                for (slot, value) in acc.iter_mut().zip(&wp.total_cost_by_year) {
                    *slot += value;
                }
                acc
            },
        );
        writer.write_record(overview_line(
            "Grand total",
            &project.name,
            &by_year,
            project.total_cost(),
        ))?;
        writer.flush().map_err(csv::Error::from)?;
        Ok(path)
    }

    /// Project-level progress series: planned value, earned value,
    /// spend, variances, and performance indices per report date.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] when the file cannot be written.
    pub fn progress_series(
        &self,
        model: &CostModel,
        ledger: &ProgressLedger,
        id: ProjectId,
    ) -> Result<PathBuf, ReportError> {
        let path = self.dir.join("ProgressSeries.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "Date",
            "Planned fraction",
            "Fraction complete",
            "Planned value",
            "Earned value",
            "Spend",
            "Schedule variance",
            "Cost variance",
            "Schedule performance index",
            "Cost performance index",
        ])?;

        for (progress, mut earned) in ledger.rollup_project(model, id) {
            let earned_value = earned.value(model, ledger).unwrap_or(f64::NAN);
            let spend = progress.spend.unwrap_or(f64::NAN);
            writer.write_record([
                progress.date.format("%Y-%m-%d").to_string(),
                number(progress.planned_fraction),
                number(progress.fraction_complete.unwrap_or(f64::NAN)),
                number(progress.planned_value),
                number(earned_value),
                number(spend),
                number(schedule_variance(progress.planned_value, earned_value)),
                number(cost_variance(earned_value, spend)),
                number(schedule_performance_index(progress.planned_value, earned_value)),
                number(cost_performance_index(earned_value, spend)),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(path)
    }
}

fn summary_line(label: &str, by_year: &[f64], total: f64, years: usize) -> Vec<String> {
    let mut record = vec![label.to_string()];
    for year in 0..years {
        record.push(number(by_year.get(year).copied().unwrap_or(0.0)));
    }
    record.push(number(total));
    record
}

fn overview_line(section: &str, name: &str, by_year: &[f64], total: f64) -> Vec<String> {
    let mut record = vec![section.to_string(), name.to_string()];
    for value in by_year {
        record.push(number(*value));
    }
    record.push(number(total));
    record
}

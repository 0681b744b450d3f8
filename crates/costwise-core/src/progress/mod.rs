//! Progress tracking and earned-value analysis.
//!
//! Task-level [`Progress`] records are loaded from progress reports; one
//! record captures planned and (once reported) actual completion at a
//! date. Work-package and project-level series are synthesized by
//! [`ProgressLedger::rollup_work_package`] /
//! [`ProgressLedger::rollup_project`]: task records are sorted by
//! `(date, task name)`, consecutive entries are grouped by date, and each
//! date group yields one synthesized record whose completion fractions
//! are arithmetic means and whose values (planned, earned, spend) are
//! sums.
//!
//! A record moves through three informal states: *planned* (no actuals),
//! *reported* (actuals recorded), *valued* (an [`EarnedValue`] computed).
//! Earned value is computed lazily on first request and cached on the
//! instance; an explicitly supplied value always wins over the derived
//! `total_value × fraction_complete`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CostModel, ProjectId, TaskId, WorkPackageId};

/// Errors raised by earned-value computation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    /// The earned value has no associated progress record and no
    /// explicit value.
    #[error("earned value for {entity} has neither a progress record nor an explicit value")]
    MissingProgress {
        /// Description of the entity.
        entity: String,
    },

    /// The associated progress record has no reported completion
    /// fraction yet (still in the planned state).
    #[error("progress for {entity} has no reported completion fraction")]
    NotReported {
        /// Description of the entity.
        entity: String,
    },

    /// The referenced entity is no longer live in the model.
    #[error("entity behind the earned value is not live: {entity}")]
    UnknownEntity {
        /// Description of the entity.
        entity: String,
    },
}

/// Reference to the entity a progress record reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    /// A task.
    Task(TaskId),
    /// A work package.
    WorkPackage(WorkPackageId),
    /// A project.
    Project(ProjectId),
}

impl EntityRef {
    /// Budgeted total value of the entity, if it is live.
    #[must_use]
    pub fn total_value(&self, model: &CostModel) -> Option<f64> {
        match self {
            Self::Task(id) => model.task(*id).map(|task| task.total_value()),
            Self::WorkPackage(id) => model.work_package(*id).map(|wp| wp.total_value()),
            Self::Project(id) => model.project(*id).map(|project| project.total_value()),
        }
    }

    /// Human-readable description for error messages and reports.
    #[must_use]
    pub fn describe(&self, model: &CostModel) -> String {
        match self {
            Self::Task(id) => match model.task(*id) {
                Some(task) => format!("task '{}'", task.name),
                None => format!("task #{}", id.0),
            },
            Self::WorkPackage(id) => match model.work_package(*id) {
                Some(wp) => format!("work package '{}'", wp.name),
                None => format!("work package #{}", id.0),
            },
            Self::Project(id) => match model.project(*id) {
                Some(project) => format!("project '{}'", project.name),
                None => format!("project #{}", id.0),
            },
        }
    }
}

/// Informal lifecycle stage of a progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Planned figures only.
    Planned,
    /// Actual completion and spend recorded.
    Reported,
}

/// One planned-vs-actual observation for an entity at a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// The entity reported on.
    pub entity: EntityRef,
    /// Report date.
    pub date: NaiveDate,
    /// Planned completion fraction at the date.
    pub planned_fraction: f64,
    /// Planned value (budgeted cost of work scheduled) at the date.
    pub planned_value: f64,
    /// Actual completion fraction, once reported.
    pub fraction_complete: Option<f64>,
    /// Actual spend to date, once reported.
    pub spend: Option<f64>,
}

impl Progress {
    /// Current stage of the record.
    #[must_use]
    pub const fn stage(&self) -> ProgressStage {
        if self.fraction_complete.is_some() {
            ProgressStage::Reported
        } else {
            ProgressStage::Planned
        }
    }
}

/// Handle to a [`Progress`] record in a [`ProgressLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressId(pub(crate) usize);

/// An earned-value observation for an entity at a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedValue {
    /// The entity valued.
    pub entity: EntityRef,
    /// Observation date.
    pub date: NaiveDate,
    /// The progress record the value derives from, when not explicit.
    pub progress: Option<ProgressId>,
    explicit: Option<f64>,
    cached: Option<f64>,
}

impl EarnedValue {
    /// Creates an earned value derived from a progress record.
    #[must_use]
    pub const fn new(entity: EntityRef, date: NaiveDate, progress: ProgressId) -> Self {
        Self {
            entity,
            date,
            progress: Some(progress),
            explicit: None,
            cached: None,
        }
    }

    /// Creates an earned value with an explicitly supplied figure.
    #[must_use]
    pub const fn with_value(entity: EntityRef, date: NaiveDate, value: f64) -> Self {
        Self {
            entity,
            date,
            progress: None,
            explicit: Some(value),
            cached: None,
        }
    }

    /// Returns the earned value, computing and caching it on first use.
    ///
    /// An explicit value wins; otherwise the value is the entity's
    /// budgeted total multiplied by the associated record's reported
    /// completion fraction.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError`] when the record is missing, still
    /// unreported, or the entity is no longer live.
    pub fn value(
        &mut self,
        model: &CostModel,
        ledger: &ProgressLedger,
    ) -> Result<f64, ProgressError> {
        if let Some(value) = self.cached {
            return Ok(value);
        }
        let value = match self.explicit {
            Some(value) => value,
            None => {
                let progress = self
                    .progress
                    .and_then(|id| ledger.get(id))
                    .ok_or_else(|| ProgressError::MissingProgress {
                        entity: self.entity.describe(model),
                    })?;
                let fraction =
                    progress
                        .fraction_complete
                        .ok_or_else(|| ProgressError::NotReported {
                            entity: self.entity.describe(model),
                        })?;
                let total = self.entity.total_value(model).ok_or_else(|| {
                    ProgressError::UnknownEntity {
                        entity: self.entity.describe(model),
                    }
                })?;
                total * fraction
            },
        };
        self.cached = Some(value);
        Ok(value)
    }
}

/// Owner of all progress records for one run.
#[derive(Debug, Default)]
pub struct ProgressLedger {
    records: Vec<Progress>,
}

impl ProgressLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its handle.
    pub fn add(&mut self, record: Progress) -> ProgressId {
        self.records.push(record);
        ProgressId(self.records.len() - 1)
    }

    /// Returns the record behind a handle.
    #[must_use]
    pub fn get(&self, id: ProgressId) -> Option<&Progress> {
        self.records.get(id.0)
    }

    /// Iterates all records.
    pub fn records(&self) -> impl Iterator<Item = (ProgressId, &Progress)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (ProgressId(index), record))
    }

    /// Wipes the ledger for an independent run.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Synthesizes the work-package-level progress series from the task
    /// records of that work package.
    pub fn rollup_work_package(
        &self,
        model: &CostModel,
        work_package: WorkPackageId,
    ) -> Vec<(Progress, EarnedValue)> {
        self.rollup(
            model,
            EntityRef::WorkPackage(work_package),
            |task| task.work_package == work_package,
        )
    }

    /// Synthesizes the project-level progress series from the task
    /// records of all the project's work packages.
    pub fn rollup_project(
        &self,
        model: &CostModel,
        project: ProjectId,
    ) -> Vec<(Progress, EarnedValue)> {
        self.rollup(model, EntityRef::Project(project), |task| {
            model
                .work_package(task.work_package)
                .is_some_and(|wp| wp.project == project)
        })
    }

    /// Shared rollup: sort member task records by `(date, task name)`,
    /// group consecutive entries by date, average the fractions and sum
    /// the values per group, and flush the final open group.
    fn rollup(
        &self,
        model: &CostModel,
        target: EntityRef,
        is_member: impl Fn(&crate::model::Task) -> bool,
    ) -> Vec<(Progress, EarnedValue)> {
        let mut member_records: Vec<(&Progress, String, f64)> = self
            .records
            .iter()
            .filter_map(|record| match record.entity {
                EntityRef::Task(task_id) => model
                    .task(task_id)
                    .filter(|task| is_member(task))
                    .map(|task| (record, task.name.clone(), task.total_value())),
                _ => None,
            })
            .collect();
        member_records
            .sort_by(|(a, a_name, _), (b, b_name, _)| (a.date, a_name).cmp(&(b.date, b_name)));

        let mut series = Vec::new();
        let mut group: Vec<(&Progress, f64)> = Vec::new();
        let mut group_date: Option<NaiveDate> = None;

        for (record, _, total_value) in member_records {
            if group_date.is_some_and(|date| date != record.date) {
                if let Some(date) = group_date {
                    series.push(Self::flush_group(target, date, &group));
                }
                group.clear();
            }
            group_date = Some(record.date);
            group.push((record, total_value));
        }
        if let Some(date) = group_date {
            if !group.is_empty() {
                series.push(Self::flush_group(target, date, &group));
            }
        }
        series
    }

    /// Collapses one date group into a synthesized progress record plus
    /// its earned value: fractions are arithmetic means across tasks,
    /// values are sums.
    fn flush_group(
        target: EntityRef,
        date: NaiveDate,
        group: &[(&Progress, f64)],
    ) -> (Progress, EarnedValue) {
        let count = group.len() as f64;
        let planned_fraction =
            group.iter().map(|(record, _)| record.planned_fraction).sum::<f64>() / count;
        let planned_value: f64 = group.iter().map(|(record, _)| record.planned_value).sum();

        let reported: Vec<&(&Progress, f64)> = group
            .iter()
            .filter(|(record, _)| record.fraction_complete.is_some())
            .collect();
        let fraction_complete = if reported.is_empty() {
            None
        } else {
            Some(
                reported
                    .iter()
                    .filter_map(|(record, _)| record.fraction_complete)
                    .sum::<f64>()
                    / reported.len() as f64,
            )
        };
        let spend = if reported.is_empty() {
            None
        } else {
            Some(
                group
                    .iter()
                    .filter_map(|(record, _)| record.spend)
                    .sum::<f64>(),
            )
        };
        let earned: f64 = group
            .iter()
            .filter_map(|(record, total_value)| {
                record
                    .fraction_complete
                    .map(|fraction| total_value * fraction)
            })
            .sum();

        let progress = Progress {
            entity: target,
            date,
            planned_fraction,
            planned_value,
            fraction_complete,
            spend,
        };
        let earned_value = EarnedValue::with_value(target, date, earned);
        (progress, earned_value)
    }
}

/// Schedule variance: earned value minus planned value.
#[must_use]
pub fn schedule_variance(planned_value: f64, earned_value: f64) -> f64 {
    earned_value - planned_value
}

/// Cost variance: earned value minus actual spend.
#[must_use]
pub fn cost_variance(earned_value: f64, spend: f64) -> f64 {
    earned_value - spend
}

/// Schedule performance index: earned over planned value.
#[must_use]
pub fn schedule_performance_index(planned_value: f64, earned_value: f64) -> f64 {
    earned_value / planned_value
}

/// Cost performance index: earned value over actual spend.
#[must_use]
pub fn cost_performance_index(earned_value: f64, spend: f64) -> f64 {
    earned_value / spend
}

#[cfg(test)]
mod tests;

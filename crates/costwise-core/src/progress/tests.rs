//! Progress and earned-value tests.

use chrono::NaiveDate;

use super::*;
use crate::config::EconomicParameters;
use crate::costing;
use crate::model::{CostModel, FundingSource, Project, Staff, Task, WorkPackage};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).expect("test date should be valid")
}

/// One project, one work package, two tasks costed at 25 and 75.
fn costed_model() -> (CostModel, crate::model::WorkPackageId, Vec<crate::model::TaskId>) {
    let mut model = CostModel::new();
    let project = model
        .add_project(Project::new("Demo"))
        .expect("project should register");
    let wp = model
        .add_work_package(WorkPackage::new(
            "WP1",
            "Accelerator",
            project,
            "R. Manager",
            vec!["2025/26".to_string()],
        ))
        .expect("work package should register");

    let mut task_ids = Vec::new();
    for (name, code, fraction) in [("Design", "A1", 0.25), ("Build", "B2", 0.75)] {
        let task = model
            .add_task(Task::new(name, wp))
            .expect("task should register");
        let staff = model
            .add_staff(Staff {
                institute_code: "INST".to_string(),
                staff_code: code.to_string(),
                name_or_post: format!("{name} lead"),
                grade: "Researcher".to_string(),
                annual_cost: 100.0,
                funding_source: FundingSource::Project,
                comments: String::new(),
            })
            .expect("staff should register");
        let link = model
            .link_staff(task, staff)
            .expect("link should register");
        model
            .task_staff_mut(link)
            .expect("link should be accessible")
            .set_fraction_grid(vec![[fraction; 4]]);
        task_ids.push(task);
    }

    costing::run(&mut model, &EconomicParameters::default()).expect("costing should succeed");
    (model, wp, task_ids)
}

#[test]
fn earned_value_derives_from_total_value_and_fraction() {
    let (model, _, tasks) = costed_model();
    let mut ledger = ProgressLedger::new();
    let progress = ledger.add(Progress {
        entity: EntityRef::Task(tasks[0]),
        date: date(1),
        planned_fraction: 0.5,
        planned_value: 12.5,
        fraction_complete: Some(0.4),
        spend: Some(11.0),
    });

    let mut earned = EarnedValue::new(EntityRef::Task(tasks[0]), date(1), progress);
    let value = earned
        .value(&model, &ledger)
        .expect("earned value should compute");
    // Task total value 25 × fraction 0.4.
    assert!((value - 10.0).abs() < 1e-9);

    // Second request hits the cache and still agrees.
    let again = earned
        .value(&model, &ledger)
        .expect("cached earned value should return");
    assert!((again - value).abs() < 1e-12);
}

#[test]
fn explicit_value_wins_over_derivation() {
    let (model, _, tasks) = costed_model();
    let ledger = ProgressLedger::new();
    let mut earned = EarnedValue::with_value(EntityRef::Task(tasks[0]), date(1), 99.0);
    let value = earned
        .value(&model, &ledger)
        .expect("explicit earned value should return");
    assert!((value - 99.0).abs() < 1e-12);
}

#[test]
fn unreported_progress_cannot_be_valued() {
    let (model, _, tasks) = costed_model();
    let mut ledger = ProgressLedger::new();
    let progress = ledger.add(Progress {
        entity: EntityRef::Task(tasks[0]),
        date: date(1),
        planned_fraction: 0.5,
        planned_value: 12.5,
        fraction_complete: None,
        spend: None,
    });

    let mut earned = EarnedValue::new(EntityRef::Task(tasks[0]), date(1), progress);
    let error = earned
        .value(&model, &ledger)
        .expect_err("planned-only record should not value");
    assert!(matches!(error, ProgressError::NotReported { .. }));
}

#[test]
fn stage_tracks_reported_actuals() {
    let planned = Progress {
        entity: EntityRef::Task(crate::model::TaskId(0)),
        date: date(1),
        planned_fraction: 0.5,
        planned_value: 1.0,
        fraction_complete: None,
        spend: None,
    };
    assert_eq!(planned.stage(), ProgressStage::Planned);

    let reported = Progress {
        fraction_complete: Some(0.5),
        spend: Some(0.4),
        ..planned
    };
    assert_eq!(reported.stage(), ProgressStage::Reported);
}

#[test]
fn work_package_rollup_averages_fractions_and_sums_values() {
    let (model, wp, tasks) = costed_model();
    let mut ledger = ProgressLedger::new();
    for (task, fraction, planned, spend) in
        [(tasks[0], 0.2, 10.0, 4.0), (tasks[1], 0.4, 30.0, 28.0)]
    {
        ledger.add(Progress {
            entity: EntityRef::Task(task),
            date: date(1),
            planned_fraction: fraction + 0.1,
            planned_value: planned,
            fraction_complete: Some(fraction),
            spend: Some(spend),
        });
    }

    let series = ledger.rollup_work_package(&model, wp);
    assert_eq!(series.len(), 1);

    let (progress, mut earned) = series.into_iter().next().expect("one date group");
    assert_eq!(progress.entity, EntityRef::WorkPackage(wp));
    // Fractions are arithmetic means: (0.2 + 0.4) / 2.
    assert!((progress.fraction_complete.expect("actuals present") - 0.3).abs() < 1e-9);
    // Values are sums, not means.
    assert!((progress.planned_value - 40.0).abs() < 1e-9);
    assert!((progress.spend.expect("actuals present") - 32.0).abs() < 1e-9);

    // Earned value: 25 × 0.2 + 75 × 0.4.
    let value = earned
        .value(&model, &ledger)
        .expect("synthesized earned value should return");
    assert!((value - 35.0).abs() < 1e-9);
}

#[test]
fn rollup_emits_one_record_per_date_and_flushes_the_last_group() {
    let (model, wp, tasks) = costed_model();
    let mut ledger = ProgressLedger::new();
    // Deliberately out of order; the rollup sorts by (date, task name).
    for (task, day) in [(tasks[1], 8), (tasks[0], 1), (tasks[1], 1), (tasks[0], 8)] {
        ledger.add(Progress {
            entity: EntityRef::Task(task),
            date: date(day),
            planned_fraction: 0.5,
            planned_value: 10.0,
            fraction_complete: Some(0.5),
            spend: Some(5.0),
        });
    }

    let series = ledger.rollup_work_package(&model, wp);
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].0.date, date(1));
    assert_eq!(series[1].0.date, date(8));
    for (progress, _) in &series {
        assert!((progress.planned_value - 20.0).abs() < 1e-9);
    }
}

#[test]
fn project_rollup_spans_all_work_packages() {
    let (model, _, tasks) = costed_model();
    let project = model
        .project_entries()
        .next()
        .map(|(id, _)| id)
        .expect("project should exist");

    let mut ledger = ProgressLedger::new();
    for task in &tasks {
        ledger.add(Progress {
            entity: EntityRef::Task(*task),
            date: date(1),
            planned_fraction: 0.5,
            planned_value: 10.0,
            fraction_complete: Some(0.5),
            spend: Some(5.0),
        });
    }

    let series = ledger.rollup_project(&model, project);
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].0.entity, EntityRef::Project(project));
    // Both tasks report 0.5 on the same date.
    assert!((series[0].0.fraction_complete.expect("actuals present") - 0.5).abs() < 1e-9);
}

#[test]
fn variance_and_index_arithmetic() {
    assert!((schedule_variance(40.0, 35.0) - (-5.0)).abs() < 1e-12);
    assert!((cost_variance(35.0, 32.0) - 3.0).abs() < 1e-12);
    assert!((schedule_performance_index(40.0, 35.0) - 0.875).abs() < 1e-12);
    assert!((cost_performance_index(35.0, 32.0) - 35.0 / 32.0).abs() < 1e-12);
}

//! Store-level tests: registration, unique lookup, links, prune, reset.

use super::*;

fn staff_entry(institute: &str, code: &str, annual_cost: f64) -> Staff {
    Staff {
        institute_code: institute.to_string(),
        staff_code: code.to_string(),
        name_or_post: format!("{code} holder"),
        grade: "Researcher".to_string(),
        annual_cost,
        funding_source: FundingSource::Project,
        comments: String::new(),
    }
}

fn model_with_work_package() -> (CostModel, ProjectId, WorkPackageId) {
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
            vec!["2024/25".to_string(), "2025/26".to_string()],
        ))
        .expect("work package should register");
    (model, project, wp)
}

#[test]
fn find_returns_none_for_no_match() {
    let model = CostModel::new();
    let found = model
        .find_staff("INST", "A1")
        .expect("lookup over empty store should succeed");
    assert!(found.is_none());
}

#[test]
fn find_returns_single_match() {
    let mut model = CostModel::new();
    let id = model
        .add_staff(staff_entry("INST", "A1", 50.0))
        .expect("staff should register");
    let found = model
        .find_staff("INST", "A1")
        .expect("unambiguous lookup should succeed");
    assert_eq!(found, Some(id));
}

#[test]
fn duplicate_identity_is_a_lookup_error() {
    let mut model = CostModel::new();
    model
        .add_staff(staff_entry("INST", "A1", 50.0))
        .expect("first entry should register");
    model
        .add_staff(staff_entry("INST", "A1", 60.0))
        .expect("second entry should register");

    let error = model
        .find_staff("INST", "A1")
        .expect_err("ambiguous lookup should fail");
    assert!(matches!(
        error,
        LookupError::Duplicate { kind: "staff", count: 2, .. }
    ));
}

#[test]
fn blank_staff_code_is_rejected_at_registration() {
    let mut model = CostModel::new();
    let error = model
        .add_staff(staff_entry("INST", "", 50.0))
        .expect_err("blank staff code should be rejected");
    assert!(matches!(error, ModelError::MissingIdentity { .. }));
}

#[test]
fn link_requires_live_referents() {
    let (mut model, _, wp) = model_with_work_package();
    let task = model
        .add_task(Task::new("Design", wp))
        .expect("task should register");

    let error = model
        .link_staff(task, StaffId(99))
        .expect_err("dangling staff handle should be rejected");
    assert!(matches!(error, ModelError::UnknownStaff { index: 99 }));

    let error = model
        .link_equipment(TaskId(99), EquipmentId(0))
        .expect_err("dangling task handle should be rejected");
    assert!(matches!(error, ModelError::UnknownTask { index: 99 }));
}

#[test]
fn duplicate_link_is_rejected() {
    let (mut model, _, wp) = model_with_work_package();
    let task = model
        .add_task(Task::new("Design", wp))
        .expect("task should register");
    let staff = model
        .add_staff(staff_entry("INST", "A1", 50.0))
        .expect("staff should register");

    model
        .link_staff(task, staff)
        .expect("first link should succeed");
    let error = model
        .link_staff(task, staff)
        .expect_err("second link for the same pair should fail");
    assert!(matches!(error, ModelError::DuplicateLink { kind: "task-staff", .. }));
}

#[test]
fn same_task_name_may_recur_in_different_work_packages() {
    let (mut model, project, wp_a) = model_with_work_package();
    let wp_b = model
        .add_work_package(WorkPackage::new(
            "WP2",
            "Beamline",
            project,
            "S. Manager",
            vec!["2024/25".to_string(), "2025/26".to_string()],
        ))
        .expect("second work package should register");

    let task_a = model
        .add_task(Task::new("Design", wp_a))
        .expect("task in first work package should register");
    let task_b = model
        .add_task(Task::new("Design", wp_b))
        .expect("task in second work package should register");

    assert_eq!(
        model.find_task("Design", wp_a).expect("scoped lookup should succeed"),
        Some(task_a)
    );
    assert_eq!(
        model.find_task("Design", wp_b).expect("scoped lookup should succeed"),
        Some(task_b)
    );
    let error = model
        .find_task_by_name("Design")
        .expect_err("unscoped lookup should be ambiguous");
    assert!(matches!(error, LookupError::Duplicate { .. }));
}

#[test]
fn prune_removes_nan_staff_and_keeps_handles_stable() {
    let mut model = CostModel::new();
    let good = model
        .add_staff(staff_entry("INST", "A1", 50.0))
        .expect("valid staff should register");
    model
        .add_staff(staff_entry("INST", "B2", f64::NAN))
        .expect("NaN staff should register (pruned later)");

    let summary = model.prune();
    assert_eq!(summary.staff, 1);
    assert_eq!(summary.total(), 1);
    assert!(model.staff(good).is_some());
    assert_eq!(model.staff_entries().count(), 1);
}

#[test]
fn prune_cascades_to_links_of_removed_staff() {
    let (mut model, _, wp) = model_with_work_package();
    let task = model
        .add_task(Task::new("Design", wp))
        .expect("task should register");
    let bad_staff = model
        .add_staff(staff_entry("INST", "B2", f64::NAN))
        .expect("NaN staff should register");
    let link = model
        .link_staff(task, bad_staff)
        .expect("link should register");
    model
        .task_staff_mut(link)
        .expect("link should be accessible")
        .set_fraction_grid(vec![[0.25; 4], [0.25; 4]]);

    let summary = model.prune();
    assert_eq!(summary.staff, 1);
    assert_eq!(summary.task_staff, 1);
    assert!(model.task_staff(link).is_none());
    assert!(model.task(task).is_some());
}

#[test]
fn prune_removes_links_without_effort_grids() {
    let (mut model, _, wp) = model_with_work_package();
    let task = model
        .add_task(Task::new("Design", wp))
        .expect("task should register");
    let staff = model
        .add_staff(staff_entry("INST", "A1", 50.0))
        .expect("staff should register");
    model.link_staff(task, staff).expect("link should register");

    let summary = model.prune();
    assert_eq!(summary.task_staff, 1);
}

#[test]
fn prune_removes_equipment_without_cost_vectors() {
    let mut model = CostModel::new();
    model.add_equipment(Equipment::new("Bare item"));
    let mut priced = Equipment::new("Priced item");
    priced.set_cost_by_year(vec![5.0]);
    let priced = model.add_equipment(priced);

    let summary = model.prune();
    assert_eq!(summary.equipment, 1);
    assert!(model.equipment(priced).is_some());
}

#[test]
fn reset_empties_every_collection() {
    let (mut model, _, wp) = model_with_work_package();
    model
        .add_task(Task::new("Design", wp))
        .expect("task should register");
    model
        .add_staff(staff_entry("INST", "A1", 50.0))
        .expect("staff should register");

    model.reset();
    assert_eq!(model.staff_entries().count(), 0);
    assert_eq!(model.task_entries().count(), 0);
    assert_eq!(model.work_package_entries().count(), 0);
    assert_eq!(model.project_entries().count(), 0);
    assert!(model
        .find_staff("INST", "A1")
        .expect("lookup after reset should succeed")
        .is_none());
}

#[test]
fn institutes_are_distinct_in_first_seen_order() {
    let mut model = CostModel::new();
    for (institute, code) in [("B-Inst", "A1"), ("A-Inst", "B2"), ("B-Inst", "C3")] {
        model
            .add_staff(staff_entry(institute, code, 40.0))
            .expect("staff should register");
    }
    assert_eq!(model.institutes(), vec!["B-Inst".to_string(), "A-Inst".to_string()]);
}

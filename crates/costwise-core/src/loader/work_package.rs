//! Work-package definition loader.
//!
//! A definition file is the work-package manager's template: one row per
//! fact, dispatched on the first cell. Recognized tags are `Project`,
//! `Work package`, `Manager`, `Years` (labels until a `Total` sentinel),
//! `Task`, `Institute`, `Staff` (a four-column-per-year quarterly effort
//! grid at a fixed offset), `Equipment`, `OtherNonStaff`, `Consume`, and
//! `Travel`. Structural markers (`EndStaff`, `NonStaffHd`, `EquipEnd`,
//! `RiskMitigationEquip`, `TotalEquip`, `NonStaffEnd`, `Flag`) and blank
//! rows are skipped silently; anything else is skipped with a warning.

use std::path::Path;

use tracing::warn;

use super::{parse_cost, read_rows, LoaderError};
use crate::model::{
    CostModel, Equipment, FundingSource, OtherNonStaff, Project, Staff, Task, TaskId,
    WorkPackage, WorkPackageId, QUARTERS_PER_YEAR,
};

/// Column holding the first per-year cost cell.
const COST_COLUMN: usize = 2;
/// Column holding the first quarterly effort cell of a `Staff` row.
const STAFF_GRID_COLUMN: usize = 9;
/// Column holding the manager name on a `Manager` row.
const MANAGER_COLUMN: usize = 2;

/// Row tags that structure the template but carry no data.
const STRUCTURAL_TAGS: &[&str] = &[
    "EndStaff",
    "NonStaffHd",
    "EquipEnd",
    "RiskMitigationEquip",
    "TotalEquip",
    "NonStaffEnd",
    "Flag",
];

/// Loads one work-package definition file into the model.
///
/// The project named in the file is created on first sight; staff
/// referenced but absent from the staff database are registered as
/// placeholder entries and picked out by their comment.
///
/// # Errors
///
/// Returns [`LoaderError`] when the file is missing, lacks its
/// `Work package` or `Years` row, a recognized cell is malformed, or an
/// identity in the file is ambiguous in the model.
pub fn load_work_package(
    model: &mut CostModel,
    path: &Path,
) -> Result<WorkPackageId, LoaderError> {
    let rows = read_rows(path)?;

    // Header pass: everything needed to register the work package.
    let mut project_name = None;
    let mut wp_name = None;
    let mut manager = String::new();
    let mut years: Option<Vec<String>> = None;

    for row in &rows {
        match row.get(0).unwrap_or("").trim() {
            "Project" => project_name = row.get(1).map(|cell| cell.trim().to_string()),
            "Work package" => wp_name = row.get(1).map(|cell| cell.trim().to_string()),
            "Manager" => {
                manager = row
                    .get(MANAGER_COLUMN)
                    .unwrap_or("")
                    .trim()
                    .to_string();
            },
            "Years" => years = Some(parse_years(row)),
            _ => {},
        }
    }

    let project_name = project_name.ok_or_else(|| LoaderError::MissingRow {
        tag: "Project",
        path: path.display().to_string(),
    })?;
    let wp_name = wp_name.ok_or_else(|| LoaderError::MissingRow {
        tag: "Work package",
        path: path.display().to_string(),
    })?;
    let years = years.ok_or_else(|| LoaderError::MissingRow {
        tag: "Years",
        path: path.display().to_string(),
    })?;

    let project = match model.find_project(&project_name)? {
        Some(id) => id,
        None => model.add_project(Project::new(project_name))?,
    };
    let code = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| wp_name.clone());
    let wp = model.add_work_package(WorkPackage::new(
        code,
        wp_name,
        project,
        manager,
        years.clone(),
    ))?;

    // Body pass: tasks, staff effort, and the cost categories.
    let n_years = years.len();
    let mut current_task: Option<TaskId> = None;
    let mut current_institute = String::new();
    let mut travel = vec![0.0; n_years];
    let mut consumables = vec![0.0; n_years];

    for row in &rows {
        let tag = row.get(0).unwrap_or("").trim();
        match tag {
            "Project" | "Work package" | "Manager" | "Years" => {},
            "Task" => {
                let name = row.get(1).unwrap_or("").trim();
                current_task = Some(match model.find_task(name, wp)? {
                    Some(id) => id,
                    None => model.add_task(Task::new(name, wp))?,
                });
            },
            "Institute" => {
                current_institute = row.get(1).unwrap_or("").trim().to_string();
            },
            "Staff" => {
                let Some(task) = current_task else {
                    warn!(row = ?row.get(1), "skipping Staff row before any Task row");
                    continue;
                };
                load_staff_row(model, row, task, &current_institute, n_years)?;
            },
            "Equipment" => {
                let Some(task) = current_task else {
                    warn!(row = ?row.get(1), "skipping Equipment row before any Task row");
                    continue;
                };
                let name = row.get(1).unwrap_or("").trim();
                let costs = parse_cost_cells(row, n_years, tag)?;
                let equipment = match model.find_equipment(name)? {
                    Some(id) => id,
                    None => model.add_equipment(Equipment::new(name)),
                };
                if let Some(item) = model.equipment_mut(equipment) {
                    item.set_cost_by_year(costs);
                }
                if model.find_task_equipment(task, equipment)?.is_none() {
                    model.link_equipment(task, equipment)?;
                }
            },
            "OtherNonStaff" => {
                let name = row.get(1).unwrap_or("").trim();
                let costs = parse_cost_cells(row, n_years, tag)?;
                // Other-non-staff spend also counts as consumables.
                for (slot, cost) in consumables.iter_mut().zip(&costs) {
                    *slot += cost;
                }
                let mut item = OtherNonStaff::new(name, wp);
                item.set_cost_by_year(costs);
                model.add_other_non_staff(item)?;
            },
            "Consume" => {
                let costs = parse_cost_cells(row, n_years, tag)?;
                for (slot, cost) in consumables.iter_mut().zip(&costs) {
                    *slot += cost;
                }
            },
            "Travel" => {
                let costs = parse_cost_cells(row, n_years, tag)?;
                for (slot, cost) in travel.iter_mut().zip(&costs) {
                    *slot += cost;
                }
            },
            "" => {},
            _ if STRUCTURAL_TAGS.contains(&tag) => {},
            other => {
                warn!(tag = other, "skipping unrecognized definition row");
            },
        }
    }

    if let Some(entry) = model.work_package_mut(wp) {
        entry.travel_by_year = travel;
        entry.consumables_by_year = consumables;
    }
    Ok(wp)
}

/// Reads year labels from a `Years` row: cells from the cost column up
/// to the `Total` sentinel (or the end of the row).
fn parse_years(row: &csv::StringRecord) -> Vec<String> {
    let mut years = Vec::new();
    let mut column = COST_COLUMN;
    while let Some(cell) = row.get(column) {
        let label = cell.trim();
        if label == "Total" || label.is_empty() {
            break;
        }
        years.push(label.to_string());
        column += 1;
    }
    years
}

/// Reads one per-year cost vector starting at the cost column.
fn parse_cost_cells(
    row: &csv::StringRecord,
    n_years: usize,
    tag: &str,
) -> Result<Vec<f64>, LoaderError> {
    (0..n_years)
        .map(|year| parse_cost(row.get(COST_COLUMN + year), tag))
        .collect()
}

/// Applies one `Staff` row: resolve (or fabricate) the staff entry, link
/// it to the current task, and fill the quarterly effort grid.
fn load_staff_row(
    model: &mut CostModel,
    row: &csv::StringRecord,
    task: TaskId,
    institute: &str,
    n_years: usize,
) -> Result<(), LoaderError> {
    let staff_code = row.get(1).unwrap_or("").trim().to_string();
    let institute = if institute.is_empty() {
        "Unattributed"
    } else {
        institute
    };

    let staff = match model.find_staff(institute, &staff_code)? {
        Some(id) => id,
        None => model.add_staff(Staff {
            institute_code: institute.to_string(),
            staff_code: staff_code.clone(),
            name_or_post: staff_code.clone(),
            grade: "Unknown".to_string(),
            annual_cost: 100.0,
            funding_source: FundingSource::Project,
            comments: "placeholder: referenced by a work-package definition, \
                       not present in the staff database"
                .to_string(),
        })?,
    };

    let link = match model.find_task_staff(task, staff)? {
        Some(id) => id,
        None => model.link_staff(task, staff)?,
    };

    let mut grid = Vec::with_capacity(n_years);
    for year in 0..n_years {
        let mut quarters = [0.0; QUARTERS_PER_YEAR];
        for (quarter, slot) in quarters.iter_mut().enumerate() {
            *slot = parse_cost(
                row.get(STAFF_GRID_COLUMN + QUARTERS_PER_YEAR * year + quarter),
                "Staff",
            )?;
        }
        grid.push(quarters);
    }
    if let Some(entry) = model.task_staff_mut(link) {
        entry.set_fraction_grid(grid);
    }
    Ok(())
}

//! The bottom-up costing pass.
//!
//! One call to [`run`] takes the populated model through a fixed,
//! topologically ordered pipeline:
//!
//! 1. prune entries that cannot be costed ([`CostModel::prune`]);
//! 2. cost every task-staff link (annual cost × annual effort fraction);
//! 3. aggregate links into tasks (with the consolidated-grant split);
//! 4. roll tasks and owned cost items up into work packages and apply
//!    the financial adjustments (inflation, working margin, contingency);
//! 5. roll work packages up into projects.
//!
//! Each stage reads only the output of earlier stages, so a single pass
//! is complete and order-independent within a stage. A financial-year
//! inconsistency anywhere aborts the whole pass; there is no partial
//! re-costing.

use thiserror::Error;
use tracing::info;

use crate::config::EconomicParameters;
use crate::model::{CostModel, FundingSource, PruneSummary, ProjectId, TaskId, WorkPackageId};

/// Fatal errors aborting a costing pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CostingError {
    /// An entity's per-year vectors disagree with its owner's
    /// financial-year list. Not recoverable: the run must abort.
    #[error(
        "inconsistent financial years: {entity} carries {actual} where {owner} expects {expected}"
    )]
    InconsistentFinancialYears {
        /// The offending entity (task, cost item, or work package).
        entity: String,
        /// The owner whose financial-year list is authoritative.
        owner: String,
        /// The owner's expectation (a year count or label list).
        expected: String,
        /// What the entity actually carries.
        actual: String,
    },
}

/// Runs the full costing pass over the model.
///
/// Returns the prune summary so callers can report how many entries were
/// dropped before costing.
///
/// # Errors
///
/// Returns [`CostingError::InconsistentFinancialYears`] when any task,
/// cost item, or work package disagrees with its owner's financial-year
/// list. The model is left partially costed; callers must treat the run
/// as failed.
pub fn run(
    model: &mut CostModel,
    params: &EconomicParameters,
) -> Result<PruneSummary, CostingError> {
    let pruned = model.prune();

    cost_task_staff(model);
    cost_tasks(model);
    cost_work_packages(model, params)?;
    cost_projects(model)?;

    info!(
        pruned = pruned.total(),
        tasks = model.task_entries().count(),
        work_packages = model.work_package_entries().count(),
        projects = model.project_entries().count(),
        "costing pass complete"
    );
    Ok(pruned)
}

/// Adds `values` element-wise into `acc`, growing the accumulator with
/// zeros when a contributor is longer (zero-initialize on first
/// contributor).
fn accumulate(acc: &mut Vec<f64>, values: &[f64]) {
    if acc.len() < values.len() {
        acc.resize(values.len(), 0.0);
    }
    for (slot, value) in acc.iter_mut().zip(values) {
        *slot += value;
    }
}

/// Stage 2: per-link staff cost from the staff member's annual cost.
fn cost_task_staff(model: &mut CostModel) {
    let annual_costs: Vec<_> = model
        .task_staff_entries()
        .filter_map(|(id, link)| {
            model
                .staff(link.staff)
                .map(|staff| (id, staff.annual_cost))
        })
        .collect();

    for (id, annual_cost) in annual_costs {
        if let Some(link) = model.task_staff_mut(id) {
            link.compute_cost(annual_cost);
        }
    }
}

/// Stage 3: aggregate links into their tasks.
///
/// Consolidated-grant links count fully in the staff totals and again in
/// the separate CG totals. Tasks with no links keep empty vectors.
fn cost_tasks(model: &mut CostModel) {
    let task_ids: Vec<TaskId> = model.task_entries().map(|(id, _)| id).collect();

    for task_id in task_ids {
        let mut staff_fraction = Vec::new();
        let mut staff_cost = Vec::new();
        let mut cg_staff_cost = Vec::new();
        let mut equipment_cost = Vec::new();

        for (_, link) in model.task_staff_entries().filter(|(_, l)| l.task == task_id) {
            accumulate(&mut staff_fraction, &link.fraction_by_year);
            accumulate(&mut staff_cost, &link.cost_by_year);
            let is_cg = model
                .staff(link.staff)
                .is_some_and(|staff| staff.funding_source == FundingSource::ConsolidatedGrant);
            if is_cg {
                accumulate(&mut cg_staff_cost, &link.cost_by_year);
            } else if cg_staff_cost.len() < link.cost_by_year.len() {
                // Keep the CG vector shaped like the staff vector even
                // when only project-funded links contribute.
                cg_staff_cost.resize(link.cost_by_year.len(), 0.0);
            }
        }

        for (_, link) in model
            .task_equipment_entries()
            .filter(|(_, l)| l.task == task_id)
        {
            if let Some(item) = model.equipment(link.equipment) {
                accumulate(&mut equipment_cost, &item.cost_by_year);
            }
        }

        if let Some(task) = model.task_mut(task_id) {
            task.total_staff_fraction = staff_fraction.iter().sum();
            task.total_staff_cost = staff_cost.iter().sum();
            task.total_cg_staff_cost = cg_staff_cost.iter().sum();
            task.total_equipment_cost = equipment_cost.iter().sum();
            task.staff_fraction_by_year = staff_fraction;
            task.staff_cost_by_year = staff_cost;
            task.cg_staff_cost_by_year = cg_staff_cost;
            task.equipment_cost_by_year = equipment_cost;
        }
    }
}

/// Checks a contributing per-year vector against the owner's year count.
///
/// Empty vectors mean "no contribution" and are always accepted.
fn check_years(
    values: &[f64],
    entity: &str,
    owner: &str,
    expected: usize,
) -> Result<(), CostingError> {
    if !values.is_empty() && values.len() != expected {
        return Err(CostingError::InconsistentFinancialYears {
            entity: entity.to_string(),
            owner: owner.to_string(),
            expected: format!("{expected} financial years"),
            actual: format!("{} cost years", values.len()),
        });
    }
    Ok(())
}

/// Stage 4: work-package rollup and financial adjustments.
fn cost_work_packages(
    model: &mut CostModel,
    params: &EconomicParameters,
) -> Result<(), CostingError> {
    let wp_ids: Vec<WorkPackageId> = model.work_package_entries().map(|(id, _)| id).collect();

    for wp_id in wp_ids {
        let (wp_name, years) = {
            let wp = match model.work_package(wp_id) {
                Some(wp) => wp,
                None => continue,
            };
            (wp.name.clone(), wp.financial_years.len())
        };

        let mut staff_fraction = vec![0.0; years];
        let mut staff_cost = vec![0.0; years];
        let mut cg_staff_cost = vec![0.0; years];
        let mut equipment_cost = vec![0.0; years];
        let mut other_non_staff = vec![0.0; years];

        for (_, task) in model.task_entries().filter(|(_, t)| t.work_package == wp_id) {
            check_years(&task.staff_cost_by_year, &task.name, &wp_name, years)?;
            check_years(&task.equipment_cost_by_year, &task.name, &wp_name, years)?;
            accumulate(&mut staff_fraction, &task.staff_fraction_by_year);
            accumulate(&mut staff_cost, &task.staff_cost_by_year);
            accumulate(&mut cg_staff_cost, &task.cg_staff_cost_by_year);
            accumulate(&mut equipment_cost, &task.equipment_cost_by_year);
        }

        for (_, item) in model
            .other_non_staff_entries()
            .filter(|(_, i)| i.work_package == wp_id)
        {
            check_years(&item.cost_by_year, &item.name, &wp_name, years)?;
            accumulate(&mut other_non_staff, &item.cost_by_year);
        }

        // Inflation compounds from year index 0 but only applies once the
        // start year is reached: the exponent is the array index, not the
        // offset from the start year, so the first applied year jumps.
        let inflation: Vec<f64> = (0..years)
            .map(|year| {
                if year < params.inflation_start_year {
                    0.0
                } else {
                    ((1.0 + params.inflation_capital_rate).powi(year as i32) - 1.0)
                        * equipment_cost[year]
                        + ((1.0 + params.inflation_staff_rate).powi(year as i32) - 1.0)
                            * staff_cost[year]
                }
            })
            .collect();

        // Working margin applies to every year at this level; the
        // configured start year is not consulted here.
        let working_margin: Vec<f64> = (0..years)
            .map(|year| (staff_cost[year] + equipment_cost[year]) * params.working_margin_rate)
            .collect();

        let contingency_equipment: Vec<f64> = equipment_cost
            .iter()
            .map(|cost| cost * params.contingency_material_rate)
            .collect();
        let contingency_all_staff: Vec<f64> = (0..years)
            .map(|year| {
                (staff_cost[year] - cg_staff_cost[year]) * params.contingency_staff_project_rate
                    + cg_staff_cost[year] * params.contingency_staff_cg_rate
            })
            .collect();
        let contingency_cg_staff: Vec<f64> = cg_staff_cost
            .iter()
            .map(|cost| cost * params.contingency_staff_cg_rate)
            .collect();

        let Some(wp) = model.work_package_mut(wp_id) else {
            continue;
        };

        // The CG contingency is already inside the all-staff vector and
        // is not added again; inflation is reported but not folded in.
        let total_cost: Vec<f64> = (0..years)
            .map(|year| {
                staff_cost[year]
                    + equipment_cost[year]
                    + other_non_staff[year]
                    + wp.travel_by_year[year]
                    + wp.consumables_by_year[year]
                    + working_margin[year]
                    + contingency_equipment[year]
                    + contingency_all_staff[year]
            })
            .collect();

        wp.total_staff_fraction = staff_fraction.iter().sum();
        wp.total_staff_cost = staff_cost.iter().sum();
        wp.total_cg_staff_cost = cg_staff_cost.iter().sum();
        wp.total_equipment_cost = equipment_cost.iter().sum();
        wp.total_other_non_staff_cost = other_non_staff.iter().sum();
        wp.total_travel = wp.travel_by_year.iter().sum();
        wp.total_consumables = wp.consumables_by_year.iter().sum();
        wp.total_inflation = inflation.iter().sum();
        wp.total_working_margin = working_margin.iter().sum();
        wp.contingency.totals = [
            contingency_equipment.iter().sum(),
            contingency_all_staff.iter().sum(),
            contingency_cg_staff.iter().sum(),
        ];
        wp.grand_total = total_cost.iter().sum();

        wp.staff_fraction_by_year = staff_fraction;
        wp.staff_cost_by_year = staff_cost;
        wp.cg_staff_cost_by_year = cg_staff_cost;
        wp.equipment_cost_by_year = equipment_cost;
        wp.other_non_staff_cost_by_year = other_non_staff;
        wp.inflation_by_year = inflation;
        wp.working_margin_by_year = working_margin;
        wp.contingency.equipment_by_year = contingency_equipment;
        wp.contingency.all_staff_by_year = contingency_all_staff;
        wp.contingency.cg_staff_by_year = contingency_cg_staff;
        wp.total_cost_by_year = total_cost;
    }

    Ok(())
}

/// Stage 5: project rollup.
fn cost_projects(model: &mut CostModel) -> Result<(), CostingError> {
    let project_ids: Vec<ProjectId> = model.project_entries().map(|(id, _)| id).collect();

    for project_id in project_ids {
        let project_name = match model.project(project_id) {
            Some(project) => project.name.clone(),
            None => continue,
        };

        let mut financial_years: Vec<String> = Vec::new();
        let mut staff_cost = Vec::new();
        let mut cg_staff_cost = Vec::new();
        let mut equipment_cost = Vec::new();
        let mut other_non_staff = Vec::new();
        let mut travel_consumables = Vec::new();
        let mut inflation = Vec::new();
        let mut working_margin = Vec::new();
        let mut contingency_equipment = Vec::new();
        let mut contingency_all_staff = Vec::new();
        let mut contingency_cg_staff = Vec::new();
        let mut grand_total = 0.0;

        for (_, wp) in model
            .work_package_entries()
            .filter(|(_, wp)| wp.project == project_id)
        {
            if financial_years.is_empty() {
                financial_years = wp.financial_years.clone();
            } else if financial_years != wp.financial_years {
                return Err(CostingError::InconsistentFinancialYears {
                    entity: wp.name.clone(),
                    owner: project_name,
                    expected: financial_years.join("|"),
                    actual: wp.financial_years.join("|"),
                });
            }

            accumulate(&mut staff_cost, &wp.staff_cost_by_year);
            accumulate(&mut cg_staff_cost, &wp.cg_staff_cost_by_year);
            accumulate(&mut equipment_cost, &wp.equipment_cost_by_year);
            accumulate(&mut other_non_staff, &wp.other_non_staff_cost_by_year);
            accumulate(&mut travel_consumables, &wp.travel_by_year);
            accumulate(&mut travel_consumables, &wp.consumables_by_year);
            accumulate(&mut inflation, &wp.inflation_by_year);
            accumulate(&mut working_margin, &wp.working_margin_by_year);
            accumulate(&mut contingency_equipment, &wp.contingency.equipment_by_year);
            accumulate(&mut contingency_all_staff, &wp.contingency.all_staff_by_year);
            accumulate(&mut contingency_cg_staff, &wp.contingency.cg_staff_by_year);
            grand_total += wp.grand_total;
        }

        if let Some(project) = model.project_mut(project_id) {
            project.total_staff_cost = staff_cost.iter().sum();
            project.total_cg_staff_cost = cg_staff_cost.iter().sum();
            project.total_equipment_cost = equipment_cost.iter().sum();
            project.total_other_non_staff_cost = other_non_staff.iter().sum();
            project.total_travel_consumables = travel_consumables.iter().sum();
            project.total_inflation = inflation.iter().sum();
            project.total_working_margin = working_margin.iter().sum();
            project.contingency.totals = [
                contingency_equipment.iter().sum(),
                contingency_all_staff.iter().sum(),
                contingency_cg_staff.iter().sum(),
            ];
            project.grand_total = grand_total;

            project.financial_years = financial_years;
            project.staff_cost_by_year = staff_cost;
            project.cg_staff_cost_by_year = cg_staff_cost;
            project.equipment_cost_by_year = equipment_cost;
            project.other_non_staff_cost_by_year = other_non_staff;
            project.travel_consumables_cost_by_year = travel_consumables;
            project.inflation_by_year = inflation;
            project.working_margin_by_year = working_margin;
            project.contingency.equipment_by_year = contingency_equipment;
            project.contingency.all_staff_by_year = contingency_all_staff;
            project.contingency.cg_staff_by_year = contingency_cg_staff;
        }
    }

    Ok(())
}

//! Work packages: the budget grouping at which financial adjustments are
//! applied.

use serde::{Deserialize, Serialize};

use super::ProjectId;

/// The three contingency vectors computed per work package.
///
/// The all-staff vector already contains the CG-staff share; the CG
/// vector isolates that share for reporting and is never added into the
/// total on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contingency {
    /// Contingency per year on equipment cost (material rate).
    pub equipment_by_year: Vec<f64>,
    /// Contingency per year on all staff cost (project rate on
    /// project-funded staff, CG rate on CG-funded staff).
    pub all_staff_by_year: Vec<f64>,
    /// Contingency per year on CG staff cost alone.
    pub cg_staff_by_year: Vec<f64>,
    /// Sums of the three vectors, in the same order.
    pub totals: [f64; 3],
}

/// A budget/management grouping of tasks within a project.
///
/// Summation fields are derived from the work package's tasks and
/// other-non-staff items during the costing pass; travel and consumables
/// are populated at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPackage {
    /// Short code used for report file names.
    pub code: String,
    /// Work-package name.
    pub name: String,
    /// Owning project.
    pub project: ProjectId,
    /// Work-package manager(s).
    pub manager: String,
    /// Ordered financial-year labels. Must be identical across all work
    /// packages of a project; a mismatch is a fatal consistency error.
    pub financial_years: Vec<String>,
    /// Summed staff effort fraction per year across tasks.
    pub staff_fraction_by_year: Vec<f64>,
    /// Summed staff cost per year across tasks.
    pub staff_cost_by_year: Vec<f64>,
    /// Summed CG staff cost per year across tasks.
    pub cg_staff_cost_by_year: Vec<f64>,
    /// Summed equipment cost per year across tasks.
    pub equipment_cost_by_year: Vec<f64>,
    /// Summed other-non-staff cost per year across owned items.
    pub other_non_staff_cost_by_year: Vec<f64>,
    /// Travel cost per year.
    pub travel_by_year: Vec<f64>,
    /// Consumables cost per year. Other-non-staff loader rows add into
    /// this vector as well as registering their item.
    pub consumables_by_year: Vec<f64>,
    /// Inflation accrual per year (reported alongside the total, not
    /// folded into it).
    pub inflation_by_year: Vec<f64>,
    /// Working margin per year on staff plus equipment cost.
    pub working_margin_by_year: Vec<f64>,
    /// The three contingency vectors.
    pub contingency: Contingency,
    /// Total cost per year across all categories and adjustments.
    pub total_cost_by_year: Vec<f64>,
    /// Sum of [`Self::total_cost_by_year`].
    pub grand_total: f64,
    /// Sum of [`Self::staff_fraction_by_year`].
    pub total_staff_fraction: f64,
    /// Sum of [`Self::staff_cost_by_year`].
    pub total_staff_cost: f64,
    /// Sum of [`Self::cg_staff_cost_by_year`].
    pub total_cg_staff_cost: f64,
    /// Sum of [`Self::equipment_cost_by_year`].
    pub total_equipment_cost: f64,
    /// Sum of [`Self::other_non_staff_cost_by_year`].
    pub total_other_non_staff_cost: f64,
    /// Sum of [`Self::travel_by_year`].
    pub total_travel: f64,
    /// Sum of [`Self::consumables_by_year`].
    pub total_consumables: f64,
    /// Sum of [`Self::inflation_by_year`].
    pub total_inflation: f64,
    /// Sum of [`Self::working_margin_by_year`].
    pub total_working_margin: f64,
}

impl WorkPackage {
    /// Creates a work package with zeroed cost vectors sized to the
    /// financial-year list.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        project: ProjectId,
        manager: impl Into<String>,
        financial_years: Vec<String>,
    ) -> Self {
        let years = financial_years.len();
        Self {
            code: code.into(),
            name: name.into(),
            project,
            manager: manager.into(),
            financial_years,
            staff_fraction_by_year: vec![0.0; years],
            staff_cost_by_year: vec![0.0; years],
            cg_staff_cost_by_year: vec![0.0; years],
            equipment_cost_by_year: vec![0.0; years],
            other_non_staff_cost_by_year: vec![0.0; years],
            travel_by_year: vec![0.0; years],
            consumables_by_year: vec![0.0; years],
            inflation_by_year: vec![0.0; years],
            working_margin_by_year: vec![0.0; years],
            contingency: Contingency {
                equipment_by_year: vec![0.0; years],
                all_staff_by_year: vec![0.0; years],
                cg_staff_by_year: vec![0.0; years],
                totals: [0.0; 3],
            },
            total_cost_by_year: vec![0.0; years],
            grand_total: 0.0,
            total_staff_fraction: 0.0,
            total_staff_cost: 0.0,
            total_cg_staff_cost: 0.0,
            total_equipment_cost: 0.0,
            total_other_non_staff_cost: 0.0,
            total_travel: 0.0,
            total_consumables: 0.0,
            total_inflation: 0.0,
            total_working_margin: 0.0,
        }
    }

    /// Everything that counts as non-staff cost, per year: equipment,
    /// other non-staff, consumables, travel, working margin, and the
    /// equipment and all-staff contingency vectors. Adjustments are
    /// included; raw staff cost is not.
    #[must_use]
    pub fn total_non_staff_by_year(&self) -> Vec<f64> {
        (0..self.financial_years.len())
            .map(|year| {
                self.equipment_cost_by_year[year]
                    + self.other_non_staff_cost_by_year[year]
                    + self.consumables_by_year[year]
                    + self.travel_by_year[year]
                    + self.working_margin_by_year[year]
                    + self.contingency.equipment_by_year[year]
                    + self.contingency.all_staff_by_year[year]
            })
            .collect()
    }

    /// Budgeted value of the work package: its fully-loaded grand total.
    #[must_use]
    pub const fn total_value(&self) -> f64 {
        self.grand_total
    }

    /// Returns `true` when the entry can participate in costing.
    #[must_use]
    pub fn is_costable(&self) -> bool {
        !self.name.trim().is_empty() && !self.financial_years.is_empty()
    }
}

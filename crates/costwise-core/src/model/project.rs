//! Projects: the top of the rollup hierarchy.

use serde::{Deserialize, Serialize};

use super::workpackage::Contingency;

/// A project: the sum of its work packages.
///
/// Every field except the name is derived by the costing pass from the
/// project's work packages, which must all share an identical
/// financial-year list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name (identity key).
    pub name: String,
    /// Ordered financial-year labels, taken from the first contributing
    /// work package.
    pub financial_years: Vec<String>,
    /// Summed staff cost per year.
    pub staff_cost_by_year: Vec<f64>,
    /// Summed CG staff cost per year.
    pub cg_staff_cost_by_year: Vec<f64>,
    /// Summed equipment cost per year.
    pub equipment_cost_by_year: Vec<f64>,
    /// Summed other-non-staff cost per year.
    pub other_non_staff_cost_by_year: Vec<f64>,
    /// Summed travel plus consumables cost per year.
    pub travel_consumables_cost_by_year: Vec<f64>,
    /// Summed inflation accrual per year.
    pub inflation_by_year: Vec<f64>,
    /// Summed working margin per year.
    pub working_margin_by_year: Vec<f64>,
    /// Summed contingency vectors.
    pub contingency: Contingency,
    /// Sum of staff cost over years.
    pub total_staff_cost: f64,
    /// Sum of CG staff cost over years.
    pub total_cg_staff_cost: f64,
    /// Sum of equipment cost over years.
    pub total_equipment_cost: f64,
    /// Sum of other-non-staff cost over years.
    pub total_other_non_staff_cost: f64,
    /// Sum of travel plus consumables over years.
    pub total_travel_consumables: f64,
    /// Sum of inflation over years.
    pub total_inflation: f64,
    /// Sum of working margin over years.
    pub total_working_margin: f64,
    /// Sum of the per-work-package grand totals.
    pub grand_total: f64,
}

impl Project {
    /// Creates a project with empty rollup vectors.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            financial_years: Vec::new(),
            staff_cost_by_year: Vec::new(),
            cg_staff_cost_by_year: Vec::new(),
            equipment_cost_by_year: Vec::new(),
            other_non_staff_cost_by_year: Vec::new(),
            travel_consumables_cost_by_year: Vec::new(),
            inflation_by_year: Vec::new(),
            working_margin_by_year: Vec::new(),
            contingency: Contingency::default(),
            total_staff_cost: 0.0,
            total_cg_staff_cost: 0.0,
            total_equipment_cost: 0.0,
            total_other_non_staff_cost: 0.0,
            total_travel_consumables: 0.0,
            total_inflation: 0.0,
            total_working_margin: 0.0,
            grand_total: 0.0,
        }
    }

    /// Fully-loaded project cost: the sum of its work packages' grand
    /// totals.
    #[must_use]
    pub const fn total_cost(&self) -> f64 {
        self.grand_total
    }

    /// Budgeted value of the project for earned-value purposes.
    #[must_use]
    pub const fn total_value(&self) -> f64 {
        self.grand_total
    }
}

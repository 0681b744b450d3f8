//! Tasks and the task↔staff / task↔equipment link entities.

use serde::{Deserialize, Serialize};

use super::{EquipmentId, StaffId, TaskId, WorkPackageId};

/// Number of quarters per financial year in the effort grid.
pub const QUARTERS_PER_YEAR: usize = 4;

/// A named unit of work inside a work package.
///
/// Identity is `(name, owning work package)` - the same task name may
/// recur in different work packages. Every cost field is derived from the
/// task's links during the costing pass; callers never set them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task name.
    pub name: String,
    /// Owning work package.
    pub work_package: WorkPackageId,
    /// Summed staff effort fraction per year across task-staff links.
    pub staff_fraction_by_year: Vec<f64>,
    /// Summed staff cost per year across task-staff links.
    pub staff_cost_by_year: Vec<f64>,
    /// Staff cost per year restricted to consolidated-grant-funded links.
    pub cg_staff_cost_by_year: Vec<f64>,
    /// Sum of [`Self::staff_fraction_by_year`].
    pub total_staff_fraction: f64,
    /// Sum of [`Self::staff_cost_by_year`].
    pub total_staff_cost: f64,
    /// Sum of [`Self::cg_staff_cost_by_year`].
    pub total_cg_staff_cost: f64,
    /// Summed equipment cost per year across task-equipment links.
    pub equipment_cost_by_year: Vec<f64>,
    /// Sum of [`Self::equipment_cost_by_year`].
    pub total_equipment_cost: f64,
}

impl Task {
    /// Creates a task with empty cost vectors.
    #[must_use]
    pub fn new(name: impl Into<String>, work_package: WorkPackageId) -> Self {
        Self {
            name: name.into(),
            work_package,
            staff_fraction_by_year: Vec::new(),
            staff_cost_by_year: Vec::new(),
            cg_staff_cost_by_year: Vec::new(),
            total_staff_fraction: 0.0,
            total_staff_cost: 0.0,
            total_cg_staff_cost: 0.0,
            equipment_cost_by_year: Vec::new(),
            total_equipment_cost: 0.0,
        }
    }

    /// Budgeted value of the task: staff plus equipment cost.
    ///
    /// This is the base against which earned value is computed.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.total_staff_cost + self.total_equipment_cost
    }
}

/// Association of one staff member with one task, carrying the quarterly
/// effort grid.
///
/// A `(task, staff)` pair is unique across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStaff {
    /// The task the effort is booked against.
    pub task: TaskId,
    /// The staff member providing the effort.
    pub staff: StaffId,
    /// Effort fraction per year and quarter; each entry is one financial
    /// year's four quarter fractions in `[0, 1]`.
    pub fraction_grid: Vec<[f64; QUARTERS_PER_YEAR]>,
    /// Annual effort fraction: the arithmetic mean of the four quarter
    /// fractions (not a weighted sum).
    pub fraction_by_year: Vec<f64>,
    /// Sum of [`Self::fraction_by_year`].
    pub total_fraction: f64,
    /// Staff cost per year: annual cost × annual fraction. Filled by the
    /// costing pass.
    pub cost_by_year: Vec<f64>,
    /// Sum of [`Self::cost_by_year`].
    pub total_cost: f64,
}

impl TaskStaff {
    /// Creates a link with no effort grid yet.
    #[must_use]
    pub const fn new(task: TaskId, staff: StaffId) -> Self {
        Self {
            task,
            staff,
            fraction_grid: Vec::new(),
            fraction_by_year: Vec::new(),
            total_fraction: 0.0,
            cost_by_year: Vec::new(),
            total_cost: 0.0,
        }
    }

    /// Stores the year × quarter effort grid and derives the annual
    /// fraction vector and its total.
    pub fn set_fraction_grid(&mut self, grid: Vec<[f64; QUARTERS_PER_YEAR]>) {
        self.fraction_by_year = grid
            .iter()
            .map(|quarters| quarters.iter().sum::<f64>() / QUARTERS_PER_YEAR as f64)
            .collect();
        self.total_fraction = self.fraction_by_year.iter().sum();
        self.fraction_grid = grid;
    }

    /// Fills the per-year cost vector from the staff member's annual
    /// cost.
    ///
    /// The annual fraction is a full-time-equivalent proportion of one
    /// year, and the annual cost is a once-per-year figure.
    pub fn compute_cost(&mut self, annual_cost: f64) {
        self.cost_by_year = self
            .fraction_by_year
            .iter()
            .map(|fraction| annual_cost * fraction)
            .collect();
        self.total_cost = self.cost_by_year.iter().sum();
    }

    /// Returns `true` when the link can participate in costing.
    #[must_use]
    pub fn is_costable(&self) -> bool {
        !self.fraction_grid.is_empty() && !self.fraction_by_year.is_empty()
    }
}

/// Association of one equipment item with one task.
///
/// Pure association: groups equipment cost under a task. A
/// `(task, equipment)` pair is unique across the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEquipment {
    /// The task the equipment belongs to.
    pub task: TaskId,
    /// The equipment item.
    pub equipment: EquipmentId,
}

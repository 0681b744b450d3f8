//! Equipment and other-non-staff cost items.

use serde::{Deserialize, Serialize};

use super::WorkPackageId;

/// A named equipment item with a per-financial-year cost profile.
///
/// Identity is the name, unique across the registry. The total is only
/// meaningful once the cost vector has been set; items that never
/// received one are pruned before costing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Item name (identity key).
    pub name: String,
    /// Cost per financial year.
    pub cost_by_year: Vec<f64>,
    /// Sum of [`Self::cost_by_year`].
    pub total_cost: f64,
}

impl Equipment {
    /// Creates an item with no cost profile yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost_by_year: Vec::new(),
            total_cost: f64::NAN,
        }
    }

    /// Sets the per-year cost vector and recomputes the total.
    pub fn set_cost_by_year(&mut self, cost_by_year: Vec<f64>) {
        self.total_cost = cost_by_year.iter().sum();
        self.cost_by_year = cost_by_year;
    }

    /// Returns `true` when the item can participate in costing.
    #[must_use]
    pub fn is_costable(&self) -> bool {
        !self.name.trim().is_empty() && !self.cost_by_year.is_empty() && self.total_cost.is_finite()
    }
}

/// A named non-staff cost item (other than equipment, travel, and
/// consumables) owned by one work package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherNonStaff {
    /// Item name (identity key).
    pub name: String,
    /// Owning work package.
    pub work_package: WorkPackageId,
    /// Cost per financial year.
    pub cost_by_year: Vec<f64>,
    /// Sum of [`Self::cost_by_year`].
    pub total_cost: f64,
}

impl OtherNonStaff {
    /// Creates an item with no cost profile yet.
    #[must_use]
    pub fn new(name: impl Into<String>, work_package: WorkPackageId) -> Self {
        Self {
            name: name.into(),
            work_package,
            cost_by_year: Vec::new(),
            total_cost: f64::NAN,
        }
    }

    /// Sets the per-year cost vector and recomputes the total.
    pub fn set_cost_by_year(&mut self, cost_by_year: Vec<f64>) {
        self.total_cost = cost_by_year.iter().sum();
        self.cost_by_year = cost_by_year;
    }

    /// Returns `true` when the item can participate in costing.
    #[must_use]
    pub fn is_costable(&self) -> bool {
        !self.name.trim().is_empty() && !self.cost_by_year.is_empty() && self.total_cost.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_follows_cost_vector() {
        let mut item = Equipment::new("Laser");
        assert!(!item.is_costable());
        item.set_cost_by_year(vec![10.0, 20.0, 0.5]);
        assert!((item.total_cost - 30.5).abs() < 1e-12);
        assert!(item.is_costable());
    }

    #[test]
    fn nan_cost_year_poisons_total() {
        let mut item = Equipment::new("Laser");
        item.set_cost_by_year(vec![10.0, f64::NAN]);
        assert!(!item.is_costable());
    }
}

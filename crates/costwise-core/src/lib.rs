//! costwise-core - project costing and earned-value engine.
//!
//! Computes a hierarchical cost rollup (Staff → Task → WorkPackage →
//! Project) from flat-file inputs, applying inflation, working-margin, and
//! contingency adjustments at the work-package level, and tracks planned
//! vs. actual completion to derive earned value.
//!
//! # Architecture
//!
//! - [`config`] - immutable economic parameters (rates, start years, issue
//!   date), constructed once at startup and passed down by reference.
//! - [`model`] - the entity store: staff, equipment, other-non-staff
//!   items, tasks, the task↔staff / task↔equipment links, work packages,
//!   and projects, behind typed index handles.
//! - [`costing`] - the single bottom-up costing pass.
//! - [`progress`] - progress records and earned-value computation,
//!   including rollup from task level to work-package and project level.
//! - [`loader`] - row-tagged CSV ingestion for work-package definitions,
//!   the staff database, and progress reports.
//! - [`report`] - CSV report emission over the finished object graph.
//!
//! # Lifecycle
//!
//! One process run is strictly batch-oriented: populate the
//! [`model::CostModel`] from files, run [`costing::run`] exactly once,
//! read results. [`model::CostModel::reset`] wipes the store for an
//! independent run within the same process; there is no partial
//! incremental re-costing.

pub mod config;
pub mod costing;
pub mod loader;
pub mod model;
pub mod progress;
pub mod report;

pub use config::EconomicParameters;
pub use costing::CostingError;
pub use model::{CostModel, LookupError, ModelError};
pub use progress::{EarnedValue, EntityRef, Progress, ProgressLedger};

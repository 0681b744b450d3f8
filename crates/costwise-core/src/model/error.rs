//! Model and registry error types.

use thiserror::Error;

/// Errors raised by unique lookups over the entity store.
///
/// "Not found" is not an error - lookups return `Ok(None)` for zero
/// matches. A duplicate identity is an error at the point of lookup:
/// callers must never be handed an arbitrary pick among several entries
/// sharing one identity key.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LookupError {
    /// Two or more live entries share one identity key.
    #[error("{count} {kind} entries share identity '{key}'")]
    Duplicate {
        /// Entity kind, e.g. `"staff"` or `"work package"`.
        kind: &'static str,
        /// The identity key that matched more than once.
        key: String,
        /// Number of entries sharing the key.
        count: usize,
    },
}

/// Errors raised while registering entities or constructing links.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// An entity was registered without its identity fields.
    #[error("{kind} entry is missing its identity ({field})")]
    MissingIdentity {
        /// Entity kind.
        kind: &'static str,
        /// The empty identity field.
        field: &'static str,
    },

    /// A link referenced a task handle that is dangling or pruned.
    #[error("task handle {index} does not refer to a live task")]
    UnknownTask {
        /// The raw handle index.
        index: usize,
    },

    /// A link referenced a staff handle that is dangling or pruned.
    #[error("staff handle {index} does not refer to a live staff entry")]
    UnknownStaff {
        /// The raw handle index.
        index: usize,
    },

    /// A link referenced an equipment handle that is dangling or pruned.
    #[error("equipment handle {index} does not refer to a live equipment item")]
    UnknownEquipment {
        /// The raw handle index.
        index: usize,
    },

    /// An entity referenced a work-package handle that is dangling or
    /// pruned.
    #[error("work-package handle {index} does not refer to a live work package")]
    UnknownWorkPackage {
        /// The raw handle index.
        index: usize,
    },

    /// An entity referenced a project handle that is dangling or pruned.
    #[error("project handle {index} does not refer to a live project")]
    UnknownProject {
        /// The raw handle index.
        index: usize,
    },

    /// A task↔staff or task↔equipment pair is already linked.
    #[error("{kind} link for '{key}' already exists")]
    DuplicateLink {
        /// Link kind, e.g. `"task-staff"`.
        kind: &'static str,
        /// Human-readable pair description.
        key: String,
    },

    /// A duplicate identity surfaced during a lookup made on behalf of a
    /// link construction.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

//! The entity store: registries, links, and typed handles.
//!
//! All entities live in one [`CostModel`] owned by the caller and passed
//! by reference - the explicit replacement for class-level instance
//! lists. Collections are append-only vectors of tombstone slots: handles
//! stay valid across [`CostModel::prune`], and [`CostModel::reset`] wipes
//! everything for an independent run.
//!
//! # Lookup contract
//!
//! `find_*` methods distinguish three outcomes: `Ok(None)` when nothing
//! matches, `Ok(Some(handle))` for exactly one match, and
//! [`LookupError::Duplicate`] when the identity key is ambiguous. A
//! duplicate is an error signal at the point of lookup, never a
//! tie-break.

pub mod equipment;
mod error;
pub mod project;
pub mod staff;
pub mod task;
pub mod workpackage;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use equipment::{Equipment, OtherNonStaff};
pub use error::{LookupError, ModelError};
pub use project::Project;
pub use staff::{FundingSource, Staff};
pub use task::{Task, TaskEquipment, TaskStaff, QUARTERS_PER_YEAR};
pub use workpackage::{Contingency, WorkPackage};

/// Handle to a [`Staff`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffId(pub(crate) usize);

/// Handle to an [`Equipment`] item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentId(pub(crate) usize);

/// Handle to an [`OtherNonStaff`] item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtherNonStaffId(pub(crate) usize);

/// Handle to a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub(crate) usize);

/// Handle to a [`TaskStaff`] link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskStaffId(pub(crate) usize);

/// Handle to a [`TaskEquipment`] link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskEquipmentId(pub(crate) usize);

/// Handle to a [`WorkPackage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkPackageId(pub(crate) usize);

/// Handle to a [`Project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub(crate) usize);

/// Counts of entries removed by one [`CostModel::prune`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Staff entries removed.
    pub staff: usize,
    /// Equipment items removed.
    pub equipment: usize,
    /// Other-non-staff items removed.
    pub other_non_staff: usize,
    /// Work packages removed.
    pub work_packages: usize,
    /// Tasks removed.
    pub tasks: usize,
    /// Task-staff links removed.
    pub task_staff: usize,
    /// Task-equipment links removed.
    pub task_equipment: usize,
}

impl PruneSummary {
    /// Total entries removed across all collections.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.staff
            + self.equipment
            + self.other_non_staff
            + self.work_packages
            + self.tasks
            + self.task_staff
            + self.task_equipment
    }
}

/// The process-wide entity store for one costing run.
#[derive(Debug, Default)]
pub struct CostModel {
    staff: Vec<Option<Staff>>,
    equipment: Vec<Option<Equipment>>,
    other_non_staff: Vec<Option<OtherNonStaff>>,
    tasks: Vec<Option<Task>>,
    task_staff: Vec<Option<TaskStaff>>,
    task_equipment: Vec<Option<TaskEquipment>>,
    work_packages: Vec<Option<WorkPackage>>,
    projects: Vec<Option<Project>>,
}

fn live<T>(slots: &[Option<T>], index: usize) -> Option<&T> {
    slots.get(index).and_then(Option::as_ref)
}

fn find_unique<T>(
    slots: &[Option<T>],
    kind: &'static str,
    key: &str,
    matches: impl Fn(&T) -> bool,
) -> Result<Option<usize>, LookupError> {
    let mut first = None;
    let mut count = 0;
    for (index, slot) in slots.iter().enumerate() {
        if let Some(entry) = slot {
            if matches(entry) {
                count += 1;
                if first.is_none() {
                    first = Some(index);
                }
            }
        }
    }
    match count {
        0 => Ok(None),
        1 => Ok(first),
        _ => Err(LookupError::Duplicate {
            kind,
            key: key.to_string(),
            count,
        }),
    }
}

impl CostModel {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipes every collection. Must be called between independent runs
    /// within one process; outstanding handles become dangling.
    pub fn reset(&mut self) {
        self.staff.clear();
        self.equipment.clear();
        self.other_non_staff.clear();
        self.tasks.clear();
        self.task_staff.clear();
        self.task_equipment.clear();
        self.work_packages.clear();
        self.projects.clear();
    }

    // ---- registration -----------------------------------------------------

    /// Registers a staff entry.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingIdentity`] when the institute or
    /// staff code is blank. Duplicate identities are accepted here and
    /// surface as [`LookupError::Duplicate`] at lookup time.
    pub fn add_staff(&mut self, entry: Staff) -> Result<StaffId, ModelError> {
        if entry.institute_code.trim().is_empty() {
            return Err(ModelError::MissingIdentity {
                kind: "staff",
                field: "institute_code",
            });
        }
        if entry.staff_code.trim().is_empty() {
            return Err(ModelError::MissingIdentity {
                kind: "staff",
                field: "staff_code",
            });
        }
        self.staff.push(Some(entry));
        Ok(StaffId(self.staff.len() - 1))
    }

    /// Registers an equipment item.
    pub fn add_equipment(&mut self, item: Equipment) -> EquipmentId {
        self.equipment.push(Some(item));
        EquipmentId(self.equipment.len() - 1)
    }

    /// Registers an other-non-staff item owned by a work package.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownWorkPackage`] for a dangling owner
    /// handle.
    pub fn add_other_non_staff(
        &mut self,
        item: OtherNonStaff,
    ) -> Result<OtherNonStaffId, ModelError> {
        if live(&self.work_packages, item.work_package.0).is_none() {
            return Err(ModelError::UnknownWorkPackage {
                index: item.work_package.0,
            });
        }
        self.other_non_staff.push(Some(item));
        Ok(OtherNonStaffId(self.other_non_staff.len() - 1))
    }

    /// Registers a project.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingIdentity`] when the name is blank.
    pub fn add_project(&mut self, project: Project) -> Result<ProjectId, ModelError> {
        if project.name.trim().is_empty() {
            return Err(ModelError::MissingIdentity {
                kind: "project",
                field: "name",
            });
        }
        self.projects.push(Some(project));
        Ok(ProjectId(self.projects.len() - 1))
    }

    /// Registers a work package.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownProject`] for a dangling project
    /// handle.
    pub fn add_work_package(
        &mut self,
        work_package: WorkPackage,
    ) -> Result<WorkPackageId, ModelError> {
        if live(&self.projects, work_package.project.0).is_none() {
            return Err(ModelError::UnknownProject {
                index: work_package.project.0,
            });
        }
        self.work_packages.push(Some(work_package));
        Ok(WorkPackageId(self.work_packages.len() - 1))
    }

    /// Registers a task owned by a work package.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownWorkPackage`] for a dangling owner
    /// handle.
    pub fn add_task(&mut self, task: Task) -> Result<TaskId, ModelError> {
        if live(&self.work_packages, task.work_package.0).is_none() {
            return Err(ModelError::UnknownWorkPackage {
                index: task.work_package.0,
            });
        }
        self.tasks.push(Some(task));
        Ok(TaskId(self.tasks.len() - 1))
    }

    // ---- links ------------------------------------------------------------

    /// Links a staff member to a task.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownTask`] / [`ModelError::UnknownStaff`]
    /// for dangling handles, and [`ModelError::DuplicateLink`] when the
    /// pair is already linked.
    pub fn link_staff(&mut self, task: TaskId, staff: StaffId) -> Result<TaskStaffId, ModelError> {
        let task_entry = live(&self.tasks, task.0)
            .ok_or(ModelError::UnknownTask { index: task.0 })?;
        let staff_entry = live(&self.staff, staff.0)
            .ok_or(ModelError::UnknownStaff { index: staff.0 })?;
        if self.find_task_staff(task, staff)?.is_some() {
            return Err(ModelError::DuplicateLink {
                kind: "task-staff",
                key: format!("{}/{}", task_entry.name, staff_entry.name_or_post),
            });
        }
        self.task_staff.push(Some(TaskStaff::new(task, staff)));
        Ok(TaskStaffId(self.task_staff.len() - 1))
    }

    /// Links an equipment item to a task.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownTask`] /
    /// [`ModelError::UnknownEquipment`] for dangling handles, and
    /// [`ModelError::DuplicateLink`] when the pair is already linked.
    pub fn link_equipment(
        &mut self,
        task: TaskId,
        equipment: EquipmentId,
    ) -> Result<TaskEquipmentId, ModelError> {
        let task_entry = live(&self.tasks, task.0)
            .ok_or(ModelError::UnknownTask { index: task.0 })?;
        let equipment_entry = live(&self.equipment, equipment.0)
            .ok_or(ModelError::UnknownEquipment { index: equipment.0 })?;
        if self.find_task_equipment(task, equipment)?.is_some() {
            return Err(ModelError::DuplicateLink {
                kind: "task-equipment",
                key: format!("{}/{}", task_entry.name, equipment_entry.name),
            });
        }
        self.task_equipment
            .push(Some(TaskEquipment { task, equipment }));
        Ok(TaskEquipmentId(self.task_equipment.len() - 1))
    }

    // ---- access -----------------------------------------------------------

    /// Returns the staff entry behind a handle, if live.
    #[must_use]
    pub fn staff(&self, id: StaffId) -> Option<&Staff> {
        live(&self.staff, id.0)
    }

    /// Returns the equipment item behind a handle, if live.
    #[must_use]
    pub fn equipment(&self, id: EquipmentId) -> Option<&Equipment> {
        live(&self.equipment, id.0)
    }

    /// Mutable access to an equipment item.
    pub fn equipment_mut(&mut self, id: EquipmentId) -> Option<&mut Equipment> {
        self.equipment.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the other-non-staff item behind a handle, if live.
    #[must_use]
    pub fn other_non_staff(&self, id: OtherNonStaffId) -> Option<&OtherNonStaff> {
        live(&self.other_non_staff, id.0)
    }

    /// Mutable access to an other-non-staff item.
    pub fn other_non_staff_mut(&mut self, id: OtherNonStaffId) -> Option<&mut OtherNonStaff> {
        self.other_non_staff.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the task behind a handle, if live.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        live(&self.tasks, id.0)
    }

    /// Mutable access to a task.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the task-staff link behind a handle, if live.
    #[must_use]
    pub fn task_staff(&self, id: TaskStaffId) -> Option<&TaskStaff> {
        live(&self.task_staff, id.0)
    }

    /// Mutable access to a task-staff link.
    pub fn task_staff_mut(&mut self, id: TaskStaffId) -> Option<&mut TaskStaff> {
        self.task_staff.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the work package behind a handle, if live.
    #[must_use]
    pub fn work_package(&self, id: WorkPackageId) -> Option<&WorkPackage> {
        live(&self.work_packages, id.0)
    }

    /// Mutable access to a work package.
    pub fn work_package_mut(&mut self, id: WorkPackageId) -> Option<&mut WorkPackage> {
        self.work_packages.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the project behind a handle, if live.
    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        live(&self.projects, id.0)
    }

    /// Mutable access to a project.
    pub fn project_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.get_mut(id.0).and_then(Option::as_mut)
    }

    // ---- iteration --------------------------------------------------------

    /// Iterates live staff entries.
    pub fn staff_entries(&self) -> impl Iterator<Item = (StaffId, &Staff)> {
        self.staff
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (StaffId(index), entry)))
    }

    /// Iterates live equipment items.
    pub fn equipment_entries(&self) -> impl Iterator<Item = (EquipmentId, &Equipment)> {
        self.equipment
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|item| (EquipmentId(index), item)))
    }

    /// Iterates live other-non-staff items.
    pub fn other_non_staff_entries(
        &self,
    ) -> impl Iterator<Item = (OtherNonStaffId, &OtherNonStaff)> {
        self.other_non_staff
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|item| (OtherNonStaffId(index), item)))
    }

    /// Iterates live tasks.
    pub fn task_entries(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|task| (TaskId(index), task)))
    }

    /// Iterates live task-staff links.
    pub fn task_staff_entries(&self) -> impl Iterator<Item = (TaskStaffId, &TaskStaff)> {
        self.task_staff
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|link| (TaskStaffId(index), link)))
    }

    /// Iterates live task-equipment links.
    pub fn task_equipment_entries(
        &self,
    ) -> impl Iterator<Item = (TaskEquipmentId, &TaskEquipment)> {
        self.task_equipment
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|link| (TaskEquipmentId(index), link)))
    }

    /// Iterates live work packages.
    pub fn work_package_entries(&self) -> impl Iterator<Item = (WorkPackageId, &WorkPackage)> {
        self.work_packages
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|wp| (WorkPackageId(index), wp)))
    }

    /// Iterates live projects.
    pub fn project_entries(&self) -> impl Iterator<Item = (ProjectId, &Project)> {
        self.projects
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|project| (ProjectId(index), project)))
    }

    /// Distinct institute codes across live staff, in first-seen order.
    #[must_use]
    pub fn institutes(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for (_, entry) in self.staff_entries() {
            if !seen.contains(&entry.institute_code) {
                seen.push(entry.institute_code.clone());
            }
        }
        seen
    }

    // ---- unique lookups ---------------------------------------------------

    /// Finds a staff entry by `(institute_code, staff_code)`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when more than one live entry
    /// shares the identity.
    pub fn find_staff(
        &self,
        institute_code: &str,
        staff_code: &str,
    ) -> Result<Option<StaffId>, LookupError> {
        let key = format!("{institute_code}/{staff_code}");
        find_unique(&self.staff, "staff", &key, |entry| {
            entry.institute_code == institute_code && entry.staff_code == staff_code
        })
        .map(|found| found.map(StaffId))
    }

    /// Finds an equipment item by name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the name is ambiguous.
    pub fn find_equipment(&self, name: &str) -> Result<Option<EquipmentId>, LookupError> {
        find_unique(&self.equipment, "equipment", name, |item| item.name == name)
            .map(|found| found.map(EquipmentId))
    }

    /// Finds an other-non-staff item by name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the name is ambiguous.
    pub fn find_other_non_staff(
        &self,
        name: &str,
    ) -> Result<Option<OtherNonStaffId>, LookupError> {
        find_unique(&self.other_non_staff, "other-non-staff", name, |item| {
            item.name == name
        })
        .map(|found| found.map(OtherNonStaffId))
    }

    /// Finds a task by name within one work package.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the pair identity is
    /// ambiguous.
    pub fn find_task(
        &self,
        name: &str,
        work_package: WorkPackageId,
    ) -> Result<Option<TaskId>, LookupError> {
        find_unique(&self.tasks, "task", name, |task| {
            task.name == name && task.work_package == work_package
        })
        .map(|found| found.map(TaskId))
    }

    /// Finds a task by name across all work packages.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when several tasks share the
    /// name.
    pub fn find_task_by_name(&self, name: &str) -> Result<Option<TaskId>, LookupError> {
        find_unique(&self.tasks, "task", name, |task| task.name == name)
            .map(|found| found.map(TaskId))
    }

    /// Finds a work package by name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the name is ambiguous.
    pub fn find_work_package(&self, name: &str) -> Result<Option<WorkPackageId>, LookupError> {
        find_unique(&self.work_packages, "work package", name, |wp| wp.name == name)
            .map(|found| found.map(WorkPackageId))
    }

    /// Finds a project by name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the name is ambiguous.
    pub fn find_project(&self, name: &str) -> Result<Option<ProjectId>, LookupError> {
        find_unique(&self.projects, "project", name, |project| project.name == name)
            .map(|found| found.map(ProjectId))
    }

    /// Finds the link between a task and a staff member.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the pair is linked more
    /// than once.
    pub fn find_task_staff(
        &self,
        task: TaskId,
        staff: StaffId,
    ) -> Result<Option<TaskStaffId>, LookupError> {
        let key = format!("task {}/staff {}", task.0, staff.0);
        find_unique(&self.task_staff, "task-staff link", &key, |link| {
            link.task == task && link.staff == staff
        })
        .map(|found| found.map(TaskStaffId))
    }

    /// Finds the link between a task and an equipment item.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Duplicate`] when the pair is linked more
    /// than once.
    pub fn find_task_equipment(
        &self,
        task: TaskId,
        equipment: EquipmentId,
    ) -> Result<Option<TaskEquipmentId>, LookupError> {
        let key = format!("task {}/equipment {}", task.0, equipment.0);
        find_unique(&self.task_equipment, "task-equipment link", &key, |link| {
            link.task == task && link.equipment == equipment
        })
        .map(|found| found.map(TaskEquipmentId))
    }

    // ---- hygiene ----------------------------------------------------------

    /// Removes entries that cannot participate in costing: blank
    /// identities, missing cost vectors or effort grids, NaN totals, and
    /// links or children whose referents have themselves been removed.
    ///
    /// Soft-fail data hygiene: offenders are tombstoned and counted, not
    /// reported as errors. Handles to surviving entries remain valid.
    pub fn prune(&mut self) -> PruneSummary {
        let mut summary = PruneSummary::default();

        summary.staff = tombstone(&mut self.staff, Staff::is_costable);
        summary.equipment = tombstone(&mut self.equipment, Equipment::is_costable);
        summary.work_packages = tombstone(&mut self.work_packages, WorkPackage::is_costable);

        let work_packages = &self.work_packages;
        summary.tasks = tombstone(&mut self.tasks, |task| {
            !task.name.trim().is_empty() && live(work_packages, task.work_package.0).is_some()
        });
        summary.other_non_staff = tombstone(&mut self.other_non_staff, |item| {
            item.is_costable() && live(work_packages, item.work_package.0).is_some()
        });

        let tasks = &self.tasks;
        let staff = &self.staff;
        summary.task_staff = tombstone(&mut self.task_staff, |link| {
            link.is_costable()
                && live(tasks, link.task.0).is_some()
                && live(staff, link.staff.0).is_some()
        });
        let equipment = &self.equipment;
        summary.task_equipment = tombstone(&mut self.task_equipment, |link| {
            live(tasks, link.task.0).is_some() && live(equipment, link.equipment.0).is_some()
        });

        if summary.total() > 0 {
            debug!(
                staff = summary.staff,
                equipment = summary.equipment,
                other_non_staff = summary.other_non_staff,
                work_packages = summary.work_packages,
                tasks = summary.tasks,
                task_staff = summary.task_staff,
                task_equipment = summary.task_equipment,
                "pruned entries that cannot be costed"
            );
        }
        summary
    }
}

fn tombstone<T>(slots: &mut [Option<T>], keep: impl Fn(&T) -> bool) -> usize {
    let mut removed = 0;
    for slot in slots.iter_mut() {
        if matches!(slot, Some(entry) if !keep(entry)) {
            *slot = None;
            removed += 1;
        }
    }
    removed
}

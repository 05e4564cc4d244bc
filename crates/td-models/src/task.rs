//! Task model
//!
//! Table: tasks
//!
//! Invariant: `completed_date` is present exactly when `status` is Done as of
//! the last write. The store does not enforce it, so every local write runs
//! through [`reconcile_completed_date`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_core::traits::{DepartmentScoped, Entity, Id, Identifiable};
use td_core::types::Table;
use validator::Validate;

use crate::priority::Priority;
use crate::status::TaskStatus;

/// Task entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,

    /// Owning team, immutable after creation
    pub department_id: Id,

    pub description: String,

    /// Project name; free text, not a foreign key
    #[serde(default)]
    pub project: Option<String>,

    /// Owner display name
    pub owner: String,

    #[serde(default)]
    pub priority: Option<Priority>,

    pub status: TaskStatus,

    pub assigned_date: NaiveDate,

    pub promise_date: NaiveDate,

    #[serde(default)]
    pub completed_date: Option<NaiveDate>,

    #[serde(default)]
    pub comments: Option<String>,
}

impl Identifiable for Task {
    fn id(&self) -> Id {
        self.id
    }
}

impl DepartmentScoped for Task {
    fn department_id(&self) -> Id {
        self.department_id
    }
}

impl Entity for Task {
    const TABLE: Table = Table::Tasks;
    const TYPE_NAME: &'static str = "Task";
}

impl Task {
    /// Priority with absent values read as Medium
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// True when the task is not Done and its promise date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_done() && self.promise_date < today
    }

    /// Project name, or `None` for blank values
    pub fn project_name(&self) -> Option<&str> {
        self.project
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Bring `next.completed_date` in line with `next.status`
///
/// - into Done: stamp `today` unless a completion date is already known
/// - Done to Done: keep the previous completion date
/// - out of Done (or never Done): clear it
pub fn reconcile_completed_date(previous: Option<&Task>, next: &mut Task, today: NaiveDate) {
    if !next.status.is_done() {
        next.completed_date = None;
        return;
    }

    let carried = previous
        .filter(|prev| prev.status.is_done())
        .and_then(|prev| prev.completed_date);

    next.completed_date = carried.or(next.completed_date).or(Some(today));
}

/// Insert payload for a task row; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTask {
    pub department_id: Id,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub description: String,

    pub project: Option<String>,

    #[validate(length(min = 1, message = "must be selected"))]
    pub owner: String,

    pub priority: Priority,

    pub status: TaskStatus,

    pub assigned_date: NaiveDate,

    pub promise_date: NaiveDate,

    pub completed_date: Option<NaiveDate>,

    pub comments: Option<String>,
}

impl NewTask {
    /// A new task is completed on its assignment date when created as Done
    pub fn reconcile_completed_date(&mut self) {
        self.completed_date = if self.status.is_done() {
            Some(self.assigned_date)
        } else {
            None
        };
    }

    /// Materialize the row once the store has assigned an id
    pub fn into_task(self, id: Id) -> Task {
        Task {
            id,
            department_id: self.department_id,
            description: self.description,
            project: self.project,
            owner: self.owner,
            priority: Some(self.priority),
            status: self.status,
            assigned_date: self.assigned_date,
            promise_date: self.promise_date,
            completed_date: self.completed_date,
            comments: self.comments,
        }
    }
}

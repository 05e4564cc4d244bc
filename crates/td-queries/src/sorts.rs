//! Task sort orders
//!
//! Sorting is stable: tasks with equal keys keep their input order, in both
//! directions.
//!
//! Priority and status compare by rank rather than by label: Low, Medium,
//! High, Urgent for priority (a task without one counts as Medium) and
//! Pending, In Progress, Done for status. Every other key compares its raw
//! value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_models::Task;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest first)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest first)
    Desc,
}

impl SortDirection {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Get the opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Task field to sort by
///
/// Priority and status order by rank (Low < Urgent, Pending < Done), dates
/// chronologically, text fields lexically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    Description,
    Project,
    Owner,
    Priority,
    Status,
    AssignedDate,
    #[default]
    PromiseDate,
    CompletedDate,
    Comments,
}

impl SortKey {
    /// Parse a column key; accepts the table headers' camelCase aliases
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "description" => Some(Self::Description),
            "project" => Some(Self::Project),
            "owner" => Some(Self::Owner),
            "priority" => Some(Self::Priority),
            "status" => Some(Self::Status),
            "assigned_date" | "assignedDate" => Some(Self::AssignedDate),
            "promise_date" | "promiseDate" => Some(Self::PromiseDate),
            "completed_date" | "completedDate" => Some(Self::CompletedDate),
            "comments" => Some(Self::Comments),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Description => "description",
            Self::Project => "project",
            Self::Owner => "owner",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::AssignedDate => "assigned_date",
            Self::PromiseDate => "promise_date",
            Self::CompletedDate => "completed_date",
            Self::Comments => "comments",
        }
    }

    /// Compare two tasks on this key, ascending
    /// Ascending comparison; priority and status by rank
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Description => a.description.cmp(&b.description),
            Self::Project => a.project.cmp(&b.project),
            Self::Owner => a.owner.cmp(&b.owner),
            Self::Priority => a.effective_priority().cmp(&b.effective_priority()),
            Self::Status => a.status.cmp(&b.status),
            Self::AssignedDate => a.assigned_date.cmp(&b.assigned_date),
            Self::PromiseDate => a.promise_date.cmp(&b.promise_date),
            Self::CompletedDate => a.completed_date.cmp(&b.completed_date),
            Self::Comments => a.comments.cmp(&b.comments),
        }
    }
}

/// Active sort of the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Build from configured key and order names
    pub fn parse(key: &str, order: &str) -> TdResult<Self> {
        let key = SortKey::from_str(key)
            .ok_or_else(|| TdError::Config(format!("unknown sort key: {}", key)))?;
        let direction = SortDirection::from_str(order)
            .ok_or_else(|| TdError::Config(format!("unknown sort order: {}", order)))?;
        Ok(Self::new(key, direction))
    }

    /// Header click: the active key flips direction, a new key starts ascending
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.reverse();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        self.direction.apply(self.key.compare(a, b))
    }

    /// Stable in-place sort
    pub fn sort(&self, tasks: &mut [Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }

    /// Stable in-place sort over borrowed tasks
    pub fn sort_refs(&self, tasks: &mut [&Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use td_models::{Priority, TaskStatus};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn task(id: i64, promise: &str, priority: Option<Priority>) -> Task {
        Task {
            id,
            department_id: 1,
            description: format!("task {}", id),
            project: None,
            owner: "Alice".to_string(),
            priority,
            status: TaskStatus::Pending,
            assigned_date: date("2024-01-01"),
            promise_date: date(promise),
            completed_date: None,
            comments: None,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::from_str("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::from_str("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::Asc.reverse(), SortDirection::Desc);
    }

    #[test]
    fn test_sort_key_aliases() {
        assert_eq!(SortKey::from_str("promiseDate"), Some(SortKey::PromiseDate));
        assert_eq!(SortKey::from_str("assigned_date"), Some(SortKey::AssignedDate));
        assert_eq!(SortKey::from_str("days_taken"), None);
    }

    #[test]
    fn test_stable_sort_on_equal_dates() {
        let mut tasks = vec![
            task(1, "2024-01-10", None),
            task(2, "2024-01-03", None),
            task(3, "2024-01-10", None),
            task(4, "2024-01-03", None),
        ];
        SortSpec::new(SortKey::PromiseDate, SortDirection::Asc).sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![2, 4, 1, 3]);

        SortSpec::new(SortKey::PromiseDate, SortDirection::Desc).sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_priority_sorts_by_rank() {
        let mut tasks = vec![
            task(1, "2024-01-10", Some(Priority::Urgent)),
            task(2, "2024-01-10", Some(Priority::Low)),
            task(3, "2024-01-10", None),
        ];
        SortSpec::new(SortKey::Priority, SortDirection::Asc).sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![2, 3, 1]);
    }

    #[test]
    fn test_status_sorts_by_rank_not_label() {
        let mut tasks = vec![
            task(1, "2024-01-10", None),
            task(2, "2024-01-10", None),
            task(3, "2024-01-10", None),
        ];
        tasks[0].status = TaskStatus::Done;
        tasks[1].status = TaskStatus::Pending;
        tasks[2].status = TaskStatus::InProgress;

        SortSpec::new(SortKey::Status, SortDirection::Asc).sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![2, 3, 1]);
        SortSpec::new(SortKey::Status, SortDirection::Desc).sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![1, 3, 2]);
    }

    #[test]
    fn test_toggle() {
        let mut spec = SortSpec::default();
        assert_eq!(spec.key, SortKey::PromiseDate);

        spec.toggle(SortKey::PromiseDate);
        assert_eq!(spec.direction, SortDirection::Desc);

        spec.toggle(SortKey::Owner);
        assert_eq!(spec, SortSpec::new(SortKey::Owner, SortDirection::Asc));
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!(SortSpec::parse("promise_date", "asc").is_ok());
        assert!(matches!(SortSpec::parse("size", "asc"), Err(TdError::Config(_))));
        assert!(matches!(SortSpec::parse("owner", "up"), Err(TdError::Config(_))));
    }
}

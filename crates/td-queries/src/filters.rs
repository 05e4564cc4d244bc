//! Task filters
//!
//! Every field of a [`FilterSpec`] is combined with logical AND. Owner,
//! project and priority accept the sentinels `all`/`All`. Status filters and
//! the `Overdue` filter partition the task set: a task that is overdue never
//! matches its nominal status.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use td_core::error::{TdError, ValidationErrors};
use td_core::result::TdResult;
use td_models::{Priority, Task, TaskStatus};

/// Values that select every task for a field
pub const ALL_SENTINELS: [&str; 2] = ["all", "All"];

/// Label of the derived overdue state
pub const OVERDUE: &str = "Overdue";

/// True iff the task is not Done and its promise date is strictly before `today`
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.is_overdue(today)
}

fn is_all_sentinel(raw: &str) -> bool {
    raw.is_empty() || ALL_SENTINELS.contains(&raw)
}

/// Either every value, or one exact value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl Selection<String> {
    /// Parse a UI value; the sentinels and the empty string select everything
    pub fn parse(raw: &str) -> Self {
        if is_all_sentinel(raw) {
            Self::All
        } else {
            Self::Only(raw.to_string())
        }
    }
}

impl Selection<Priority> {
    pub fn parse(raw: &str) -> TdResult<Self> {
        if is_all_sentinel(raw) {
            return Ok(Self::All);
        }
        Priority::from_str(raw)
            .map(Self::Only)
            .ok_or_else(|| invalid_field("priority", raw))
    }
}

/// Status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    /// Derived overdue state, regardless of stored status
    Overdue,
    /// Stored status, excluding overdue tasks
    Is(TaskStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> TdResult<Self> {
        if is_all_sentinel(raw) {
            return Ok(Self::All);
        }
        if raw == OVERDUE {
            return Ok(Self::Overdue);
        }
        TaskStatus::from_str(raw)
            .map(Self::Is)
            .ok_or_else(|| invalid_field("status", raw))
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Overdue => task.is_overdue(today),
            Self::Is(status) => task.status == *status && !task.is_overdue(today),
        }
    }
}

/// Filter fields the user can change one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Search,
    Owner,
    Project,
    Priority,
    Status,
    DateStart,
    DateEnd,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Owner => "owner",
            Self::Project => "project",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::DateStart => "date_start",
            Self::DateEnd => "date_end",
        }
    }
}

/// Current filter state of the task views
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Case-insensitive substring over description, project and owner
    pub search: String,
    pub owner: Selection<String>,
    pub project: Selection<String>,
    pub priority: Selection<Priority>,
    pub status: StatusFilter,
    /// Inclusive lower bound on `assigned_date`
    pub date_start: Option<NaiveDate>,
    /// Inclusive upper bound on `assigned_date`
    pub date_end: Option<NaiveDate>,
}

impl FilterSpec {
    /// Unfiltered spec restricted to the calendar month containing `today`
    pub fn current_month(today: NaiveDate) -> Self {
        let (start, end) = month_bounds(today);
        Self {
            date_start: start,
            date_end: end,
            ..Self::default()
        }
    }

    /// True when no field narrows the task set
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_empty()
            && self.owner.is_all()
            && self.project.is_all()
            && self.priority.is_all()
            && self.status == StatusFilter::All
            && self.date_start.is_none()
            && self.date_end.is_none()
    }

    /// Update one field from its UI value
    ///
    /// On error the filter is left unchanged.
    pub fn set(&mut self, field: FilterField, raw: &str) -> TdResult<()> {
        match field {
            FilterField::Search => self.search = raw.to_string(),
            FilterField::Owner => self.owner = Selection::<String>::parse(raw),
            FilterField::Project => self.project = Selection::<String>::parse(raw),
            FilterField::Priority => self.priority = Selection::<Priority>::parse(raw)?,
            FilterField::Status => self.status = StatusFilter::parse(raw)?,
            FilterField::DateStart => self.date_start = parse_bound(field, raw)?,
            FilterField::DateEnd => self.date_end = parse_bound(field, raw)?,
        }
        Ok(())
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        self.matches_search(task)
            && self.owner.matches(&task.owner)
            && self.matches_project(task)
            && self.priority.matches(&task.effective_priority())
            && self.status.matches(task, today)
            && self.matches_dates(task)
    }

    /// Keep matching tasks in input order
    pub fn apply<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task, today)).collect()
    }

    fn matches_search(&self, task: &Task) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        task.description.to_lowercase().contains(&needle)
            || task
                .project
                .as_deref()
                .is_some_and(|project| project.to_lowercase().contains(&needle))
            || task.owner.to_lowercase().contains(&needle)
    }

    fn matches_project(&self, task: &Task) -> bool {
        match &self.project {
            Selection::All => true,
            Selection::Only(name) => task.project.as_deref() == Some(name.as_str()),
        }
    }

    fn matches_dates(&self, task: &Task) -> bool {
        self.date_start.map_or(true, |start| task.assigned_date >= start)
            && self.date_end.map_or(true, |end| task.assigned_date <= end)
    }
}

/// First and last day of the month containing `day`
fn month_bounds(day: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let first = NaiveDate::from_ymd_opt(day.year(), day.month(), 1);
    let (next_year, next_month) = if day.month() == 12 {
        (day.year() + 1, 1)
    } else {
        (day.year(), day.month() + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt());
    (first, last)
}

fn parse_bound(field: FilterField, raw: &str) -> TdResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| invalid_field(field.as_str(), raw))
}

fn invalid_field(field: &str, raw: &str) -> TdError {
    let mut errors = ValidationErrors::new();
    errors.add(field, format!("is not a valid value: {}", raw));
    TdError::Validation(errors)
}

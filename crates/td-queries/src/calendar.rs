//! Calendar event projection

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_core::traits::Id;
use td_core::types::Color;
use td_models::Task;

use crate::tally::StatusBucket;

/// All-day event anchored at a task's promise date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Back-reference to the source task
    pub task_id: Id,
    /// `"<owner>: <description>"`
    pub title: String,
    pub start: NaiveDate,
    pub color: Color,
    pub overdue: bool,
}

impl CalendarEvent {
    pub fn from_task(task: &Task, today: NaiveDate) -> Self {
        let bucket = StatusBucket::of(task, today);
        Self {
            task_id: task.id,
            title: format!("{}: {}", task.owner, task.description),
            start: task.promise_date,
            color: bucket.color(),
            overdue: bucket == StatusBucket::Overdue,
        }
    }

    pub fn build(tasks: &[Task], today: NaiveDate) -> Vec<Self> {
        tasks.iter().map(|task| Self::from_task(task, today)).collect()
    }

    /// Look the source task up in a view
    pub fn task<'a>(&self, tasks: &'a [Task]) -> Option<&'a Task> {
        tasks.iter().find(|task| task.id == self.task_id)
    }
}

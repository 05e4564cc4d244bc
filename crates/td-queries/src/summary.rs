//! Summary card counts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_models::{Task, TaskStatus};

/// Counts shown above the task list
///
/// Pending and in-progress exclude overdue tasks, matching the status
/// filter partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub overdue: usize,
}

impl Summary {
    pub fn build(tasks: &[Task], today: NaiveDate) -> Self {
        tasks.iter().fold(Self::default(), |mut summary, task| {
            summary.total += 1;
            if task.is_overdue(today) {
                summary.overdue += 1;
            } else {
                match task.status {
                    TaskStatus::Pending => summary.pending += 1,
                    TaskStatus::InProgress => summary.in_progress += 1,
                    TaskStatus::Done => {}
                }
            }
            summary
        })
    }
}

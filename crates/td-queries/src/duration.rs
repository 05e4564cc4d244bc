//! Day-count helpers for tooltips and the list's "days taken" column

use chrono::NaiveDate;
use td_models::Task;

/// Signed days from assignment to the promise date, or to the completion
/// date once the task is completed
pub fn promise_difference(task: &Task) -> i64 {
    let end = task.completed_date.unwrap_or(task.promise_date);
    (end - task.assigned_date).num_days()
}

/// Days from assignment to completion, or to `today` while still open
pub fn days_taken(task: &Task, today: NaiveDate) -> i64 {
    let end = match task.completed_date {
        Some(completed) if task.is_done() => completed,
        _ => today,
    };
    (end - task.assigned_date).num_days()
}

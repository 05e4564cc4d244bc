//! Chart tallies
//!
//! Each task lands in exactly one bucket of a tally. Status tallies give the
//! overdue state precedence over the stored status; priority tallies read an
//! absent priority as Medium.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use td_core::types::Color;
use td_models::{Priority, Task, TaskStatus};

/// Status chart bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusBucket {
    Pending,
    InProgress,
    Done,
    Overdue,
}

impl StatusBucket {
    pub const ALL: [StatusBucket; 4] = [
        StatusBucket::Pending,
        StatusBucket::InProgress,
        StatusBucket::Done,
        StatusBucket::Overdue,
    ];

    /// Bucket of a task; overdue wins over the stored status
    pub fn of(task: &Task, today: NaiveDate) -> Self {
        if task.is_overdue(today) {
            return Self::Overdue;
        }
        match task.status {
            TaskStatus::Pending => Self::Pending,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Done => Self::Done,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Overdue => "Overdue",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Pending => TaskStatus::Pending.color(),
            Self::InProgress => TaskStatus::InProgress.color(),
            Self::Done => TaskStatus::Done.color(),
            Self::Overdue => TaskStatus::overdue_color(),
        }
    }
}

impl fmt::Display for StatusBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered bucket counts over a task view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally<K> {
    entries: Vec<(K, usize)>,
    total: usize,
}

pub type StatusTally = Tally<StatusBucket>;
pub type PriorityTally = Tally<Priority>;
pub type OwnerTally = Tally<String>;

impl<K: PartialEq> Tally<K> {
    /// Empty tally with a fixed set of buckets
    fn with_buckets(buckets: impl IntoIterator<Item = K>) -> Self {
        Self {
            entries: buckets.into_iter().map(|key| (key, 0)).collect(),
            total: 0,
        }
    }

    /// Count one task into `key`, appending the bucket when it is new
    fn record(&mut self, key: K) {
        self.total += 1;
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key, 1)),
        }
    }

    pub fn entries(&self) -> &[(K, usize)] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, key: &K) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(0, |(_, count)| *count)
    }

    /// Share of the total in percent; zero for an empty tally
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// Chart label such as `3 (37.5%)`; empty for a zero count
    pub fn label(&self, count: usize) -> String {
        if count == 0 {
            return String::new();
        }
        format!("{} ({:.1}%)", count, self.percentage(count))
    }
}

impl Tally<StatusBucket> {
    pub fn by_status(tasks: &[Task], today: NaiveDate) -> Self {
        let mut tally = Self::with_buckets(StatusBucket::ALL);
        for task in tasks {
            tally.record(StatusBucket::of(task, today));
        }
        tally
    }
}

impl Tally<Priority> {
    pub fn by_priority(tasks: &[Task]) -> Self {
        let mut tally = Self::with_buckets(Priority::ALL);
        for task in tasks {
            tally.record(task.effective_priority());
        }
        tally
    }
}

impl Tally<String> {
    /// Count per distinct owner, in order of first appearance
    pub fn by_owner(tasks: &[Task]) -> Self {
        let mut tally = Self::with_buckets(std::iter::empty());
        for task in tasks {
            tally.record(task.owner.clone());
        }
        tally
    }
}

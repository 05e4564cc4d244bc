//! Project view grouping
//!
//! Tasks are bucketed by project, then by assigned date. Projects sort
//! by name and dates chronologically; tasks inside a date keep view order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use td_models::Task;

/// Bucket name for tasks without a project
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub project: String,
    pub dates: Vec<DateGroup>,
}

impl ProjectGroup {
    pub fn task_count(&self) -> usize {
        self.dates.iter().map(|group| group.tasks.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectGrouping {
    pub projects: Vec<ProjectGroup>,
}

impl ProjectGrouping {
    pub fn build(tasks: &[Task]) -> Self {
        let mut buckets: BTreeMap<String, BTreeMap<NaiveDate, Vec<Task>>> = BTreeMap::new();
        for task in tasks {
            let project = task.project_name().unwrap_or(UNCATEGORIZED).to_string();
            buckets
                .entry(project)
                .or_default()
                .entry(task.assigned_date)
                .or_default()
                .push(task.clone());
        }

        let projects = buckets
            .into_iter()
            .map(|(project, dates)| ProjectGroup {
                project,
                dates: dates
                    .into_iter()
                    .map(|(date, tasks)| DateGroup { date, tasks })
                    .collect(),
            })
            .collect();

        Self { projects }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn project(&self, name: &str) -> Option<&ProjectGroup> {
        self.projects.iter().find(|group| group.project == name)
    }
}

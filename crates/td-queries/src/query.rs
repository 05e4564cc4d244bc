//! Task query
//!
//! A query is the pair of filter and sort state held by the dashboard. Running
//! it over a snapshot yields the ordered task view every projection is built
//! from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_core::config::{DashboardConfig, DefaultDateRange};
use td_core::result::TdResult;
use td_models::Task;

use crate::filters::FilterSpec;
use crate::sorts::SortSpec;

/// Which projection the renderer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTab {
    #[default]
    List,
    Dashboard,
    Calendar,
    ProjectView,
}

impl ViewTab {
    pub const ALL: [ViewTab; 4] = [
        ViewTab::List,
        ViewTab::Dashboard,
        ViewTab::Calendar,
        ViewTab::ProjectView,
    ];

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "list" | "table" => Some(Self::List),
            "dashboard" | "charts" => Some(Self::Dashboard),
            "calendar" => Some(Self::Calendar),
            "project_view" | "project-view" | "projectview" => Some(Self::ProjectView),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Dashboard => "dashboard",
            Self::Calendar => "calendar",
            Self::ProjectView => "project_view",
        }
    }
}

/// Filter and sort state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub filter: FilterSpec,
    pub sort: SortSpec,
}

impl TaskQuery {
    pub fn new(filter: FilterSpec, sort: SortSpec) -> Self {
        Self { filter, sort }
    }

    /// Initial query for a session, from the dashboard settings
    pub fn from_config(config: &DashboardConfig, today: NaiveDate) -> TdResult<Self> {
        let sort = SortSpec::parse(&config.default_sort_key, &config.default_sort_order)?;
        let filter = match config.default_date_range {
            DefaultDateRange::CurrentMonth => FilterSpec::current_month(today),
            DefaultDateRange::None => FilterSpec::default(),
        };
        Ok(Self::new(filter, sort))
    }

    /// Filtered and sorted copy of the snapshot
    pub fn run(&self, tasks: &[Task], today: NaiveDate) -> Vec<Task> {
        let mut view: Vec<Task> = self
            .filter
            .apply(tasks, today)
            .into_iter()
            .cloned()
            .collect();
        self.sort.sort(&mut view);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterField;
    use crate::sorts::{SortDirection, SortKey};
    use td_core::config::AppConfig;
    use td_models::TaskStatus;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn task(id: i64, owner: &str, promise: &str) -> Task {
        Task {
            id,
            department_id: 1,
            description: "Review".to_string(),
            project: None,
            owner: owner.to_string(),
            priority: None,
            status: TaskStatus::Pending,
            assigned_date: date("2024-01-02"),
            promise_date: date(promise),
            completed_date: None,
            comments: None,
        }
    }

    #[test]
    fn test_run_filters_then_sorts() {
        let tasks = vec![
            task(1, "Alice", "2024-01-20"),
            task(2, "Bob", "2024-01-08"),
            task(3, "Alice", "2024-01-09"),
        ];
        let mut query = TaskQuery::default();
        query.filter.set(FilterField::Owner, "Alice").unwrap();

        let view = query.run(&tasks, date("2024-01-05"));
        let ids: Vec<i64> = view.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig::default();
        let query = TaskQuery::from_config(&config.dashboard, date("2024-01-05")).unwrap();
        assert_eq!(query.sort, SortSpec::new(SortKey::PromiseDate, SortDirection::Asc));
        assert_eq!(query.filter.date_start, Some(date("2024-01-01")));
        assert_eq!(query.filter.date_end, Some(date("2024-01-31")));
    }

    #[test]
    fn test_view_tab_parsing() {
        assert_eq!(ViewTab::from_str("Calendar"), Some(ViewTab::Calendar));
        assert_eq!(ViewTab::from_str("project-view"), Some(ViewTab::ProjectView));
        for tab in ViewTab::ALL {
            assert_eq!(ViewTab::from_str(tab.as_str()), Some(tab));
        }
    }
}

//! Derived views
//!
//! One [`DerivedViews`] value is produced per recompute and handed to the
//! renderer as a whole.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_models::{Project, Task, TeamMember};

use crate::calendar::CalendarEvent;
use crate::grouping::ProjectGrouping;
use crate::query::TaskQuery;
use crate::roster::{FilterOptions, Roster};
use crate::summary::Summary;
use crate::tally::{OwnerTally, PriorityTally, StatusTally};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedViews {
    /// Date the views were computed for
    pub today: NaiveDate,
    /// Filtered and sorted task list
    pub tasks: Vec<Task>,
    pub summary: Summary,
    pub status_tally: StatusTally,
    pub priority_tally: PriorityTally,
    pub owner_tally: OwnerTally,
    pub project_grouping: ProjectGrouping,
    pub calendar: Vec<CalendarEvent>,
    pub roster: Roster,
    pub filter_options: FilterOptions,
}

impl DerivedViews {
    pub fn build(
        tasks: &[Task],
        members: &[TeamMember],
        projects: &[Project],
        query: &TaskQuery,
        today: NaiveDate,
    ) -> Self {
        let view = query.run(tasks, today);
        let roster = Roster::build(members, projects);
        let filter_options = FilterOptions::from_roster(&roster);

        Self {
            today,
            summary: Summary::build(&view, today),
            status_tally: StatusTally::by_status(&view, today),
            priority_tally: PriorityTally::by_priority(&view),
            owner_tally: OwnerTally::by_owner(&view),
            project_grouping: ProjectGrouping::build(&view),
            calendar: CalendarEvent::build(&view, today),
            tasks: view,
            roster,
            filter_options,
        }
    }

    /// Views over an empty mirror
    pub fn empty(today: NaiveDate) -> Self {
        Self::build(&[], &[], &[], &TaskQuery::default(), today)
    }
}

//! User actions
//!
//! The only input the renderer feeds back into the core.

use td_core::traits::Id;
use td_queries::{FilterField, SortKey, ViewTab};
use td_services::{TaskDraft, TaskEdit};

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    AddTask(TaskDraft),
    EditTask { id: Id, edit: TaskEdit },
    DeleteTask(Id),
    AddMember { name: String, designation: String },
    DeleteMember(Id),
    AddProject { name: String },
    DeleteProject(Id),
    SetFilter { field: FilterField, value: String },
    ClearFilters,
    /// Sort by `key`; the current key flips direction
    SortBy(SortKey),
    SwitchTeam(Id),
    SwitchTab(ViewTab),
}

impl UserAction {
    /// Whether the action writes through the persistence collaborator
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::AddTask(_)
                | Self::EditTask { .. }
                | Self::DeleteTask(_)
                | Self::AddMember { .. }
                | Self::DeleteMember(_)
                | Self::AddProject { .. }
                | Self::DeleteProject(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTask(_) => "add_task",
            Self::EditTask { .. } => "edit_task",
            Self::DeleteTask(_) => "delete_task",
            Self::AddMember { .. } => "add_member",
            Self::DeleteMember(_) => "delete_member",
            Self::AddProject { .. } => "add_project",
            Self::DeleteProject(_) => "delete_project",
            Self::SetFilter { .. } => "set_filter",
            Self::ClearFilters => "clear_filters",
            Self::SortBy(_) => "sort_by",
            Self::SwitchTeam(_) => "switch_team",
            Self::SwitchTab(_) => "switch_tab",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_writes_are_mutations() {
        assert!(UserAction::DeleteTask(1).is_mutation());
        assert!(UserAction::AddProject {
            name: "Website".to_string()
        }
        .is_mutation());
        assert!(!UserAction::SortBy(SortKey::Owner).is_mutation());
        assert!(!UserAction::SwitchTab(ViewTab::Calendar).is_mutation());
        assert_eq!(UserAction::ClearFilters.name(), "clear_filters");
    }
}

//! Member and project lists for the management panels and dropdowns

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use td_models::{Project, TeamMember};

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Members and projects sorted by name, case-insensitively
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Roster {
    pub members: Vec<TeamMember>,
    pub projects: Vec<Project>,
}

impl Roster {
    pub fn build(members: &[TeamMember], projects: &[Project]) -> Self {
        let mut members = members.to_vec();
        members.sort_by(|a, b| by_name(&a.name, &b.name));
        let mut projects = projects.to_vec();
        projects.sort_by(|a, b| by_name(&a.name, &b.name));
        Self { members, projects }
    }
}

/// Distinct values offered by the owner and project dropdowns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub owners: Vec<String>,
    pub projects: Vec<String>,
}

impl FilterOptions {
    pub fn from_roster(roster: &Roster) -> Self {
        let mut owners: Vec<String> = roster.members.iter().map(|m| m.name.clone()).collect();
        owners.dedup();
        let mut projects: Vec<String> = roster.projects.iter().map(|p| p.name.clone()).collect();
        projects.dedup();
        Self { owners, projects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, name: &str) -> TeamMember {
        TeamMember {
            id,
            department_id: 1,
            user_id: None,
            name: name.to_string(),
            designation: None,
        }
    }

    fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            department_id: 1,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_roster_sorted_case_insensitively() {
        let roster = Roster::build(
            &[member(1, "carol"), member(2, "Alice"), member(3, "bob")],
            &[project(1, "Website"), project(2, "backend")],
        );
        let names: Vec<&str> = roster.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "bob", "carol"]);
        assert_eq!(roster.projects[0].name, "backend");
    }

    #[test]
    fn test_filter_options_are_distinct() {
        let roster = Roster::build(
            &[member(1, "Alice"), member(2, "Alice"), member(3, "Bob")],
            &[project(1, "Website")],
        );
        let options = FilterOptions::from_roster(&roster);
        assert_eq!(options.owners, vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(options.projects, vec!["Website".to_string()]);
    }
}

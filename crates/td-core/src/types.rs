//! Common types used throughout Taskdesk

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TdError;
use crate::result::TdResult;

/// Tables exposed by the remote relational store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Tasks,
    TeamMembers,
    Projects,
    Departments,
    DepartmentMemberships,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Tasks,
        Table::TeamMembers,
        Table::Projects,
        Table::Departments,
        Table::DepartmentMemberships,
    ];

    /// Parse from the store's table name
    pub fn from_name(name: &str) -> TdResult<Self> {
        match name {
            "tasks" => Ok(Self::Tasks),
            "team_members" => Ok(Self::TeamMembers),
            "projects" => Ok(Self::Projects),
            "departments" => Ok(Self::Departments),
            "department_memberships" => Ok(Self::DepartmentMemberships),
            other => Err(TdError::UnknownTable(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::TeamMembers => "team_members",
            Self::Projects => "projects",
            Self::Departments => "departments",
            Self::DepartmentMemberships => "department_memberships",
        }
    }

    /// The local mirror collection fed by this table
    ///
    /// `departments` is read on demand (team join, membership listing) and is
    /// never mirrored.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Self::Tasks => Some(EntityKind::Task),
            Self::TeamMembers => Some(EntityKind::TeamMember),
            Self::Projects => Some(EntityKind::Project),
            Self::DepartmentMemberships => Some(EntityKind::Membership),
            Self::Departments => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collections held by the entity store for the active team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    TeamMember,
    Project,
    Membership,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Task,
        EntityKind::TeamMember,
        EntityKind::Project,
        EntityKind::Membership,
    ];

    pub fn table(&self) -> Table {
        match self {
            Self::Task => Table::Tasks,
            Self::TeamMember => Table::TeamMembers,
            Self::Project => Table::Projects,
            Self::Membership => Table::DepartmentMemberships,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::TeamMember => "team_member",
            Self::Project => "project",
            Self::Membership => "membership",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-level change kind, shared by local mutations and the push feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    /// Parse from the feed's event type, case-insensitively
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Color representation (for statuses, priorities, calendar events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Hex color code (e.g., "#EF4444")
    pub hex: String,
    /// Human-readable name
    pub name: Option<String>,
}

impl Color {
    pub fn new(hex: impl Into<String>) -> Self {
        Self {
            hex: hex.into(),
            name: None,
        }
    }

    pub fn with_name(hex: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hex: hex.into(),
            name: Some(name.into()),
        }
    }
}

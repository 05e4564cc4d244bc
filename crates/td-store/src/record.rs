//! Typed records
//!
//! A [`Record`] is one row of a mirrored table. Deletes only need the key, so
//! a key-only variant exists; it is rejected for inserts and updates.

use serde_json::Value;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::{Id, Identifiable};
use td_core::types::EntityKind;
use td_models::{DepartmentMembership, Project, Task, TeamMember};

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Task(Task),
    TeamMember(TeamMember),
    Project(Project),
    Membership(DepartmentMembership),
    /// Primary key only, as carried by delete events
    Key(EntityKind, Id),
}

impl Record {
    /// Decode a full row of the given kind
    pub fn from_row(kind: EntityKind, row: Value) -> TdResult<Self> {
        let malformed =
            |e: serde_json::Error| TdError::Internal(format!("malformed {} row: {}", kind.table(), e));
        Ok(match kind {
            EntityKind::Task => Self::Task(serde_json::from_value(row).map_err(malformed)?),
            EntityKind::TeamMember => Self::TeamMember(serde_json::from_value(row).map_err(malformed)?),
            EntityKind::Project => Self::Project(serde_json::from_value(row).map_err(malformed)?),
            EntityKind::Membership => Self::Membership(serde_json::from_value(row).map_err(malformed)?),
        })
    }

    /// Extract just the primary key from a row
    pub fn key_from_row(kind: EntityKind, row: &Value) -> TdResult<Self> {
        row.get("id")
            .and_then(Value::as_i64)
            .map(|id| Self::Key(kind, id))
            .ok_or_else(|| TdError::Internal(format!("{} row without an id", kind.table())))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Task(_) => EntityKind::Task,
            Self::TeamMember(_) => EntityKind::TeamMember,
            Self::Project(_) => EntityKind::Project,
            Self::Membership(_) => EntityKind::Membership,
            Self::Key(kind, _) => *kind,
        }
    }

    pub fn id(&self) -> Id {
        match self {
            Self::Task(task) => task.id(),
            Self::TeamMember(member) => member.id(),
            Self::Project(project) => project.id(),
            Self::Membership(membership) => membership.id(),
            Self::Key(_, id) => *id,
        }
    }

    /// Owning team, for rows scoped to one; memberships and keys have none
    pub fn department_id(&self) -> Option<Id> {
        match self {
            Self::Task(task) => Some(task.department_id),
            Self::TeamMember(member) => Some(member.department_id),
            Self::Project(project) => Some(project.department_id),
            Self::Membership(_) | Self::Key(..) => None,
        }
    }

    pub fn is_key_only(&self) -> bool {
        matches!(self, Self::Key(..))
    }
}

impl From<Task> for Record {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<TeamMember> for Record {
    fn from(member: TeamMember) -> Self {
        Self::TeamMember(member)
    }
}

impl From<Project> for Record {
    fn from(project: Project) -> Self {
        Self::Project(project)
    }
}

impl From<DepartmentMembership> for Record {
    fn from(membership: DepartmentMembership) -> Self {
        Self::Membership(membership)
    }
}

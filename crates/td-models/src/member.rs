//! Team member model
//!
//! Table: team_members

use serde::{Deserialize, Serialize};
use td_core::traits::{DepartmentScoped, Entity, Id, Identifiable};
use td_core::types::Table;
use uuid::Uuid;
use validator::Validate;

/// Team member entity
///
/// Tasks reference members by `name`, not by id. A member may exist without
/// a linked login, in which case `user_id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Id,

    pub department_id: Id,

    #[serde(default)]
    pub user_id: Option<Uuid>,

    /// Display name, matched against `Task::owner`
    pub name: String,

    /// Free text, or the membership role for members added at sign-up
    #[serde(default)]
    pub designation: Option<String>,
}

impl Identifiable for TeamMember {
    fn id(&self) -> Id {
        self.id
    }
}

impl DepartmentScoped for TeamMember {
    fn department_id(&self) -> Id {
        self.department_id
    }
}

impl Entity for TeamMember {
    const TABLE: Table = Table::TeamMembers;
    const TYPE_NAME: &'static str = "TeamMember";
}

/// Insert payload for a team member row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTeamMember {
    pub department_id: Id,

    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub name: String,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub designation: String,
}

impl NewTeamMember {
    pub fn new(department_id: Id, name: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            department_id,
            user_id: None,
            name: name.into().trim().to_string(),
            designation: designation.into().trim().to_string(),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

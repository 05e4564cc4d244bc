//! Department membership model
//!
//! Table: department_memberships

use serde::{Deserialize, Serialize};
use td_core::traits::{DepartmentScoped, Entity, Id, Identifiable};
use td_core::types::Table;
use uuid::Uuid;

use crate::role::Role;

/// Links a login to a team with a role
///
/// A user may hold several memberships; exactly one team is active per
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentMembership {
    pub id: Id,
    pub user_id: Uuid,
    pub department_id: Id,
    pub role: Role,
    /// Team name, when the row was fetched joined with `departments`
    #[serde(default)]
    pub department_name: Option<String>,
}

impl Identifiable for DepartmentMembership {
    fn id(&self) -> Id {
        self.id
    }
}

impl DepartmentScoped for DepartmentMembership {
    fn department_id(&self) -> Id {
        self.department_id
    }
}

impl Entity for DepartmentMembership {
    const TABLE: Table = Table::DepartmentMemberships;
    const TYPE_NAME: &'static str = "DepartmentMembership";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMembership {
    pub user_id: Uuid,
    pub department_id: Id,
    pub role: Role,
}

impl NewMembership {
    pub fn admin(user_id: Uuid, department_id: Id) -> Self {
        Self {
            user_id,
            department_id,
            role: Role::Admin,
        }
    }

    pub fn member(user_id: Uuid, department_id: Id) -> Self {
        Self {
            user_id,
            department_id,
            role: Role::Member,
        }
    }
}

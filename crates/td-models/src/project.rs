//! Project model
//!
//! Table: projects

use serde::{Deserialize, Serialize};
use td_core::traits::{DepartmentScoped, Entity, Id, Identifiable};
use td_core::types::Table;
use validator::Validate;

/// Project entity
///
/// Names are unique per team for display purposes only; the store does not
/// enforce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub department_id: Id,
    pub name: String,
}

impl Identifiable for Project {
    fn id(&self) -> Id {
        self.id
    }
}

impl DepartmentScoped for Project {
    fn department_id(&self) -> Id {
        self.department_id
    }
}

impl Entity for Project {
    const TABLE: Table = Table::Projects;
    const TYPE_NAME: &'static str = "Project";
}

impl Project {
    /// Case-insensitive name comparison, used for duplicate detection
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewProject {
    pub department_id: Id,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub name: String,
}

impl NewProject {
    pub fn new(department_id: Id, name: impl Into<String>) -> Self {
        Self {
            department_id,
            name: name.into().trim().to_string(),
        }
    }
}

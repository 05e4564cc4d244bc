//! Department (team) model
//!
//! Table: departments

use serde::{Deserialize, Serialize};
use td_core::traits::{Id, Identifiable};
use validator::Validate;

/// Team entity; the tenant boundary for every other row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: Id,
    pub name: String,
    /// Human-shareable join code, e.g. `ENG-4821`
    pub access_code: String,
}

impl Identifiable for Department {
    fn id(&self) -> Id {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDepartment {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub name: String,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub access_code: String,
}

/// Normalize a user-typed join code: trimmed and upper-cased
pub fn normalize_access_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_access_code() {
        assert_eq!(normalize_access_code("  eng-4821 "), "ENG-4821");
    }
}

//! Contracts
//!
//! A contract checks a draft before any network call. Field rules come from
//! the `validator` derives on the drafts; rules that need context (the
//! team's existing projects, the chosen sign-up flow) live here.

use td_core::error::ValidationErrors;
use td_models::{NewProject, NewTask, NewTeamMember, Project};
use validator::Validate;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

pub trait Contract<T>: Send + Sync {
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Copy `validator` field errors into the display-oriented collection
pub fn collect_field_errors<T: Validate>(entity: &T, errors: &mut ValidationErrors) {
    if let Err(report) = entity.validate() {
        for (field, field_errors) in report.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                errors.add(field, message);
            }
        }
    }
}

pub struct TaskContract;

impl Contract<NewTask> for TaskContract {
    fn validate(&self, task: &NewTask) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        collect_field_errors(task, &mut errors);
        if task.description.trim().is_empty() && !errors.has_error("description") {
            errors.add("description", "can't be blank");
        }
        errors.into_result()
    }
}

pub struct MemberContract;

impl Contract<NewTeamMember> for MemberContract {
    fn validate(&self, member: &NewTeamMember) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        collect_field_errors(member, &mut errors);
        errors.into_result()
    }
}

/// Project names must be unique within the team
pub struct ProjectContract<'a> {
    pub existing: &'a [Project],
}

impl Contract<NewProject> for ProjectContract<'_> {
    fn validate(&self, project: &NewProject) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        collect_field_errors(project, &mut errors);
        if !project.name.is_empty() && self.existing.iter().any(|p| p.has_name(&project.name)) {
            errors.add("name", "has already been taken");
        }
        errors.into_result()
    }
}

/// Team part of a sign-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamChoice {
    /// Join with an access code
    Join { code: String },
    /// Create a new team with this name
    Create { team_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub team: TeamChoice,
}

/// Sign-up form rules; messages are shown verbatim above the form
pub struct SignUpContract;

impl Contract<SignUpRequest> for SignUpContract {
    fn validate(&self, request: &SignUpRequest) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        if request.full_name.trim().is_empty() {
            errors.add_base("Full Name is required.");
        }
        match &request.team {
            TeamChoice::Join { code } if code.trim().is_empty() => {
                errors.add_base("Team Code is required.");
            }
            TeamChoice::Create { team_name } if team_name.trim().is_empty() => {
                errors.add_base("Team Name is required.");
            }
            _ => {}
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(full_name: &str, team: TeamChoice) -> SignUpRequest {
        SignUpRequest {
            email: "alice@example.com".to_string(),
            password: "secret".to_string(),
            full_name: full_name.to_string(),
            team,
        }
    }

    #[test]
    fn test_sign_up_messages() {
        let errors = SignUpContract
            .validate(&sign_up(" ", TeamChoice::Join { code: "".to_string() }))
            .unwrap_err();
        assert_eq!(
            errors.full_messages(),
            vec![
                "Full Name is required.".to_string(),
                "Team Code is required.".to_string()
            ]
        );

        let errors = SignUpContract
            .validate(&sign_up("Alice", TeamChoice::Create { team_name: "  ".to_string() }))
            .unwrap_err();
        assert_eq!(errors.full_messages(), vec!["Team Name is required.".to_string()]);

        assert!(SignUpContract
            .validate(&sign_up("Alice", TeamChoice::Create { team_name: "Engineering".to_string() }))
            .is_ok());
    }

    #[test]
    fn test_duplicate_project_name() {
        let existing = vec![Project {
            id: 1,
            department_id: 1,
            name: "Website".to_string(),
        }];
        let contract = ProjectContract { existing: &existing };

        let errors = contract.validate(&NewProject::new(1, "website")).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), &vec!["has already been taken".to_string()]);

        let errors = contract.validate(&NewProject::new(1, "  ")).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), &vec!["can't be blank".to_string()]);

        assert!(contract.validate(&NewProject::new(1, "Backend")).is_ok());
    }

    #[test]
    fn test_member_requires_designation() {
        let errors = MemberContract
            .validate(&NewTeamMember::new(1, "Alice", ""))
            .unwrap_err();
        assert!(errors.has_error("designation"));
        assert!(!errors.has_error("name"));
    }
}

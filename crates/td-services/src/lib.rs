//! # td-services
//!
//! Mutations of the active team's data.
//!
//! Every operation validates its input through a contract before any network
//! call, submits through the persistence gateway, and applies the canonical
//! rows to the entity store only after the gateway accepted them. A failed
//! call leaves the store untouched.

pub mod result;
pub mod contracts;
pub mod tasks;
pub mod members;
pub mod projects;
pub mod teams;
mod support;

#[cfg(test)]
pub(crate) mod testing;

pub use result::ServiceResult;
pub use contracts::{Contract, SignUpContract, SignUpRequest, TeamChoice};
pub use tasks::{TaskDraft, TaskEdit, TaskService};
pub use members::MemberService;
pub use projects::ProjectService;
pub use teams::{generate_access_code, JoinedTeam, TeamService, INVALID_TEAM_CODE};

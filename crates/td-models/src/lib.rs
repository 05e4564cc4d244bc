//! # td-models
//!
//! Domain models for Taskdesk.
//!
//! This crate contains the row structs mirrored from the remote store.
//! Each model implements the core traits from `td-core` (Entity, Identifiable, etc.)

pub use td_core::traits::{DepartmentScoped, Entity, Id, Identifiable};

pub mod task;
pub mod priority;
pub mod status;
pub mod member;
pub mod project;
pub mod department;
pub mod membership;
pub mod role;
pub mod user;

pub use task::{reconcile_completed_date, NewTask, Task};
pub use priority::Priority;
pub use status::TaskStatus;
pub use member::{NewTeamMember, TeamMember};
pub use project::{NewProject, Project};
pub use department::{Department, NewDepartment};
pub use membership::{DepartmentMembership, NewMembership};
pub use role::Role;
pub use user::User;

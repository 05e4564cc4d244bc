//! # td-core
//!
//! Core types, traits, and utilities for Taskdesk.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the error taxonomy
//! - Result type aliases
//! - Core traits (Identifiable, DepartmentScoped, Clock)
//! - Table and entity-kind identifiers shared by the store and the change feed
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;

//! Core error types for Taskdesk
//!
//! Every failure the core can report falls into one of four categories:
//! validation (caught before any network call), collaborator (the store or
//! identity service rejected a call), consistency (recoverable through the
//! team-context state machine) and catastrophic (the session must end).

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Core error type for all Taskdesk operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TdError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Store error on {table}: {message}")]
    Store { table: String, message: String },

    #[error("Identity service error: {0}")]
    Identity(String),

    #[error("Inconsistent session state: {0}")]
    Consistency(String),

    #[error("Unrecoverable backend failure: {0}")]
    Catastrophic(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error category, used by callers to decide how a failure is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any network call, shown inline
    Validation,
    /// A collaborator rejected the call; local state is untouched
    Collaborator,
    /// Routed into a recovery flow by the team-context state machine
    Consistency,
    /// Surfaced plainly, followed by a forced sign-out
    Catastrophic,
}

/// Validation errors collection
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    /// Messages per form field
    pub errors: BTreeMap<String, Vec<String>>,
    /// Messages for the form as a whole
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Whether `field` has any message
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// Turn the collection into a `Result`, `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl TdError {
    /// Shorthand for a collaborator rejection on a table
    pub fn store(table: impl Into<String>, message: impl Into<String>) -> Self {
        TdError::Store {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a single base validation message
    pub fn invalid(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        TdError::Validation(errors)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TdError::Validation(_) => ErrorCategory::Validation,
            TdError::Consistency(_) => ErrorCategory::Consistency,
            TdError::Catastrophic(_) => ErrorCategory::Catastrophic,
            TdError::NotFound { .. }
            | TdError::Unauthorized { .. }
            | TdError::Forbidden { .. }
            | TdError::Conflict { .. }
            | TdError::Store { .. }
            | TdError::Identity(_)
            | TdError::UnknownTable(_)
            | TdError::Config(_)
            | TdError::Internal(_) => ErrorCategory::Collaborator,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TdError::NotFound { .. } => "not_found",
            TdError::Unauthorized { .. } => "unauthorized",
            TdError::Forbidden { .. } => "forbidden",
            TdError::Validation(_) => "validation_failed",
            TdError::Conflict { .. } => "conflict",
            TdError::Store { .. } => "store_error",
            TdError::Identity(_) => "identity_error",
            TdError::Consistency(_) => "inconsistent_state",
            TdError::Catastrophic(_) => "catastrophic",
            TdError::UnknownTable(_) => "unknown_table",
            TdError::Config(_) => "configuration_error",
            TdError::Internal(_) => "internal_error",
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            TdError::Validation(errors) => errors.full_messages().join("\n"),
            TdError::Store { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

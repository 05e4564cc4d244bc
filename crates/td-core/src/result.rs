//! Result type aliases

use crate::error::TdError;

/// Standard Result type for Taskdesk operations
pub type TdResult<T> = Result<T, TdError>;

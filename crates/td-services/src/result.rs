//! Service result type

use std::fmt;
use td_core::error::{ErrorCategory, TdError, ValidationErrors};
use td_core::result::TdResult;

/// Outcome of a service call, ready for display
///
/// Failures carry the messages to show and the category the error fell
/// into, so the caller can decide between inline display, a plain message,
/// or ending the session.
#[derive(Debug)]
pub struct ServiceResult<T> {
    success: bool,
    result: Option<T>,
    errors: ValidationErrors,
    message: Option<String>,
    category: Option<ErrorCategory>,
    error: Option<TdError>,
}

impl<T> ServiceResult<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: ValidationErrors::new(),
            message: None,
            category: None,
            error: None,
        }
    }

    pub fn success_with_message(result: T, message: impl Into<String>) -> Self {
        Self::success(result).with_message(message)
    }

    /// Failed validation
    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            result: None,
            errors,
            message: None,
            category: Some(ErrorCategory::Validation),
            error: None,
        }
    }

    /// Failed validation on a single field
    pub fn failure_with_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::failure(errors)
    }

    /// Failed validation with a base error
    pub fn failure_with_base_error(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::failure(errors)
    }

    /// Failure reported by a collaborator or the state machine
    pub fn from_error(error: TdError) -> Self {
        let category = error.category();
        match error {
            TdError::Validation(errors) => Self::failure(errors),
            other => {
                let mut errors = ValidationErrors::new();
                errors.add_base(other.user_message());
                Self {
                    success: false,
                    result: None,
                    errors,
                    message: None,
                    category: Some(category),
                    error: Some(other),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// The value, if the call succeeded
    pub fn into_result(self) -> Option<T> {
        self.result
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Category of the failure; `None` on success
    pub fn category(&self) -> Option<ErrorCategory> {
        self.category
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.full_messages()
    }

    /// Transform the value of a success; failures pass through
    pub fn map<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ServiceResult {
            success: self.success,
            result: self.result.map(f),
            errors: self.errors,
            message: self.message,
            category: self.category,
            error: self.error,
        }
    }

    /// The underlying error of a non-validation failure
    pub fn error(&self) -> Option<&TdError> {
        self.error.as_ref()
    }

    /// Back to a plain `Result`
    pub fn into_td_result(self) -> TdResult<T> {
        match (self.result, self.error) {
            (Some(result), _) if self.success => Ok(result),
            (_, Some(error)) => Err(error),
            (_, None) => Err(TdError::Validation(self.errors)),
        }
    }
}

impl<T> From<TdResult<T>> for ServiceResult<T> {
    fn from(result: TdResult<T>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(error) => ServiceResult::from_error(error),
        }
    }
}

impl<T> From<Result<T, ValidationErrors>> for ServiceResult<T> {
    fn from(result: Result<T, ValidationErrors>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(errors) => ServiceResult::failure(errors),
        }
    }
}

impl<T> fmt::Display for ServiceResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "Success")?;
            if let Some(ref msg) = self.message {
                write!(f, ": {}", msg)?;
            }
        } else {
            write!(f, "Failure: {}", self.errors.full_messages().join(", "))?;
        }
        Ok(())
    }
}

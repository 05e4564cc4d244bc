//! Channel errors

use td_core::error::TdError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChannelError {
    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Channel task failed: {0}")]
    Task(String),

    #[error("Gave up resubscribing after {attempts} attempts")]
    GaveUp { attempts: u32 },
}

pub type ChannelResult<T> = Result<T, ChannelError>;

impl From<ChannelError> for TdError {
    fn from(err: ChannelError) -> Self {
        TdError::store("realtime", err.to_string())
    }
}

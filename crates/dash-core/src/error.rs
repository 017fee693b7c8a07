//! Command error taxonomy

use dash_backend::BackendError;
use dash_model::PathError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason code carried by `COMMAND.FAILED` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    UserError,
    InternalError,
    NotSupported,
}

/// Errors that terminate a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Bad arguments relative to the current state
    #[error("{0}")]
    User(String),

    /// Broken invariant or unexpected backend failure
    #[error("{0}")]
    Internal(String),

    /// Backend lacks a required capability
    #[error("{0}")]
    NotSupported(String),

    #[error("command was cancelled")]
    Cancelled,
}

impl CommandError {
    pub fn user(message: impl Into<String>) -> Self {
        CommandError::User(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CommandError::Internal(message.into())
    }

    /// Failure reason; `None` for cancellation, which has its own event
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            CommandError::User(_) => Some(FailureReason::UserError),
            CommandError::Internal(_) => Some(FailureReason::InternalError),
            CommandError::NotSupported(_) => Some(FailureReason::NotSupported),
            CommandError::Cancelled => None,
        }
    }
}

impl From<BackendError> for CommandError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NotFound(what) => CommandError::User(format!("object not found: {}", what)),
            BackendError::NotSupported(what) => CommandError::NotSupported(format!("backend does not support {}", what)),
            BackendError::Cancelled => CommandError::Cancelled,
            other => CommandError::Internal(other.to_string()),
        }
    }
}

impl From<PathError> for CommandError {
    fn from(error: PathError) -> Self {
        CommandError::User(error.to_string())
    }
}

impl From<StoreError> for CommandError {
    fn from(error: StoreError) -> Self {
        CommandError::Internal(error.to_string())
    }
}

/// Reducer invariant breaks; the whole action batch is discarded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("layout path error: {0}")]
    Path(#[from] PathError),

    #[error("invalid index {index} for {what} of length {len}")]
    Index { what: &'static str, index: usize, len: usize },

    #[error("unknown stash '{0}'")]
    MissingStash(String),

    #[error("unknown filter '{0}'")]
    MissingFilter(String),
}

/// Errors of the runtime itself, as opposed to errors of a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("dashboard runtime has shut down")]
    Closed,
}

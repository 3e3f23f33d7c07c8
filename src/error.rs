//! Error type shared by the store, storage and config layers.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Rejected user input. The operation was aborted and nothing changed.
    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_bare() {
        let err = TaskError::validation("Task title cannot be empty");
        assert_eq!(err.to_string(), "Task title cannot be empty");
        assert!(err.is_validation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err: TaskError = io_err.into();
        assert!(matches!(err, TaskError::Io(_)));
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("I/O error"));
    }
}

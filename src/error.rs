//! Structured error types surfaced by the task store.

use crate::backend::BackendError;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors, raised before any remote call
    MissingRequiredField,
    NoSelection,
    TaskNotFound,

    // Remote errors
    RemoteUnavailable,
    InconsistentState,
}

/// Broad class of an error, used for propagation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationRejected,
    RemoteUnavailable,
}

impl ErrorCode {
    pub fn kind(self) -> ErrorKind {
        match self {
            ErrorCode::MissingRequiredField | ErrorCode::NoSelection | ErrorCode::TaskNotFound => {
                ErrorKind::ValidationRejected
            }
            // Inconsistent reads propagate the same way as failed calls
            ErrorCode::RemoteUnavailable | ErrorCode::InconsistentState => {
                ErrorKind::RemoteUnavailable
            }
        }
    }
}

/// Structured error returned by store operations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn no_selection() -> Self {
        Self::new(ErrorCode::NoSelection, "No task selected")
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn remote(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RemoteUnavailable, err.to_string())
    }

    pub fn inconsistent(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InconsistentState, err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::ValidationRejected
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self.code {
            ErrorCode::RemoteUnavailable | ErrorCode::InconsistentState => {
                format!("Could not reach the task store: {}", self.message)
            }
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(ref id) => {
                Self::inconsistent(&err).with_details(format!("task_id={}", id))
            }
            BackendError::Corrupt(_) => Self::inconsistent(err),
            other => Self::remote(other),
        }
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(err) => match err.downcast::<BackendError>() {
                Ok(backend_err) => backend_err.into(),
                Err(err) => StoreError::remote(err),
            },
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_codes_classify_as_validation() {
        assert!(StoreError::missing_field("title").is_validation());
        assert!(StoreError::no_selection().is_validation());
        assert!(!StoreError::remote("offline").is_validation());
        assert_eq!(
            StoreError::inconsistent("bad row").kind(),
            ErrorKind::RemoteUnavailable
        );
    }

    #[test]
    fn backend_not_found_becomes_inconsistent_state() {
        let err: StoreError = BackendError::NotFound("abc".to_string()).into();
        assert_eq!(err.code, ErrorCode::InconsistentState);
        assert_eq!(err.details.as_deref(), Some("task_id=abc"));
    }

    #[test]
    fn anyhow_roundtrip_preserves_store_error() {
        let original = StoreError::task_not_found("x");
        let err: StoreError = anyhow::Error::new(original.clone()).into();
        assert_eq!(err, original);
    }

    #[test]
    fn user_message_mentions_remote_store() {
        let err = StoreError::remote("connection refused");
        assert!(err.user_message().contains("connection refused"));
        assert!(err.user_message().starts_with("Could not reach"));
    }
}

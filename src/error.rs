//! Error types for the Taskboard client.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=transport, 3=not_found, 4=validation, 5=remote, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for Taskboard operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Transport (exit 2)
    TransportError,

    // Not Found (exit 3)
    ProjectNotFound,
    TaskNotFound,

    // Validation (exit 4)
    ValidationFailed,
    InvalidArgument,

    // Remote (exit 5)
    RemoteRejected,
    Unauthorized,
    InvalidResponse,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::TransportError => "TRANSPORT_ERROR",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RemoteRejected => "REMOTE_REJECTED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::TransportError => 2,
            Self::ProjectNotFound | Self::TaskNotFound => 3,
            Self::ValidationFailed | Self::InvalidArgument => 4,
            Self::RemoteRejected | Self::Unauthorized | Self::InvalidResponse => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry, either with corrected input or
    /// after the backend becomes reachable again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::InvalidArgument | Self::TransportError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Taskboard operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Client-side validation failed before any network call was made.
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The request never completed (connection refused, DNS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Request rejected ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The backend answered with a body we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure of an in-flight request observed by a de-duplicated waiter.
    #[error("{0}")]
    Shared(Arc<Error>),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a field validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The underlying error, looking through [`Error::Shared`] wrappers.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Self::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Transport(_) => ErrorCode::TransportError,
            Self::Remote { .. } => ErrorCode::RemoteRejected,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::InvalidResponse(_) => ErrorCode::InvalidResponse,
            Self::ProjectNotFound { .. } => ErrorCode::ProjectNotFound,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Shared(inner) => inner.error_code(),
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Unauthorized { .. } => Some(
                "Log in again:\n  \
                 tb login <email> --password <password>\n  \
                 New account: tb register <email> --password <pw> --confirm-password <pw>"
                    .to_string(),
            ),

            Self::Transport(_) => Some(
                "Is the backend running? Check the base URL with `tb config show` \
                 or override it with --api-url / TB_API_URL."
                    .to_string(),
            ),

            Self::ProjectNotFound { id } => Some(format!(
                "No project with ID '{id}'. Use `tb project list` to see available projects."
            )),

            Self::TaskNotFound { id } => Some(format!(
                "No task with ID '{id}'. Use `tb task list <project-id>` to see its tasks."
            )),

            Self::Validation { field, .. } => match field.as_str() {
                "status" => Some(
                    "Project statuses: active, completed. \
                     Task statuses: todo, in-progress, done."
                        .to_string(),
                ),
                "due_date" => Some(
                    "Use YYYY-MM-DD, an RFC 3339 timestamp, `today` or `tomorrow`.".to_string(),
                ),
                "confirm_password" => {
                    Some("Pass the same value to --password and --confirm-password.".to_string())
                }
                _ => None,
            },

            Self::Shared(inner) => inner.hint(),

            Self::InvalidArgument(_)
            | Self::Remote { .. }
            | Self::InvalidResponse(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Self::Validation { field, .. } = self {
            obj["error"]["field"] = serde_json::Value::String(field.clone());
        }

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

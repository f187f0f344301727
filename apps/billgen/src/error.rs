//! # Application Error Type
//!
//! Unified error type for commands and the bill controller.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Bill Generator                     │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                     │
//! │                                  │                                      │
//! │  StoreError ─────────────────────┼──► AppError { code, message }       │
//! │                                  │          │                           │
//! │  ExportError ────────────────────┤          ▼                           │
//! │                                  │    "error: shop name is required"   │
//! │  ConfigError ────────────────────┘    exit status 1 (2 for usage)      │
//! │                                                                         │
//! │  Nothing here aborts the process: the session loop prints the          │
//! │  message and keeps going.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billgen_core::{CoreError, ValidationError};
use billgen_store::StoreError;
use serde::Serialize;

use crate::receipt::ExportError;
use crate::state::ConfigError;

/// Error reported to the user.
///
/// ## Serialization
/// `history --json` and `show --json` print a failure on stdout as:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Bill not found: b-9"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing shop fields, empty bill, bad product fields
    ValidationFailure,

    /// History could not be read or written
    PersistenceFailure,

    /// Receipt could not be written
    ExportFailure,

    /// No bill or product with that id
    NotFound,

    /// Operation not allowed in the current lifecycle state
    InvalidState,

    /// Bad command line or configuration
    Usage,

    /// Anything else
    Internal,
}

impl AppError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationFailure, message)
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Usage, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::Usage => 2,
            _ => 1,
        }
    }
}

/// Converts core errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => AppError::not_found("Product", &id),
            CoreError::BillNotFound(id) => AppError::not_found("Bill", &id),
            e @ CoreError::InvalidState { .. } => AppError::new(ErrorCode::InvalidState, e.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Converts store errors.
///
/// Backend details are logged; the user gets a generic message.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(reason) => {
                tracing::error!(%reason, "Bill history is corrupt");
                AppError::new(ErrorCode::PersistenceFailure, "Bill history is unreadable")
            }
            e @ StoreError::UnsupportedVersion { .. } => {
                AppError::new(ErrorCode::PersistenceFailure, e.to_string())
            }
            StoreError::ConnectionFailed(e) => {
                tracing::error!("History database connection failed: {}", e);
                AppError::new(ErrorCode::PersistenceFailure, "Could not open bill history")
            }
            StoreError::MigrationFailed(e) => {
                tracing::error!("History migration failed: {}", e);
                AppError::new(ErrorCode::PersistenceFailure, "Could not prepare bill history")
            }
            StoreError::PoolExhausted => {
                AppError::new(ErrorCode::PersistenceFailure, "Bill history is busy")
            }
            e => {
                tracing::error!("History store error: {}", e);
                AppError::new(ErrorCode::PersistenceFailure, "Could not save bill history")
            }
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        tracing::error!(error = %err, "Receipt export failed");
        AppError::new(ErrorCode::ExportFailure, format!("Export failed: {}", err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::usage(format!("Invalid configuration: {}", err))
    }
}

/// Writing to the terminal failed.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(format!("Output failed: {}", err))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

/// Result type for app operations.
pub type AppResult<T> = Result<T, AppError>;

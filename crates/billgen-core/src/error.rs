//! # Error Types
//!
//! Domain-specific error types for billgen-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billgen-core errors (this file)                                       │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  billgen-store errors (separate crate)                                 │
//! │  └── StoreError       - Persistence failures                           │
//! │                                                                         │
//! │  billgen app errors                                                    │
//! │  └── AppError         - What the user sees (code + message)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AppError → user                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line item with this id in the draft.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// No bill with this id in history.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// The controller is not in a state that allows the operation.
    ///
    /// ## When This Occurs
    /// - Adding a product while a finalized bill is on screen
    /// - Generating twice without going back to the generator
    #[error("Cannot {operation} while {state}")]
    InvalidState { operation: String, state: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Reported to the user; the draft is left unchanged and the user can
/// always recover by correcting the input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be greater than zero.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// NaN or infinite input.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// A bill needs at least one line item.
    #[error("Add at least one product before generating a bill")]
    EmptyBill,
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

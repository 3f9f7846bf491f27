//! # Error Types
//!
//! Domain-specific error types for barman-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  barman-core errors (this file)                                     │
//! │  ├── CoreError        - Business-rule rejections                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  barman-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── EngineError      - What engine callers see                     │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → EngineError → caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include remediation data in the variant (available stock, required
//!    limit) so the caller can present a precise message
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule rejections.
///
/// Every variant leaves all ledgers in their pre-batch state: nothing
/// partial is ever committed, so no compensating action is needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Item id is unknown or soft-deleted.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Customer id is unknown.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Insufficient stock to cover the batch's aggregated request.
    ///
    /// `requested` is the quantity summed across every line of the batch
    /// that references this item, so a single oversell is reported even
    /// when split across lines.
    #[error("Insufficient stock for {item_name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_name: String,
        available: i64,
        requested: i64,
    },

    /// The batch total would push the customer's pending balance past
    /// their tab limit.
    ///
    /// `required_limit_kobo` is the minimum limit that would have allowed
    /// this batch (balance + batch total). The engine never raises the
    /// limit itself - raising it and resubmitting is an explicit,
    /// human-authorized two-step flow.
    #[error(
        "Tab limit exceeded for {customer_name}: balance {balance_kobo}, \
         limit {limit_kobo}, required {required_limit_kobo}"
    )]
    TabLimitExceeded {
        customer_id: String,
        customer_name: String,
        balance_kobo: i64,
        limit_kobo: i64,
        required_limit_kobo: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. They are local,
/// never retried automatically, and reported to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A batch must contain at least one line.
    #[error("batch must contain at least one line")]
    EmptyBatch,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

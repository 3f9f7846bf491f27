//! # Validation Module
//!
//! Input validation for the sale engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Caller (UI / API collaborator)                            │
//! │  └── Basic format checks, immediate feedback                        │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE                                               │
//! │  └── Shape validation before any ledger is touched                  │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  └── NOT NULL / CHECK / foreign key constraints                     │
//! │                                                                     │
//! │  Defense in depth: multiple layers catch different errors           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::BatchRequest;
use crate::{MAX_BATCH_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Batch Validation
// =============================================================================

/// Validates the shape of a batch request before any ledger read.
///
/// ## Rules
/// - At least one line, at most `MAX_BATCH_LINES`
/// - Every quantity in `1..=MAX_LINE_QUANTITY`
/// - Non-empty recording actor
///
/// Unknown item/customer ids are checked later against the ledgers, inside
/// the batch transaction.
pub fn validate_batch(request: &BatchRequest) -> ValidationResult<()> {
    if request.lines.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    if request.lines.len() > MAX_BATCH_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_BATCH_LINES as i64,
        });
    }

    for line in &request.lines {
        if line.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    if request.recorded_by.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "recorded_by".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a cost or limit amount in kobo.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero is allowed (free item, no-credit tab)
pub fn validate_kobo_amount(field: &str, kobo: i64) -> ValidationResult<()> {
    if kobo < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an on-hand stock level (initial stock on item creation).
///
/// ## Rules
/// - Must be non-negative (>= 0); zero is allowed (out of stock)
pub fn validate_stock_level(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a restock delta.
///
/// ## Rules
/// - Must be positive (> 0); a delivery always adds stock. No upper cap -
///   deliveries can legitimately exceed a single line's quantity limit.
pub fn validate_restock_delta(delta: i64) -> ValidationResult<()> {
    if delta <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "delta".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item or customer display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Optional leading `+`, then digits, spaces, or hyphens
/// - At most 20 characters
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "phone_number".to_string(),
            max: 20,
        });
    }

    let rest = phone.strip_prefix('+').unwrap_or(phone);
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must contain only digits, spaces, hyphens, and an optional leading +"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

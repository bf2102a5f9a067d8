//! # Validation Module
//!
//! Input validation for front-desk and guest-facing intake paths.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API surface, out of scope)                      │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Runs before any lifecycle logic touches the store                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK / foreign key constraints                        │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a guest name at booking intake.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum [`MAX_NAME_LEN`] characters
///
/// ## Returns
/// The trimmed name.
pub fn validate_guest_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "guest_name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "guest_name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a housekeeping assignee name.
pub fn validate_assignee(assignee: &str) -> ValidationResult<String> {
    let assignee = assignee.trim();

    if assignee.is_empty() {
        return Err(ValidationError::Required {
            field: "assignee".to_string(),
        });
    }

    Ok(assignee.to_string())
}

/// Validates a maintenance request title.
pub fn validate_title(title: &str) -> ValidationResult<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(title.to_string())
}

/// Validates a slip rejection reason.
///
/// A rejection must tell the guest what to fix; an empty reason is not a
/// rejection, it is a shrug.
pub fn validate_reject_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 500,
        });
    }

    Ok(reason.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates occupant counts against a room's capacity.
///
/// ## Rules
/// - At least one adult
/// - Children count non-negative
/// - Total occupants must not exceed room capacity
pub fn validate_occupants(adults: i64, children: i64, capacity: i64) -> ValidationResult<()> {
    if adults <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "adults".to_string(),
        });
    }

    if children < 0 {
        return Err(ValidationError::OutOfRange {
            field: "children".to_string(),
            min: 0,
            max: capacity,
        });
    }

    if adults + children > capacity {
        return Err(ValidationError::OutOfRange {
            field: "occupants".to_string(),
            min: 1,
            max: capacity,
        });
    }

    Ok(())
}

/// Validates a monetary amount that must be strictly positive
/// (payments, slip claims, order line prices).
pub fn validate_positive_amount(cents: i64, field: &str) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for lodge-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lodge-core errors (this file)                                         │
//! │  ├── DomainError      - Lifecycle / invariant violations               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lodge-db errors (separate crate)                                      │
//! │  └── StoreError       - Database operation failures                    │
//! │                                                                         │
//! │  lodge-ops errors (separate crate)                                     │
//! │  └── OpsError         - Domain(DomainError) | Store(StoreError)        │
//! │                                                                         │
//! │  Flow: ValidationError → DomainError → OpsError → Caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, statuses)
//! 3. Errors are enum variants, never String
//! 4. A failed operation leaves every entity unchanged - the error IS the result

use thiserror::Error;

// =============================================================================
// Domain Error
// =============================================================================

/// Lifecycle and cross-entity invariant errors.
///
/// Front-desk operations are financially consequential, so every failure
/// path is a distinct, observable variant. No error is silently swallowed.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Attempted state change is not an edge of the entity's state machine.
    ///
    /// ## When This Occurs
    /// - `confirm` on a booking that is not `pending`
    /// - `check_out` on a booking that is not `checked_in`
    /// - completing a cleaning task that is not `in_progress`
    #[error("{entity} {id} cannot go from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// Booking interval conflicts with an existing active booking.
    ///
    /// ## When This Occurs
    /// - `create_booking` for a room that already has a `confirmed` or
    ///   `checked_in` booking overlapping the requested dates
    #[error("Room {room_id} already has an active booking overlapping {check_in}..{check_out}")]
    Overlap {
        room_id: String,
        check_in: String,
        check_out: String,
    },

    /// Cross-entity guard failure: the room's own status blocks the action.
    ///
    /// ## When This Occurs
    /// - `check_in` while the room is still `cleaning` from the prior stay
    /// - `check_in` while the room is held in `maintenance`
    #[error("Room {room_id} is {status}, not available")]
    RoomUnavailable { room_id: String, status: String },

    /// Malformed date range.
    #[error("Invalid stay interval: {reason}")]
    InvalidInterval { reason: String },

    /// Referenced entity id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The target was already resolved; resolving twice is rejected,
    /// never double-applied.
    ///
    /// ## When This Occurs
    /// - approving or rejecting a payment slip that is no longer `pending`
    #[error("{entity} {id} is already resolved ({status})")]
    AlreadyResolved {
        entity: &'static str,
        id: String,
        status: String,
    },

    /// Actor lacks the capability for this action. Checked at the boundary,
    /// before any entity is read or written.
    #[error("Actor {actor} is not allowed to {action}")]
    PermissionDenied { actor: String, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl DomainError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(
        entity: &'static str,
        id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        DomainError::InvalidTransition {
            entity,
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Used for early validation before any lifecycle logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date, invalid id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with DomainError.
pub type DomainResult<T> = Result<T, DomainError>;

// =============================================================================
// Unit Tests
// =============================================================================

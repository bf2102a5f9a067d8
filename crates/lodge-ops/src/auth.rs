//! # Permission Gate
//!
//! Capability checks at the workflow boundary.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutating workflow takes an &Actor and calls                      │
//! │                                                                         │
//! │      actor.require(Action::...)?                                        │
//! │                                                                         │
//! │  as its FIRST statement - before any entity is read or written. A      │
//! │  denied actor learns nothing about the target (not even whether it     │
//! │  exists) and changes nothing.                                           │
//! │                                                                         │
//! │  How an actor earns its capability set (roles, sessions, tokens) is    │
//! │  the caller's problem; the workflows only check the set.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use lodge_core::{DomainError, DomainResult};

// =============================================================================
// Action
// =============================================================================

/// A capability a workflow may demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateBooking,
    ConfirmBooking,
    CheckInGuest,
    CheckOutGuest,
    CancelBooking,
    ManageHousekeeping,
    ManageMaintenance,
    SubmitSlips,
    VerifySlips,
    SettlePayments,
    PostOrders,
}

impl Action {
    /// Stable name used in error messages and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::CreateBooking => "create_booking",
            Action::ConfirmBooking => "confirm_booking",
            Action::CheckInGuest => "check_in_guest",
            Action::CheckOutGuest => "check_out_guest",
            Action::CancelBooking => "cancel_booking",
            Action::ManageHousekeeping => "manage_housekeeping",
            Action::ManageMaintenance => "manage_maintenance",
            Action::SubmitSlips => "submit_slips",
            Action::VerifySlips => "verify_slips",
            Action::SettlePayments => "settle_payments",
            Action::PostOrders => "post_orders",
        }
    }

    /// Every capability - the front-desk manager set.
    pub fn all() -> HashSet<Action> {
        [
            Action::CreateBooking,
            Action::ConfirmBooking,
            Action::CheckInGuest,
            Action::CheckOutGuest,
            Action::CancelBooking,
            Action::ManageHousekeeping,
            Action::ManageMaintenance,
            Action::SubmitSlips,
            Action::VerifySlips,
            Action::SettlePayments,
            Action::PostOrders,
        ]
        .into_iter()
        .collect()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Actor
// =============================================================================

/// Who is asking, and what they may do.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Staff or guest identifier; recorded on verifications and logs.
    pub id: String,
    permissions: HashSet<Action>,
}

impl Actor {
    /// An actor with an explicit capability set.
    pub fn new(id: impl Into<String>, permissions: HashSet<Action>) -> Self {
        Actor {
            id: id.into(),
            permissions,
        }
    }

    /// An actor holding every capability.
    pub fn with_all(id: impl Into<String>) -> Self {
        Actor::new(id, Action::all())
    }

    /// Checks a capability; `PermissionDenied` if absent.
    pub fn require(&self, action: Action) -> DomainResult<()> {
        if self.permissions.contains(&action) {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied {
                actor: self.id.clone(),
                action: action.as_str().to_string(),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present_and_absent() {
        let desk = Actor::new("staff-7", [Action::CreateBooking].into_iter().collect());
        assert!(desk.require(Action::CreateBooking).is_ok());

        let err = desk.require(Action::VerifySlips).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied { .. }));
        assert_eq!(err.to_string(), "Actor staff-7 is not allowed to verify_slips");
    }

    #[test]
    fn test_with_all_holds_everything() {
        let manager = Actor::with_all("manager-1");
        assert!(manager.require(Action::SettlePayments).is_ok());
        assert!(manager.require(Action::ManageMaintenance).is_ok());
    }
}

//! # Payment Slip Verification
//!
//! Guest-uploaded bank-transfer evidence, verified by staff.
//!
//! ## Single-Shot Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            approve: booking settlement flag -> paid                     │
//! │  pending ──┤                                                            │
//! │            reject:  reason recorded, guest re-uploads                   │
//! │                                                                         │
//! │  Both outcomes are terminal. The resolving UPDATE is compare-and-set   │
//! │  on `pending`, so two staff racing on one slip resolve it exactly      │
//! │  once; the loser gets AlreadyResolved. Approval flips the booking's    │
//! │  flag without creating a Payment record - the slip itself is the       │
//! │  evidence of the transfer.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Action, Actor};
use crate::error::OpsResult;
use lodge_core::{
    validation, DomainError, DomainEvent, PaymentSlip, SettlementStatus, SlipStatus,
};
use lodge_db::{BookingRepository, Database, OutboxRepository, PaymentRepository};

/// Payment slip operations.
#[derive(Debug, Clone)]
pub struct SlipVerificationWorkflow {
    db: Database,
}

impl SlipVerificationWorkflow {
    pub fn new(db: Database) -> Self {
        SlipVerificationWorkflow { db }
    }

    /// Loads a slip or fails with `NotFound`.
    pub async fn get(&self, slip_id: &str) -> OpsResult<PaymentSlip> {
        self.db
            .payments()
            .get_slip_by_id(slip_id)
            .await?
            .ok_or_else(|| DomainError::not_found("PaymentSlip", slip_id).into())
    }

    /// Guest upload: a pending slip claiming an amount was transferred.
    pub async fn submit_slip(
        &self,
        actor: &Actor,
        booking_id: &str,
        image_ref: &str,
        claimed_cents: i64,
    ) -> OpsResult<PaymentSlip> {
        actor.require(Action::SubmitSlips)?;
        validation::validate_positive_amount(claimed_cents, "claimed_amount")
            .map_err(DomainError::from)?;

        // The slip must point at a real booking
        self.db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;

        let slip = PaymentSlip {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            image_ref: image_ref.to_string(),
            claimed_cents,
            status: SlipStatus::Pending,
            verifier_id: None,
            verified_at: None,
            reject_reason: None,
            created_at: Utc::now(),
        };
        self.db.payments().insert_slip(&slip).await?;

        info!(slip_id = %slip.id, booking_id, claimed_cents, "Payment slip submitted");
        Ok(slip)
    }

    /// Approves a slip: stamps verifier and timestamp and flips the
    /// booking's settlement flag to `paid`, in one transaction.
    ///
    /// No Payment record is created here - the slip IS the evidence, and
    /// the flag is the single aggregate the front desk reads. Cash/card
    /// settlement at the desk is the separate path that records payments.
    ///
    /// ## Errors
    /// `AlreadyResolved` if the slip is no longer `pending` - an approval
    /// is never applied twice, however many staff click it.
    pub async fn approve_slip(&self, actor: &Actor, slip_id: &str) -> OpsResult<PaymentSlip> {
        actor.require(Action::VerifySlips)?;
        let slip = self.get(slip_id).await?;
        self.ensure_pending(&slip)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let resolved = PaymentRepository::resolve_slip_in(
            &mut *tx,
            &slip.id,
            SlipStatus::Approved,
            &actor.id,
            None,
            now,
        )
        .await?;
        if !resolved {
            return Err(self.already_resolved(slip));
        }

        BookingRepository::set_payment_status_in(
            &mut *tx,
            &slip.booking_id,
            SettlementStatus::Paid,
            now,
        )
        .await?;

        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::PaymentApproved {
                slip_id: slip.id.clone(),
                booking_id: slip.booking_id.clone(),
                verifier_id: actor.id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(slip_id, verifier = %actor.id, "Slip approved, booking marked paid");
        self.get(slip_id).await
    }

    /// Rejects a slip with a reason the guest can act on. No payment is
    /// recorded; the guest uploads a new slip.
    pub async fn reject_slip(
        &self,
        actor: &Actor,
        slip_id: &str,
        reason: &str,
    ) -> OpsResult<PaymentSlip> {
        actor.require(Action::VerifySlips)?;
        let reason = validation::validate_reject_reason(reason).map_err(DomainError::from)?;
        let slip = self.get(slip_id).await?;
        self.ensure_pending(&slip)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let resolved = PaymentRepository::resolve_slip_in(
            &mut *tx,
            &slip.id,
            SlipStatus::Rejected,
            &actor.id,
            Some(&reason),
            now,
        )
        .await?;
        if !resolved {
            return Err(self.already_resolved(slip));
        }
        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::SlipRejected {
                slip_id: slip.id.clone(),
                booking_id: slip.booking_id.clone(),
                reason,
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(slip_id, verifier = %actor.id, "Slip rejected");
        self.get(slip_id).await
    }

    /// All slips for a booking, newest first.
    pub async fn slips_for_booking(&self, booking_id: &str) -> OpsResult<Vec<PaymentSlip>> {
        Ok(self.db.payments().list_slips_for_booking(booking_id).await?)
    }

    fn ensure_pending(&self, slip: &PaymentSlip) -> OpsResult<()> {
        if slip.status.is_resolved() {
            return Err(self.already_resolved(slip.clone()));
        }
        Ok(())
    }

    fn already_resolved(&self, slip: PaymentSlip) -> crate::error::OpsError {
        DomainError::AlreadyResolved {
            entity: "PaymentSlip",
            id: slip.id,
            status: slip.status.to_string(),
        }
        .into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_booking, seed_room, test_db};
    use lodge_core::BookingStatus;

    async fn setup() -> (Database, String) {
        let db = test_db().await;
        let room = seed_room(&db, "101", 100_000, 2).await;
        let booking =
            seed_booking(&db, &room.id, "2024-03-01", "2024-03-03", BookingStatus::Confirmed).await;
        (db, booking.id)
    }

    #[tokio::test]
    async fn test_approve_marks_booking_paid_without_payment_record() {
        let (db, booking_id) = setup().await;
        let slips = SlipVerificationWorkflow::new(db.clone());
        let guest = Actor::new("guest-1", [Action::SubmitSlips].into_iter().collect());
        let verifier = Actor::with_all("staff-7");

        let slip = slips
            .submit_slip(&guest, &booking_id, "slips/img-1.jpg", 200_000)
            .await
            .unwrap();
        let resolved = slips.approve_slip(&verifier, &slip.id).await.unwrap();
        assert_eq!(resolved.status, SlipStatus::Approved);
        assert_eq!(resolved.verifier_id.as_deref(), Some("staff-7"));
        assert!(resolved.verified_at.is_some());

        let stored = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, SettlementStatus::Paid);

        // The slip is the evidence; no payment record is synthesized
        assert!(db.payments().list_for_booking(&booking_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_double_approval_is_rejected_once() {
        let (db, booking_id) = setup().await;
        let slips = SlipVerificationWorkflow::new(db.clone());
        let verifier = Actor::with_all("staff-7");

        let slip = slips
            .submit_slip(&verifier, &booking_id, "slips/img-1.jpg", 200_000)
            .await
            .unwrap();
        slips.approve_slip(&verifier, &slip.id).await.unwrap();

        let err = slips.approve_slip(&verifier, &slip.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::AlreadyResolved { .. })));
    }

    #[tokio::test]
    async fn test_reject_requires_reason_and_records_it() {
        let (db, booking_id) = setup().await;
        let slips = SlipVerificationWorkflow::new(db.clone());
        let verifier = Actor::with_all("staff-7");

        let slip = slips
            .submit_slip(&verifier, &booking_id, "slips/img-1.jpg", 50_000)
            .await
            .unwrap();

        let err = slips.reject_slip(&verifier, &slip.id, "   ").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));

        let rejected = slips
            .reject_slip(&verifier, &slip.id, "amount does not match folio")
            .await
            .unwrap();
        assert_eq!(rejected.status, SlipStatus::Rejected);
        assert_eq!(rejected.reject_reason.as_deref(), Some("amount does not match folio"));

        // No payment, booking flag untouched
        assert!(db.payments().list_for_booking(&booking_id).await.unwrap().is_empty());
        let stored = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, SettlementStatus::Pending);
    }

    #[tokio::test]
    async fn test_verification_needs_capability() {
        let (db, booking_id) = setup().await;
        let slips = SlipVerificationWorkflow::new(db);
        let guest = Actor::new("guest-1", [Action::SubmitSlips].into_iter().collect());

        let slip = slips
            .submit_slip(&guest, &booking_id, "slips/img-1.jpg", 50_000)
            .await
            .unwrap();
        let err = slips.approve_slip(&guest, &slip.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::PermissionDenied { .. })));
    }
}

//! # Billing & Settlement
//!
//! Folio aggregation, front-desk settlement, and refunds.
//!
//! ## Folio Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  room_cents   = booking.total_cents      (frozen at creation)          │
//! │  order_cents  = Σ linked orders' totals  (all statuses - unpaid and    │
//! │                                           paid both sit on the folio)  │
//! │  grand_cents  = room_cents + order_cents                               │
//! │  paid_cents   = Σ completed payments for the booking                   │
//! │                                                                         │
//! │  settle: paid ≥ grand → `paid`, else `partial`                         │
//! │  refund: flips the payment record, never deletes it; the booking flag  │
//! │          is recomputed from what remains completed                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Action, Actor};
use crate::error::OpsResult;
use lodge_core::{
    validation, DomainError, DomainEvent, Money, Payment, PaymentMethod, PaymentStatus,
    SettlementStatus,
};
use lodge_db::{BookingRepository, Database, OutboxRepository, PaymentRepository};

// =============================================================================
// Totals
// =============================================================================

/// A booking's folio, aggregated on demand. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingTotals {
    /// Frozen room charge.
    pub room_cents: i64,
    /// Sum of linked order totals.
    pub order_cents: i64,
    /// What the stay owes in total.
    pub grand_cents: i64,
    /// Sum of completed payments.
    pub paid_cents: i64,
}

impl BookingTotals {
    /// What is still owed; negative means overpaid.
    pub fn balance_cents(&self) -> i64 {
        self.grand_cents - self.paid_cents
    }

    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_cents)
    }
}

// =============================================================================
// Workflow
// =============================================================================

/// Folio aggregation and settlement operations.
#[derive(Debug, Clone)]
pub struct BillingWorkflow {
    db: Database,
}

impl BillingWorkflow {
    pub fn new(db: Database) -> Self {
        BillingWorkflow { db }
    }

    /// Aggregates a booking's folio: room charge + linked orders vs
    /// completed payments. Pure read.
    pub async fn booking_totals(&self, booking_id: &str) -> OpsResult<BookingTotals> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;

        let order_cents = self.db.orders().sum_totals_for_booking(booking_id).await?;
        let paid_cents = self.db.payments().total_completed_for_booking(booking_id).await?;

        Ok(BookingTotals {
            room_cents: booking.total_cents,
            order_cents,
            grand_cents: booking.total_cents + order_cents,
            paid_cents,
        })
    }

    /// Records a completed front-desk payment and recomputes the
    /// booking's settlement flag: `paid` when the folio is covered,
    /// `partial` otherwise.
    pub async fn settle_booking_payment(
        &self,
        actor: &Actor,
        booking_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> OpsResult<Payment> {
        actor.require(Action::SettlePayments)?;
        validation::validate_positive_amount(amount_cents, "amount").map_err(DomainError::from)?;

        let totals = self.booking_totals(booking_id).await?;
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: Some(booking_id.to_string()),
            order_id: None,
            amount_cents,
            method,
            status: PaymentStatus::Completed,
            reference,
            created_at: now,
            updated_at: now,
        };

        let paid_after = totals.paid_cents + amount_cents;
        let flag = if paid_after >= totals.grand_cents {
            SettlementStatus::Paid
        } else {
            SettlementStatus::Partial
        };

        let mut tx = self.db.begin().await?;
        PaymentRepository::insert_in(&mut *tx, &payment).await?;
        BookingRepository::set_payment_status_in(&mut *tx, booking_id, flag, now).await?;
        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::BookingSettled {
                booking_id: booking_id.to_string(),
                payment_id: payment.id.clone(),
                amount_cents,
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(booking_id, payment_id = %payment.id, amount_cents, flag = %flag, "Payment settled");
        Ok(payment)
    }

    /// Refunds a completed payment: the record flips to `refunded` (never
    /// deleted) and the booking's flag is recomputed from what remains.
    ///
    /// Only a closed stay refunds - the guest has either cancelled or
    /// checked out. Adjustments to a live folio go through settlement.
    ///
    /// ## Errors
    /// - `AlreadyResolved` if the payment is already refunded
    /// - `InvalidTransition` if it never completed (`pending`/`failed`),
    ///   or the booking is still open
    pub async fn refund_booking_payment(&self, actor: &Actor, payment_id: &str) -> OpsResult<Payment> {
        actor.require(Action::SettlePayments)?;
        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", payment_id))?;

        if payment.status == PaymentStatus::Refunded {
            return Err(DomainError::AlreadyResolved {
                entity: "Payment",
                id: payment.id,
                status: payment.status.to_string(),
            }
            .into());
        }
        if !payment.status.can_transition_to(PaymentStatus::Refunded) {
            return Err(DomainError::invalid_transition(
                "Payment",
                &payment.id,
                payment.status,
                PaymentStatus::Refunded,
            )
            .into());
        }

        // The flag after the refund, computed from the folio as it stands.
        let flag = match &payment.booking_id {
            Some(booking_id) => {
                let booking = self
                    .db
                    .bookings()
                    .get_by_id(booking_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
                if !booking.status.is_terminal() {
                    return Err(DomainError::invalid_transition(
                        "Payment",
                        &payment.id,
                        payment.status,
                        PaymentStatus::Refunded,
                    )
                    .into());
                }
                let totals = self.booking_totals(booking_id).await?;
                let remaining = totals.paid_cents - payment.amount_cents;
                Some(if remaining <= 0 {
                    SettlementStatus::Refunded
                } else if remaining >= totals.grand_cents {
                    SettlementStatus::Paid
                } else {
                    SettlementStatus::Partial
                })
            }
            None => None,
        };

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let swapped = PaymentRepository::set_status_in(
            &mut *tx,
            &payment.id,
            PaymentStatus::Completed,
            PaymentStatus::Refunded,
            now,
        )
        .await?;
        if !swapped {
            return Err(DomainError::AlreadyResolved {
                entity: "Payment",
                id: payment.id,
                status: PaymentStatus::Refunded.to_string(),
            }
            .into());
        }
        if let (Some(booking_id), Some(flag)) = (&payment.booking_id, flag) {
            BookingRepository::set_payment_status_in(&mut *tx, booking_id, flag, now).await?;
        }
        tx.commit().await?;

        info!(payment_id, "Payment refunded");
        self.db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", payment_id).into())
    }

    /// All payments on a booking's folio, oldest first.
    pub async fn payments_for_booking(&self, booking_id: &str) -> OpsResult<Vec<Payment>> {
        Ok(self.db.payments().list_for_booking(booking_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Booking Lifecycle Workflow
//!
//! Intake, confirmation, check-in/out and cancellation for stays.
//!
//! ## Creation Critical Section
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_booking(room R, interval I):                                   │
//! │                                                                         │
//! │    1. permission gate, input validation                                │
//! │    2. ───► acquire per-room lock for R ◄───                            │
//! │    3. load R, check occupants vs capacity                              │
//! │    4. BEGIN                                                             │
//! │    5.   scan: any pending/confirmed/checked_in booking of R            │
//! │         overlapping I?  → Overlap error                                │
//! │    6.   insert booking (rate snapshot frozen here)                     │
//! │    7.   insert pending hold payment, queue BookingCreated              │
//! │    8. COMMIT, release lock                                             │
//! │                                                                         │
//! │  The lock makes 5+6 atomic against a concurrent create for the same   │
//! │  room; transitions (confirm/check-in) rely on the scan having          │
//! │  guaranteed exclusivity at creation and do not re-check overlap.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Action, Actor};
use crate::error::OpsResult;
use crate::locks::RoomLocks;
use crate::rooms::RoomStateManager;
use lodge_core::{
    validation, Booking, BookingStatus, DomainError, DomainEvent, Payment, PaymentMethod,
    PaymentStatus, Room, RoomStatus, SettlementStatus, StayInterval,
};
use lodge_db::{BookingRepository, Database, OutboxRepository, PaymentRepository, RoomRepository};

// =============================================================================
// Requests
// =============================================================================

/// Intake data for a new booking.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub room_id: String,
    /// Optional link to a stored guest profile.
    pub guest_id: Option<String>,
    pub guest_name: String,
    pub guest_phone: Option<String>,
    pub adults: i64,
    pub children: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

// =============================================================================
// Workflow
// =============================================================================

/// Booking lifecycle operations.
#[derive(Debug, Clone)]
pub struct BookingWorkflow {
    db: Database,
    locks: Arc<RoomLocks>,
}

impl BookingWorkflow {
    pub fn new(db: Database, locks: Arc<RoomLocks>) -> Self {
        BookingWorkflow { db, locks }
    }

    /// Loads a booking or fails with `NotFound`.
    pub async fn get(&self, booking_id: &str) -> OpsResult<Booking> {
        self.db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id).into())
    }

    /// Creates a `pending` booking, freezing the room's current rate. A
    /// pending payment for the frozen total goes in alongside it - the
    /// reservation hold the guest is expected to cover.
    ///
    /// `today` is the property's business date; a stay may not start in
    /// the past, same-day walk-ins are fine.
    ///
    /// ## Errors
    /// - `InvalidInterval` - inverted/empty range, or starts before `today`
    /// - `Overlap` - another booking (pending included) still holds the
    ///   room over these dates
    /// - `Validation` - bad guest name or occupant counts
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: CreateBookingRequest,
        today: NaiveDate,
    ) -> OpsResult<Booking> {
        actor.require(Action::CreateBooking)?;

        let guest_name = validation::validate_guest_name(&request.guest_name)
            .map_err(DomainError::from)?;
        let interval = StayInterval::new(request.check_in, request.check_out)?;
        interval.ensure_not_past(today)?;

        // Critical section: conflict scan + insert, serialized per room.
        let _guard = self.locks.acquire(&request.room_id).await;

        let room = self
            .db
            .rooms()
            .get_by_id(&request.room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", &request.room_id))?;
        validation::validate_occupants(request.adults, request.children, room.capacity)
            .map_err(DomainError::from)?;

        let mut tx = self.db.begin().await?;

        let conflicts =
            BookingRepository::find_conflicting_in(&mut *tx, &room.id, &interval).await?;
        if !conflicts.is_empty() {
            warn!(room_id = %room.id, stay = %interval, "Booking rejected: overlap");
            return Err(DomainError::Overlap {
                room_id: room.id,
                check_in: interval.check_in().to_string(),
                check_out: interval.check_out().to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            room_id: room.id.clone(),
            guest_id: request.guest_id,
            guest_name,
            guest_phone: request.guest_phone,
            adults: request.adults,
            children: request.children,
            check_in: interval.check_in(),
            check_out: interval.check_out(),
            status: BookingStatus::Pending,
            payment_status: SettlementStatus::Pending,
            // Snapshot: tonight's rate is this stay's rate, forever
            rate_cents_snapshot: room.rate_cents,
            total_cents: room.rate_cents * interval.nights(),
            created_at: now,
            updated_at: now,
        };
        BookingRepository::insert_in(&mut *tx, &booking).await?;

        // The reservation hold: pending until the desk settles or a slip
        // is approved.
        let hold = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: Some(booking.id.clone()),
            order_id: None,
            amount_cents: booking.total_cents,
            method: PaymentMethod::Transfer,
            status: PaymentStatus::Pending,
            reference: None,
            created_at: now,
            updated_at: now,
        };
        PaymentRepository::insert_in(&mut *tx, &hold).await?;

        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::BookingCreated {
                booking_id: booking.id.clone(),
                room_id: booking.room_id.clone(),
                check_in: booking.check_in,
                check_out: booking.check_out,
                total_cents: booking.total_cents,
            },
            now,
        )
        .await?;

        tx.commit().await?;
        info!(booking_id = %booking.id, room_id = %booking.room_id, stay = %interval, "Booking created");
        Ok(booking)
    }

    /// `pending → confirmed`. The room's state is untouched; confirmation
    /// hardens the hold made at creation.
    pub async fn confirm_booking(&self, actor: &Actor, booking_id: &str) -> OpsResult<Booking> {
        actor.require(Action::ConfirmBooking)?;
        let booking = self.get(booking_id).await?;
        self.ensure_edge(&booking, BookingStatus::Confirmed)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        self.cas_booking(&mut tx, &booking, BookingStatus::Confirmed, now).await?;
        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::BookingConfirmed {
                booking_id: booking.id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(booking_id, "Booking confirmed");
        self.get(booking_id).await
    }

    /// `confirmed → checked_in`, occupying the room.
    ///
    /// ## Errors
    /// `RoomUnavailable` if the room is not `available` - still in
    /// cleaning from the prior stay, or held in maintenance. The booking
    /// stays `confirmed`; check in again once the room is released.
    pub async fn check_in(&self, actor: &Actor, booking_id: &str) -> OpsResult<Booking> {
        actor.require(Action::CheckInGuest)?;
        let booking = self.get(booking_id).await?;
        self.ensure_edge(&booking, BookingStatus::CheckedIn)?;

        let room = self.room_of(&booking).await?;
        if room.status != RoomStatus::Available {
            return Err(DomainError::RoomUnavailable {
                room_id: room.id,
                status: room.status.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        self.cas_booking(&mut tx, &booking, BookingStatus::CheckedIn, now).await?;
        RoomStateManager::transition_in(
            &mut *tx,
            &room.id,
            RoomStatus::Available,
            RoomStatus::Occupied,
            now,
        )
        .await?;
        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::GuestCheckedIn {
                booking_id: booking.id.clone(),
                room_id: room.id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(booking_id, room_id = %room.id, "Guest checked in");
        self.get(booking_id).await
    }

    /// `checked_in → checked_out`, sending the room to cleaning.
    ///
    /// Settlement is not a precondition: an unpaid folio is the billing
    /// desk's problem, not a reason to keep a departed guest checked in.
    pub async fn check_out(&self, actor: &Actor, booking_id: &str) -> OpsResult<Booking> {
        actor.require(Action::CheckOutGuest)?;
        let booking = self.get(booking_id).await?;
        self.ensure_edge(&booking, BookingStatus::CheckedOut)?;

        let room = self.room_of(&booking).await?;
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        self.cas_booking(&mut tx, &booking, BookingStatus::CheckedOut, now).await?;
        RoomStateManager::transition_in(
            &mut *tx,
            &room.id,
            RoomStatus::Occupied,
            RoomStatus::Cleaning,
            now,
        )
        .await?;
        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::GuestCheckedOut {
                booking_id: booking.id.clone(),
                room_id: room.id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(booking_id, room_id = %room.id, "Guest checked out");
        self.get(booking_id).await
    }

    /// Cancels a `pending` or `confirmed` booking, voiding its unmet
    /// reservation hold. Guests who are checked in check out; they do not
    /// cancel.
    pub async fn cancel_booking(
        &self,
        actor: &Actor,
        booking_id: &str,
        today: NaiveDate,
    ) -> OpsResult<Booking> {
        actor.require(Action::CancelBooking)?;
        let booking = self.get(booking_id).await?;
        self.ensure_edge(&booking, BookingStatus::Cancelled)?;

        let room = self.room_of(&booking).await?;
        let holds = self.db.payments().list_for_booking(&booking.id).await?;
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        self.cas_booking(&mut tx, &booking, BookingStatus::Cancelled, now).await?;

        // Pending holds die with the booking; completed payments stay and
        // go through the refund path if the guest asks.
        for hold in holds.iter().filter(|p| p.status == PaymentStatus::Pending) {
            PaymentRepository::set_status_in(
                &mut *tx,
                &hold.id,
                PaymentStatus::Pending,
                PaymentStatus::Failed,
                now,
            )
            .await?;
        }

        // Defensive release: a cancelled booking never holds its room, so
        // if the room reads occupied with no other active stay covering
        // today, free it. The CAS makes this a no-op when something else
        // legitimately holds the room.
        if room.status == RoomStatus::Occupied {
            let covering =
                BookingRepository::find_active_covering_in(&mut *tx, &room.id, today, &booking.id)
                    .await?;
            if covering.is_empty() {
                let released = RoomRepository::set_status_in(
                    &mut *tx,
                    &room.id,
                    RoomStatus::Occupied,
                    RoomStatus::Available,
                    now,
                )
                .await?;
                if released {
                    OutboxRepository::queue_in(
                        &mut *tx,
                        &DomainEvent::RoomStatusChanged {
                            room_id: room.id.clone(),
                            from: RoomStatus::Occupied,
                            to: RoomStatus::Available,
                        },
                        now,
                    )
                    .await?;
                }
            }
        }

        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::BookingCancelled {
                booking_id: booking.id.clone(),
                room_id: room.id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(booking_id, room_id = %room.id, "Booking cancelled");
        self.get(booking_id).await
    }

    /// Rooms bookable over the interval: currently `available` AND free of
    /// any active (`confirmed`/`checked_in`) overlapping booking.
    ///
    /// Pending bookings do not appear here - an unconfirmed hold does not
    /// take a room off the market, the creation-time scan is what keeps
    /// two holds from both confirming.
    pub async fn find_available_rooms(&self, interval: &StayInterval) -> OpsResult<Vec<Room>> {
        let busy = self.db.bookings().rooms_with_active_overlap(interval).await?;
        let rooms = self.db.rooms().list_by_status(RoomStatus::Available).await?;
        Ok(rooms
            .into_iter()
            .filter(|room| !busy.contains(&room.id))
            .collect())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_edge(&self, booking: &Booking, next: BookingStatus) -> OpsResult<()> {
        if !booking.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(
                "Booking",
                &booking.id,
                booking.status,
                next,
            )
            .into());
        }
        Ok(())
    }

    async fn room_of(&self, booking: &Booking) -> OpsResult<Room> {
        self.db
            .rooms()
            .get_by_id(&booking.room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", &booking.room_id).into())
    }

    /// CAS from the status the caller just proved legal; a zero-row write
    /// means a racing workflow moved the booking first.
    async fn cas_booking(
        &self,
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        booking: &Booking,
        next: BookingStatus,
        now: chrono::DateTime<Utc>,
    ) -> OpsResult<()> {
        let swapped =
            BookingRepository::set_status_in(&mut **tx, &booking.id, booking.status, next, now)
                .await?;
        if !swapped {
            return Err(DomainError::invalid_transition(
                "Booking",
                &booking.id,
                booking.status,
                next,
            )
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

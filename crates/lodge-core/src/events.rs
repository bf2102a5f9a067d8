//! # Domain Events
//!
//! Events the core emits at its boundary for external subscribers
//! (notification fan-out, search indexing, dashboards).
//!
//! ## Delivery Contract
//! The core guarantees only that the state mutation is durable before the
//! event becomes observable: events are written to the `event_outbox`
//! table in the same transaction as the mutation they describe. Delivery
//! to subscribers is at-least-once via the outbox drain API in lodge-db;
//! the core does not guarantee delivery itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RoomStatus;

// =============================================================================
// Domain Event
// =============================================================================

/// A state change worth telling the outside world about.
///
/// Serialized (serde_json) into the outbox payload column; the `type`
/// tag doubles as the `event_type` column for subscriber filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingCreated {
        booking_id: String,
        room_id: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
        total_cents: i64,
    },
    BookingConfirmed {
        booking_id: String,
    },
    GuestCheckedIn {
        booking_id: String,
        room_id: String,
    },
    GuestCheckedOut {
        booking_id: String,
        room_id: String,
    },
    BookingCancelled {
        booking_id: String,
        room_id: String,
    },
    RoomStatusChanged {
        room_id: String,
        from: RoomStatus,
        to: RoomStatus,
    },
    CleaningInspected {
        task_id: String,
        room_id: String,
    },
    MaintenanceRaised {
        request_id: String,
        room_id: String,
        priority: String,
    },
    MaintenanceCompleted {
        request_id: String,
        room_id: String,
    },
    PaymentApproved {
        slip_id: String,
        booking_id: String,
        verifier_id: String,
    },
    SlipRejected {
        slip_id: String,
        booking_id: String,
        reason: String,
    },
    BookingSettled {
        booking_id: String,
        payment_id: String,
        amount_cents: i64,
    },
}

impl DomainEvent {
    /// The `event_type` column value - the serde tag of the variant.
    pub const fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated { .. } => "booking_created",
            DomainEvent::BookingConfirmed { .. } => "booking_confirmed",
            DomainEvent::GuestCheckedIn { .. } => "guest_checked_in",
            DomainEvent::GuestCheckedOut { .. } => "guest_checked_out",
            DomainEvent::BookingCancelled { .. } => "booking_cancelled",
            DomainEvent::RoomStatusChanged { .. } => "room_status_changed",
            DomainEvent::CleaningInspected { .. } => "cleaning_inspected",
            DomainEvent::MaintenanceRaised { .. } => "maintenance_raised",
            DomainEvent::MaintenanceCompleted { .. } => "maintenance_completed",
            DomainEvent::PaymentApproved { .. } => "payment_approved",
            DomainEvent::SlipRejected { .. } => "slip_rejected",
            DomainEvent::BookingSettled { .. } => "booking_settled",
        }
    }

    /// The id of the entity the event is primarily about, for subscriber
    /// routing and outbox queries.
    pub fn entity_id(&self) -> &str {
        match self {
            DomainEvent::BookingCreated { booking_id, .. }
            | DomainEvent::BookingConfirmed { booking_id }
            | DomainEvent::GuestCheckedIn { booking_id, .. }
            | DomainEvent::GuestCheckedOut { booking_id, .. }
            | DomainEvent::BookingCancelled { booking_id, .. }
            | DomainEvent::BookingSettled { booking_id, .. } => booking_id,
            DomainEvent::RoomStatusChanged { room_id, .. } => room_id,
            DomainEvent::CleaningInspected { task_id, .. } => task_id,
            DomainEvent::MaintenanceRaised { request_id, .. }
            | DomainEvent::MaintenanceCompleted { request_id, .. } => request_id,
            DomainEvent::PaymentApproved { slip_id, .. }
            | DomainEvent::SlipRejected { slip_id, .. } => slip_id,
        }
    }
}

// =============================================================================
// Outbox Entry
// =============================================================================

/// A row in the event outbox queue.
///
/// `dispatched_at` is NULL until an external subscriber drains and acks
/// the entry; the mutation the event describes committed in the same
/// transaction that inserted this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct EventOutboxEntry {
    pub id: String,
    pub event_type: String,
    pub entity_id: String,
    /// The full event as JSON.
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

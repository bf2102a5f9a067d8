//! # Domain Types
//!
//! Core domain types for the Lodge PMS booking & room lifecycle.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Room       │   │     Booking     │   │     Payment     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  rate_cents     │   │  room_id (FK)   │   │  booking_id XOR │       │
//! │  │  status         │   │  status         │   │  order_id       │       │
//! │  │  capacity       │   │  payment_status │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CleaningTask   │   │ MaintenanceReq  │   │  PaymentSlip    │       │
//! │  │  in_progress →  │   │ pending →       │   │  pending →      │       │
//! │  │  completed →    │   │ in_progress →   │   │  approved |     │       │
//! │  │  inspected      │   │ completed       │   │  rejected       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine Ownership
//! The edge tables live here as pure `can_transition_to` methods; the
//! workflows in lodge-ops consult them and are the only writers. A status
//! column is never mutated without passing one of these edge checks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::StayInterval;
use crate::money::Money;

// =============================================================================
// Room Status
// =============================================================================

/// Occupancy state of a room.
///
/// This is the single source of truth for "can a new stay start here
/// today". It is never derived lazily from bookings; the Room State
/// Manager in lodge-ops is its sole writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Ready for a new stay.
    Available,
    /// A checked-in guest currently holds the room.
    Occupied,
    /// Vacated, awaiting housekeeping turnaround.
    Cleaning,
    /// Held out of service by a high/urgent maintenance request.
    Maintenance,
}

impl RoomStatus {
    /// Canonical lowercase name, matching the stored column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Room
// =============================================================================

/// A rentable room.
///
/// Created by inventory management (out of scope here); never deleted
/// while any booking references it. `status` is mutated exclusively
/// through the Room State Manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Room {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the room board ("101", "Garden Suite").
    pub name: String,

    /// Current nightly rate in cents. Bookings snapshot this at creation.
    pub rate_cents: i64,

    /// Maximum occupants.
    pub capacity: i64,

    /// Occupancy state - see [`RoomStatus`].
    pub status: RoomStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Returns the live nightly rate as a Money type.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// Stay state of a booking.
///
/// ```text
/// pending ──confirm──► confirmed ──check_in──► checked_in ──check_out──► checked_out
///    │                     │
///    └───────cancel────────┴──────────► cancelled
/// ```
///
/// `checked_out` and `cancelled` are terminal: the record is immutable
/// thereafter except for its `payment_status` aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    /// Canonical snake_case name, matching the stored column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// The state machine edge table. Any transition not listed here is
    /// rejected with `InvalidTransition` and leaves the record unchanged.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }

    /// Active bookings count toward the no-double-booking invariant.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::CheckedIn)
    }

    /// Terminal states accept no further stay transitions.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Settlement Status
// =============================================================================

/// Aggregate payment flag on a booking.
///
/// This is the single value the front desk reads; individual Payment
/// records and PaymentSlips feed into it but are never read directly at
/// the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Paid,
    Partial,
    Refunded,
}

impl SettlementStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Paid => "paid",
            SettlementStatus::Partial => "partial",
            SettlementStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A stay reservation for one room.
///
/// ## Rate Snapshot Pattern
/// `rate_cents_snapshot` and `total_cents` freeze the room's price at
/// creation time. A later rate change never alters what a confirmed
/// guest owes.
///
/// ## No-Double-Booking Invariant
/// At most one booking per room may be active (`confirmed`/`checked_in`)
/// over any overlapping interval. Enforced at creation time under the
/// per-room serialization lock, not re-checked at transition time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: String,
    pub room_id: String,

    /// Optional link to a stored guest profile (repeat guests).
    pub guest_id: Option<String>,

    /// Contact snapshot captured at intake.
    pub guest_name: String,
    pub guest_phone: Option<String>,

    pub adults: i64,
    pub children: i64,

    /// First night of the stay (inclusive).
    pub check_in: NaiveDate,
    /// Morning of departure (exclusive).
    pub check_out: NaiveDate,

    pub status: BookingStatus,
    pub payment_status: SettlementStatus,

    /// Nightly rate frozen at creation.
    pub rate_cents_snapshot: i64,
    /// Room charge frozen at creation: rate snapshot × nights.
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The stay interval. Rows are validated on insert (`check_in <
    /// check_out` both here and by the schema), so rehydration is direct.
    #[inline]
    pub fn interval(&self) -> StayInterval {
        StayInterval::new_unchecked(self.check_in, self.check_out)
    }

    /// Number of nights in the stay.
    #[inline]
    pub fn nights(&self) -> i64 {
        self.interval().nights()
    }

    /// The frozen room charge as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether this booking counts toward the no-double-booking invariant.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// =============================================================================
// Guest
// =============================================================================

/// A guest profile, kept for repeat stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Guest {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// Settlement state of a single payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Refund is a status flip on the existing record, never a new row.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment towards a booking OR an order - exactly one, never both
/// (also enforced by a CHECK constraint in the schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub booking_id: Option<String>,
    pub order_id: Option<String>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// External reference (bank slip number, card auth code).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Payment Slip
// =============================================================================

/// Resolution state of a manual payment slip.
///
/// `approved` and `rejected` are both terminal; a guest whose slip was
/// rejected must upload a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    Pending,
    Approved,
    Rejected,
}

impl SlipStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SlipStatus::Pending => "pending",
            SlipStatus::Approved => "approved",
            SlipStatus::Rejected => "rejected",
        }
    }

    #[inline]
    pub fn is_resolved(self) -> bool {
        !matches!(self, SlipStatus::Pending)
    }
}

impl std::fmt::Display for SlipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence of a bank-transfer payment, uploaded by the guest and
/// verified by staff. Approving a slip is the only path besides manual
/// front-desk settlement that marks a booking paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentSlip {
    pub id: String,
    pub booking_id: String,
    /// Storage reference for the uploaded evidence image.
    pub image_ref: String,
    pub claimed_cents: i64,
    pub status: SlipStatus,
    pub verifier_id: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cleaning Task
// =============================================================================

/// Progress of one housekeeping turnaround.
///
/// The "pending" stage of the pipeline is implicit: a room sitting in
/// `cleaning` status with no task yet. A task record exists only once
/// staff is assigned, so its first state is `in_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CleaningStatus {
    InProgress,
    Completed,
    Inspected,
}

impl CleaningStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CleaningStatus::InProgress => "in_progress",
            CleaningStatus::Completed => "completed",
            CleaningStatus::Inspected => "inspected",
        }
    }

    /// `in_progress → completed → inspected`, strictly in order.
    pub fn can_transition_to(self, next: CleaningStatus) -> bool {
        use CleaningStatus::*;
        matches!((self, next), (InProgress, Completed) | (Completed, Inspected))
    }

    /// Only an inspected task stops gating its room.
    #[inline]
    pub fn is_resolved(self) -> bool {
        matches!(self, CleaningStatus::Inspected)
    }
}

impl std::fmt::Display for CleaningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One housekeeping turnaround for one room.
///
/// Tasks accumulate per room over time; only the most recent unresolved
/// one gates the room's status. Resolved tasks may be archived
/// (housekeeping-log operation), never while unresolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CleaningTask {
    pub id: String,
    pub room_id: String,
    pub assignee: String,
    pub status: CleaningStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub inspected_at: Option<DateTime<Utc>>,
    /// Cleared from the active log (resolved tasks only).
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Maintenance Request
// =============================================================================

/// Defect severity. High/urgent requests force the room out of service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl MaintenancePriority {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MaintenancePriority::Low => "low",
            MaintenancePriority::Medium => "medium",
            MaintenancePriority::High => "high",
            MaintenancePriority::Urgent => "urgent",
        }
    }

    /// Whether raising a request at this priority forces the room into
    /// `maintenance`. Low/medium defects are tracked without taking the
    /// room off the market.
    #[inline]
    pub fn forces_out_of_service(self) -> bool {
        matches!(self, MaintenancePriority::High | MaintenancePriority::Urgent)
    }
}

impl std::fmt::Display for MaintenancePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a maintenance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
        }
    }

    /// `pending → in_progress → completed`; an urgent fix may also be
    /// closed directly from `pending`.
    pub fn can_transition_to(self, next: MaintenanceStatus) -> bool {
        use MaintenanceStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Completed) | (InProgress, Completed)
        )
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded defect for one room.
///
/// `holds_room` marks the single active request that forced this room
/// into `maintenance`; completing that request is what releases the room.
/// Completing a low/medium request that never held the room has no room
/// side effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaintenanceRequest {
    pub id: String,
    pub room_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub cost_cents: Option<i64>,
    pub holds_room: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// Kitchen/bar progress of an order. Forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Paid,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Paid => "paid",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Ready => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Paid => 4,
        }
    }

    /// Any strictly-forward move is allowed (a quiet bar may go straight
    /// from `pending` to `delivered`); moving backwards never is.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A food & beverage order, optionally billed to a booking's folio.
///
/// Totals are captured at posting time; the Billing Aggregator sums
/// `total_cents` over linked orders regardless of order status - unpaid
/// and paid orders both count toward what is owed until settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub booking_id: Option<String>,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Catalog reference; the core does not validate stock.
    pub product_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Repository Modules
//!
//! One repository per aggregate. Read paths take `&self` and run on the
//! pool; writes that must be atomic with other writes are associated
//! functions taking `&mut SqliteConnection`, so a workflow composes them
//! inside one transaction.

pub mod booking;
pub mod housekeeping;
pub mod maintenance;
pub mod order;
pub mod outbox;
pub mod payment;
pub mod room;

pub use booking::BookingRepository;
pub use housekeeping::CleaningRepository;
pub use maintenance::MaintenanceRepository;
pub use order::OrderRepository;
pub use outbox::OutboxRepository;
pub use payment::PaymentRepository;
pub use room::RoomRepository;

// =============================================================================
// Test Fixtures
// =============================================================================

/// Entity builders shared by the repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use lodge_core::{
        Booking, BookingStatus, CleaningStatus, CleaningTask, MaintenancePriority,
        MaintenanceRequest, MaintenanceStatus, Order, OrderItem, OrderStatus, Payment,
        PaymentMethod, PaymentSlip, PaymentStatus, Room, RoomStatus, SettlementStatus,
        SlipStatus, StayInterval,
    };

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn interval(check_in: &str, check_out: &str) -> StayInterval {
        StayInterval::new(date(check_in), date(check_out)).unwrap()
    }

    pub fn make_room(name: &str, rate_cents: i64, capacity: i64) -> Room {
        let now = Utc::now();
        Room {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            rate_cents,
            capacity,
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn make_booking(
        room_id: &str,
        check_in: &str,
        check_out: &str,
        status: BookingStatus,
    ) -> Booking {
        let now = Utc::now();
        let stay = interval(check_in, check_out);
        let rate_cents = 100_000;
        Booking {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            guest_id: None,
            guest_name: "Ada Wong".to_string(),
            guest_phone: Some("+66-81-000-0000".to_string()),
            adults: 2,
            children: 0,
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            status,
            payment_status: SettlementStatus::Pending,
            rate_cents_snapshot: rate_cents,
            total_cents: rate_cents * stay.nights(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn make_payment(booking_id: &str, amount_cents: i64, status: PaymentStatus) -> Payment {
        let now = Utc::now();
        Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: Some(booking_id.to_string()),
            order_id: None,
            amount_cents,
            method: PaymentMethod::Transfer,
            status,
            reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn make_slip(booking_id: &str, claimed_cents: i64) -> PaymentSlip {
        PaymentSlip {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            image_ref: "slips/test.jpg".to_string(),
            claimed_cents,
            status: SlipStatus::Pending,
            verifier_id: None,
            verified_at: None,
            reject_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn make_task(room_id: &str, assignee: &str) -> CleaningTask {
        let now = Utc::now();
        CleaningTask {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            assignee: assignee.to_string(),
            status: CleaningStatus::InProgress,
            started_at: now,
            completed_at: None,
            inspected_at: None,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn make_request(
        room_id: &str,
        priority: MaintenancePriority,
        holds_room: bool,
    ) -> MaintenanceRequest {
        let now = Utc::now();
        MaintenanceRequest {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            title: "Leaking faucet".to_string(),
            description: None,
            priority,
            status: MaintenanceStatus::Pending,
            cost_cents: None,
            holds_room,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn make_order(
        booking_id: Option<&str>,
        lines: &[(&str, i64, i64)],
    ) -> (Order, Vec<OrderItem>) {
        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|(name, unit_price_cents, quantity)| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: None,
                name_snapshot: name.to_string(),
                unit_price_cents: *unit_price_cents,
                quantity: *quantity,
                line_total_cents: unit_price_cents * quantity,
                created_at: now,
            })
            .collect();
        let subtotal_cents: i64 = items.iter().map(|i| i.line_total_cents).sum();
        let order = Order {
            id: order_id,
            booking_id: booking_id.map(str::to_string),
            status: OrderStatus::Pending,
            subtotal_cents,
            tax_cents: 0,
            total_cents: subtotal_cents,
            created_at: now,
            updated_at: now,
        };
        (order, items)
    }
}

//! End-to-end workflow scenarios: a stay's whole life through the
//! facade, and the cross-workflow invariants that only show up when the
//! pieces run together.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use lodge_core::{
    BookingStatus, CleaningStatus, DomainError, MaintenancePriority, PaymentMethod, Room,
    RoomStatus, SettlementStatus, StayInterval,
};
use lodge_db::DbConfig;
use lodge_ops::{
    Action, Actor, CreateBookingRequest, Lodge, OpsError, PostOrderRequest, OrderLine,
    RaiseMaintenanceRequest,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn today() -> NaiveDate {
    date("2024-02-01")
}

async fn lodge() -> Lodge {
    Lodge::connect(DbConfig::in_memory()).await.unwrap()
}

async fn seed_room(lodge: &Lodge, name: &str, rate_cents: i64) -> Room {
    let now = Utc::now();
    let room = Room {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        rate_cents,
        capacity: 2,
        status: RoomStatus::Available,
        created_at: now,
        updated_at: now,
    };
    lodge.database().rooms().insert(&room).await.unwrap();
    room
}

fn request(room_id: &str, check_in: &str, check_out: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        room_id: room_id.to_string(),
        guest_id: None,
        guest_name: "Ada Wong".to_string(),
        guest_phone: None,
        adults: 2,
        children: 0,
        check_in: date(check_in),
        check_out: date(check_out),
    }
}

fn domain(err: &OpsError) -> &DomainError {
    err.as_domain().expect("expected a domain rejection")
}

// -----------------------------------------------------------------------------
// A full stay, intake to turnaround
// -----------------------------------------------------------------------------

#[tokio::test]
async fn full_stay_lifecycle() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");

    let booking = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-01", "2024-03-03"), today())
        .await
        .unwrap();
    assert_eq!(booking.total_cents, 200_000);

    lodge.bookings().confirm_booking(&desk, &booking.id).await.unwrap();
    lodge.bookings().check_in(&desk, &booking.id).await.unwrap();
    assert_eq!(lodge.rooms().get(&room.id).await.unwrap().status, RoomStatus::Occupied);

    // Folio picks up a room-service order during the stay
    lodge
        .orders()
        .post_order(
            &desk,
            PostOrderRequest {
                booking_id: Some(booking.id.clone()),
                tax_cents: 0,
                lines: vec![OrderLine {
                    product_id: None,
                    name: "Breakfast".to_string(),
                    unit_price_cents: 15_000,
                    quantity: 2,
                }],
            },
        )
        .await
        .unwrap();

    // Settle the whole folio at the desk
    let totals = lodge.billing().booking_totals(&booking.id).await.unwrap();
    assert_eq!(totals.grand_cents, 230_000);
    lodge
        .billing()
        .settle_booking_payment(&desk, &booking.id, 230_000, PaymentMethod::Card, None)
        .await
        .unwrap();

    let booking = lodge.bookings().check_out(&desk, &booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::CheckedOut);
    assert_eq!(booking.payment_status, SettlementStatus::Paid);
    assert_eq!(lodge.rooms().get(&room.id).await.unwrap().status, RoomStatus::Cleaning);

    // Turnaround
    let task = lodge.housekeeping().start_cleaning(&desk, &room.id, "maria").await.unwrap();
    let task = lodge.housekeeping().complete_cleaning(&desk, &task.id).await.unwrap();
    let task = lodge.housekeeping().inspect_cleaning(&desk, &task.id).await.unwrap();
    assert_eq!(task.status, CleaningStatus::Inspected);
    assert_eq!(lodge.rooms().get(&room.id).await.unwrap().status, RoomStatus::Available);

    // Every step left an event on the outbox
    let events = lodge.events().take_pending(50).await.unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert!(types.contains(&"booking_created"));
    assert!(types.contains(&"guest_checked_in"));
    assert!(types.contains(&"booking_settled"));
    assert!(types.contains(&"cleaning_inspected"));
}

// -----------------------------------------------------------------------------
// Double-booking, sequential and concurrent
// -----------------------------------------------------------------------------

#[tokio::test]
async fn overlapping_create_is_rejected() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");

    lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-01", "2024-03-05"), today())
        .await
        .unwrap();

    // Even an unconfirmed hold blocks a second create over the dates
    let err = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-02", "2024-03-04"), today())
        .await
        .unwrap_err();
    assert!(matches!(domain(&err), DomainError::Overlap { .. }));

    // A different room is unaffected
    let other = seed_room(&lodge, "102", 100_000).await;
    lodge
        .bookings()
        .create_booking(&desk, request(&other.id, "2024-03-02", "2024-03-04"), today())
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_creates_admit_exactly_one() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let lodge = lodge.clone();
        let desk = desk.clone();
        let room_id = room.id.clone();
        handles.push(tokio::spawn(async move {
            lodge
                .bookings()
                .create_booking(&desk, request(&room_id, "2024-03-01", "2024-03-03"), today())
                .await
        }));
    }

    let mut created = 0;
    let mut overlaps = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => {
                assert!(matches!(domain(&err), DomainError::Overlap { .. }));
                overlaps += 1;
            }
        }
    }
    assert_eq!(created, 1);
    assert_eq!(overlaps, 3);
}

// -----------------------------------------------------------------------------
// Room state gates check-in
// -----------------------------------------------------------------------------

#[tokio::test]
async fn check_in_waits_for_turnaround() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");

    // First guest leaves; room goes to cleaning
    let first = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-01", "2024-03-03"), today())
        .await
        .unwrap();
    lodge.bookings().confirm_booking(&desk, &first.id).await.unwrap();
    lodge.bookings().check_in(&desk, &first.id).await.unwrap();
    lodge.bookings().check_out(&desk, &first.id).await.unwrap();

    // Next guest arrives before housekeeping is done
    let second = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-03", "2024-03-05"), today())
        .await
        .unwrap();
    lodge.bookings().confirm_booking(&desk, &second.id).await.unwrap();
    let err = lodge.bookings().check_in(&desk, &second.id).await.unwrap_err();
    assert!(matches!(domain(&err), DomainError::RoomUnavailable { .. }));

    // Turnaround completes; same check-in now succeeds
    let task = lodge.housekeeping().start_cleaning(&desk, &room.id, "maria").await.unwrap();
    lodge.housekeeping().complete_cleaning(&desk, &task.id).await.unwrap();
    lodge.housekeeping().inspect_cleaning(&desk, &task.id).await.unwrap();
    let second = lodge.bookings().check_in(&desk, &second.id).await.unwrap();
    assert_eq!(second.status, BookingStatus::CheckedIn);
}

// -----------------------------------------------------------------------------
// Maintenance holds trump bookings
// -----------------------------------------------------------------------------

#[tokio::test]
async fn maintenance_hold_blocks_and_releases_check_in() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");

    let booking = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-01", "2024-03-03"), today())
        .await
        .unwrap();
    lodge.bookings().confirm_booking(&desk, &booking.id).await.unwrap();

    // Burst pipe: room out of service before the guest arrives
    let repair = lodge
        .maintenance()
        .raise(
            &desk,
            RaiseMaintenanceRequest {
                room_id: room.id.clone(),
                title: "Burst pipe".to_string(),
                description: Some("Water under the bathroom door".to_string()),
                priority: MaintenancePriority::Urgent,
            },
        )
        .await
        .unwrap();
    assert!(repair.holds_room);

    let err = lodge.bookings().check_in(&desk, &booking.id).await.unwrap_err();
    assert!(matches!(
        domain(&err),
        DomainError::RoomUnavailable { status, .. } if status == "maintenance"
    ));

    // Fix lands before the stay; guest checks in after all
    lodge.maintenance().complete(&desk, &repair.id, Some(42_000)).await.unwrap();
    lodge.bookings().check_in(&desk, &booking.id).await.unwrap();
}

// -----------------------------------------------------------------------------
// Slip verification end to end
// -----------------------------------------------------------------------------

#[tokio::test]
async fn slip_approval_settles_the_booking() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");
    let guest = Actor::new("guest-9", [Action::SubmitSlips].into_iter().collect());

    let booking = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-01", "2024-03-03"), today())
        .await
        .unwrap();
    lodge.bookings().confirm_booking(&desk, &booking.id).await.unwrap();

    // First upload is short; rejected with an actionable reason
    let short = lodge
        .verification()
        .submit_slip(&guest, &booking.id, "slips/a.jpg", 150_000)
        .await
        .unwrap();
    lodge
        .verification()
        .reject_slip(&desk, &short.id, "transfer short of folio total")
        .await
        .unwrap();

    // Second upload covers the stay; approval marks the booking paid
    let full = lodge
        .verification()
        .submit_slip(&guest, &booking.id, "slips/b.jpg", 200_000)
        .await
        .unwrap();
    lodge.verification().approve_slip(&desk, &full.id).await.unwrap();

    let stored = lodge.bookings().get(&booking.id).await.unwrap();
    assert_eq!(stored.payment_status, SettlementStatus::Paid);

    // The rejected slip is terminal; resolving it again is refused
    let err = lodge.verification().approve_slip(&desk, &short.id).await.unwrap_err();
    assert!(matches!(domain(&err), DomainError::AlreadyResolved { .. }));
}

// -----------------------------------------------------------------------------
// Cancellation frees inventory
// -----------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_dates_return_to_the_market() {
    let lodge = lodge().await;
    let room = seed_room(&lodge, "101", 100_000).await;
    let desk = Actor::with_all("staff-1");

    let booking = lodge
        .bookings()
        .create_booking(&desk, request(&room.id, "2024-03-01", "2024-03-03"), today())
        .await
        .unwrap();
    lodge.bookings().confirm_booking(&desk, &booking.id).await.unwrap();

    let stay = StayInterval::new(date("2024-03-01"), date("2024-03-03")).unwrap();
    assert!(lodge.bookings().find_available_rooms(&stay).await.unwrap().is_empty());

    lodge.bookings().cancel_booking(&desk, &booking.id, today()).await.unwrap();
    let free = lodge.bookings().find_available_rooms(&stay).await.unwrap();
    assert_eq!(free.len(), 1);

    // Terminal: the cancelled booking accepts no further transitions
    let err = lodge.bookings().check_in(&desk, &booking.id).await.unwrap_err();
    assert!(matches!(domain(&err), DomainError::InvalidTransition { .. }));
}

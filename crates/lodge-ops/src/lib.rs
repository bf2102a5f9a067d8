//! # lodge-ops: Workflow Orchestration for Lodge PMS
//!
//! The only writer of cross-entity state. Callers (front desk UI, guest
//! self-service, housekeeping tablets) talk to the workflows here; the
//! workflows consult lodge-core's edge tables and compose lodge-db's
//! compare-and-set writes inside single transactions.
//!
//! ## Workflow Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Lodge (facade)                                │
//! │                                                                         │
//! │  bookings()      BookingWorkflow        create/confirm/check-in/out/   │
//! │                                         cancel, availability           │
//! │  rooms()         RoomStateManager       room board, guarded CAS edges  │
//! │  housekeeping()  HousekeepingWorkflow   start/complete/inspect/clear   │
//! │  maintenance()   MaintenanceWorkflow    raise/start/complete, queries  │
//! │  billing()       BillingWorkflow        folio totals, settle, refund   │
//! │  verification()  SlipVerification       submit/approve/reject slips    │
//! │  orders()        OrderWorkflow          post/advance/pay               │
//! │  events()        OutboxRepository       drain + ack for subscribers    │
//! │                                                                         │
//! │  Shared: one Database pool, one per-room lock registry.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

pub mod auth;
pub mod billing;
pub mod booking;
pub mod error;
pub mod housekeeping;
pub mod locks;
pub mod maintenance;
pub mod orders;
pub mod rooms;
pub mod verification;

pub use auth::{Action, Actor};
pub use billing::{BillingWorkflow, BookingTotals};
pub use booking::{BookingWorkflow, CreateBookingRequest};
pub use error::{OpsError, OpsResult};
pub use housekeeping::HousekeepingWorkflow;
pub use locks::RoomLocks;
pub use maintenance::{MaintenanceWorkflow, RaiseMaintenanceRequest};
pub use orders::{OrderLine, OrderWorkflow, PostOrderRequest};
pub use rooms::RoomStateManager;
pub use verification::SlipVerificationWorkflow;

use lodge_db::{Database, DbConfig, OutboxRepository};

/// The orchestration facade: one per process, clones share the pool and
/// the lock registry.
#[derive(Debug, Clone)]
pub struct Lodge {
    db: Database,
    locks: Arc<RoomLocks>,
}

impl Lodge {
    /// Opens (and migrates) the store, ready to serve workflows.
    pub async fn connect(config: DbConfig) -> OpsResult<Self> {
        let db = Database::new(config).await?;
        Ok(Lodge::with_database(db))
    }

    /// Wraps an already-open store.
    pub fn with_database(db: Database) -> Self {
        Lodge {
            db,
            locks: Arc::new(RoomLocks::new()),
        }
    }

    /// The underlying store handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn bookings(&self) -> BookingWorkflow {
        BookingWorkflow::new(self.db.clone(), self.locks.clone())
    }

    pub fn rooms(&self) -> RoomStateManager {
        RoomStateManager::new(self.db.clone())
    }

    pub fn housekeeping(&self) -> HousekeepingWorkflow {
        HousekeepingWorkflow::new(self.db.clone())
    }

    pub fn maintenance(&self) -> MaintenanceWorkflow {
        MaintenanceWorkflow::new(self.db.clone())
    }

    pub fn billing(&self) -> BillingWorkflow {
        BillingWorkflow::new(self.db.clone())
    }

    pub fn verification(&self) -> SlipVerificationWorkflow {
        SlipVerificationWorkflow::new(self.db.clone())
    }

    pub fn orders(&self) -> OrderWorkflow {
        OrderWorkflow::new(self.db.clone())
    }

    /// The event outbox drain for external subscribers: `take_pending`,
    /// deliver, `mark_dispatched`.
    pub fn events(&self) -> OutboxRepository {
        self.db.outbox()
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::booking::CreateBookingRequest;
    use lodge_core::{Booking, BookingStatus, Room, RoomStatus, SettlementStatus};
    use lodge_db::{BookingRepository, Database, DbConfig};

    /// Fixed business date all workflow tests run on.
    #[allow(non_snake_case)]
    pub fn TODAY() -> NaiveDate {
        date("2024-02-01")
    }

    pub fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn seed_room(db: &Database, name: &str, rate_cents: i64, capacity: i64) -> Room {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            rate_cents,
            capacity,
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        db.rooms().insert(&room).await.unwrap();
        room
    }

    pub async fn seed_room_in_status(db: &Database, name: &str, status: RoomStatus) -> Room {
        let mut room = seed_room(db, name, 100_000, 2).await;
        let mut tx = db.begin().await.unwrap();
        lodge_db::RoomRepository::set_status_in(
            &mut *tx,
            &room.id,
            RoomStatus::Available,
            status,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        room.status = status;
        room
    }

    pub async fn seed_booking(
        db: &Database,
        room_id: &str,
        check_in: &str,
        check_out: &str,
        status: BookingStatus,
    ) -> Booking {
        let now = Utc::now();
        let check_in = date(check_in);
        let check_out = date(check_out);
        let nights = (check_out - check_in).num_days();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            guest_id: None,
            guest_name: "Ada Wong".to_string(),
            guest_phone: None,
            adults: 2,
            children: 0,
            check_in,
            check_out,
            status,
            payment_status: SettlementStatus::Pending,
            rate_cents_snapshot: 100_000,
            total_cents: 100_000 * nights,
            created_at: now,
            updated_at: now,
        };
        let mut tx = db.begin().await.unwrap();
        BookingRepository::insert_in(&mut *tx, &booking).await.unwrap();
        tx.commit().await.unwrap();
        booking
    }

    pub fn booking_request(room_id: &str, check_in: &str, check_out: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            room_id: room_id.to_string(),
            guest_id: None,
            guest_name: "Ada Wong".to_string(),
            guest_phone: Some("+66-81-000-0000".to_string()),
            adults: 2,
            children: 0,
            check_in: date(check_in),
            check_out: date(check_out),
        }
    }
}

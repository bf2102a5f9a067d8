//! # Room State Manager
//!
//! The sole writer of `Room.status`.
//!
//! ## Status Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            check_in                    check_out                        │
//! │  available ─────────► occupied ─────────► cleaning                     │
//! │      ▲                                        │                         │
//! │      └────────────── inspect ─────────────────┘                         │
//! │                                                                         │
//! │  available/cleaning ──raise high/urgent──► maintenance                  │
//! │  maintenance ──complete holding request──► available                    │
//! │                                                                         │
//! │  Every edge is a compare-and-set; each workflow proves the FROM state  │
//! │  it believes the room is in, and fails cleanly if it lost a race.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workflows call [`RoomStateManager::transition_in`] inside their own
//! transaction so the room edge, the originating record's edge, and the
//! outbox event commit together.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::OpsResult;
use lodge_core::{DomainError, DomainEvent, Room, RoomStatus};
use lodge_db::{Database, OutboxRepository, RoomRepository};

/// Room status queries plus the guarded status writer.
#[derive(Debug, Clone)]
pub struct RoomStateManager {
    db: Database,
}

impl RoomStateManager {
    pub fn new(db: Database) -> Self {
        RoomStateManager { db }
    }

    /// Loads a room or fails with `NotFound`.
    pub async fn get(&self, room_id: &str) -> OpsResult<Room> {
        self.db
            .rooms()
            .get_by_id(room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", room_id).into())
    }

    /// The full room board, ordered by display name.
    pub async fn board(&self) -> OpsResult<Vec<Room>> {
        Ok(self.db.rooms().list_all().await?)
    }

    /// Rooms currently sitting in one status (housekeeping and
    /// maintenance board columns).
    pub async fn in_status(&self, status: RoomStatus) -> OpsResult<Vec<Room>> {
        Ok(self.db.rooms().list_by_status(status).await?)
    }

    /// Compare-and-set room status edge + outbox event, inside the
    /// caller's transaction.
    ///
    /// ## Errors
    /// `InvalidTransition` if the room was not in `expected` when the
    /// write landed - the caller's proof of the current state was stale.
    pub(crate) async fn transition_in(
        conn: &mut SqliteConnection,
        room_id: &str,
        expected: RoomStatus,
        next: RoomStatus,
        now: DateTime<Utc>,
    ) -> OpsResult<()> {
        debug!(room_id, from = %expected, to = %next, "Room status transition");

        let swapped = RoomRepository::set_status_in(&mut *conn, room_id, expected, next, now).await?;
        if !swapped {
            return Err(DomainError::invalid_transition("Room", room_id, expected, next).into());
        }

        OutboxRepository::queue_in(
            &mut *conn,
            &DomainEvent::RoomStatusChanged {
                room_id: room_id.to_string(),
                from: expected,
                to: next,
            },
            now,
        )
        .await?;

        info!(room_id, from = %expected, to = %next, "Room status changed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_room, test_db};

    #[tokio::test]
    async fn test_transition_cas_and_event() {
        let db = test_db().await;
        let room = seed_room(&db, "101", 100_000, 2).await;
        let manager = RoomStateManager::new(db.clone());

        let mut tx = db.begin().await.unwrap();
        RoomStateManager::transition_in(
            &mut *tx,
            &room.id,
            RoomStatus::Available,
            RoomStatus::Occupied,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(manager.get(&room.id).await.unwrap().status, RoomStatus::Occupied);
        let pending = db.outbox().take_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type, "room_status_changed");

        // Stale expected state: rejected, nothing written
        let mut tx = db.begin().await.unwrap();
        let err = RoomStateManager::transition_in(
            &mut *tx,
            &room.id,
            RoomStatus::Available,
            RoomStatus::Cleaning,
            Utc::now(),
        )
        .await
        .unwrap_err();
        tx.rollback().await.unwrap();
        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InvalidTransition { entity: "Room", .. })
        ));
    }

    #[tokio::test]
    async fn test_get_missing_room() {
        let db = test_db().await;
        let manager = RoomStateManager::new(db);
        let err = manager.get("no-such-room").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound { .. })));
    }
}

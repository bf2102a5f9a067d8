//! # Room Repository
//!
//! Database operations for rooms.
//!
//! ## Compare-And-Set Status Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Room.status is the one field written by more than one workflow        │
//! │  (booking lifecycle, housekeeping, maintenance). Every write goes      │
//! │  through set_status_in:                                                │
//! │                                                                         │
//! │      UPDATE rooms SET status = next                                    │
//! │      WHERE id = ? AND status = expected                                │
//! │                                                                         │
//! │  rows_affected == 0 means another workflow got there first - the       │
//! │  caller fails cleanly instead of silently overwriting.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use lodge_core::{Room, RoomStatus};

const SELECT_COLUMNS: &str = "id, name, rate_cents, capacity, status, created_at, updated_at";

/// Repository for room database operations.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    /// Inserts a room. Rooms are created by inventory management; this
    /// entry point exists for provisioning and tests.
    pub async fn insert(&self, room: &Room) -> StoreResult<()> {
        debug!(id = %room.id, name = %room.name, "Inserting room");

        sqlx::query(
            r#"
            INSERT INTO rooms (id, name, rate_cents, capacity, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&room.id)
        .bind(&room.name)
        .bind(room.rate_cents)
        .bind(room.capacity)
        .bind(room.status)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a room by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {SELECT_COLUMNS} FROM rooms WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Lists all rooms, ordered by display name.
    pub async fn list_all(&self) -> StoreResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {SELECT_COLUMNS} FROM rooms ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Lists rooms currently in the given status.
    pub async fn list_by_status(&self, status: RoomStatus) -> StoreResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {SELECT_COLUMNS} FROM rooms WHERE status = ?1 ORDER BY name"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Compare-and-set status write inside a transaction.
    ///
    /// Returns `true` if the swap happened, `false` if the room was not in
    /// the expected status (or does not exist) - the caller decides which.
    pub async fn set_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        expected: RoomStatus,
        next: RoomStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rooms SET status = ?3, updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

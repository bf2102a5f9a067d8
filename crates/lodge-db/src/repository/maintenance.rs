//! # Maintenance Request Repository
//!
//! Database operations for maintenance requests.
//!
//! `holds_room = 1` marks the single request that forced its room into
//! `maintenance`. The log may hold any number of historical or
//! low-priority requests, but at most one non-completed holding request
//! per room gates availability.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use lodge_core::{MaintenancePriority, MaintenanceRequest};

const SELECT_COLUMNS: &str = "id, room_id, title, description, priority, status, cost_cents, \
     holds_room, created_at, updated_at";

/// Repository for maintenance request database operations.
#[derive(Debug, Clone)]
pub struct MaintenanceRepository {
    pool: SqlitePool,
}

impl MaintenanceRepository {
    /// Creates a new MaintenanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MaintenanceRepository { pool }
    }

    /// Inserts a maintenance request inside a transaction.
    pub async fn insert_in(
        conn: &mut SqliteConnection,
        request: &MaintenanceRequest,
    ) -> StoreResult<()> {
        debug!(
            id = %request.id,
            room_id = %request.room_id,
            priority = %request.priority,
            "Inserting maintenance request"
        );

        sqlx::query(
            r#"
            INSERT INTO maintenance_requests (
                id, room_id, title, description, priority, status,
                cost_cents, holds_room, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&request.id)
        .bind(&request.room_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.priority)
        .bind(request.status)
        .bind(request.cost_cents)
        .bind(request.holds_room)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Gets a maintenance request by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<MaintenanceRequest>> {
        let request = sqlx::query_as::<_, MaintenanceRequest>(&format!(
            "SELECT {SELECT_COLUMNS} FROM maintenance_requests WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// The non-completed request currently holding the room in
    /// `maintenance`, if any. Transaction variant: the raise workflow
    /// must not observe a stale hold.
    pub async fn holding_request_in(
        conn: &mut SqliteConnection,
        room_id: &str,
    ) -> StoreResult<Option<MaintenanceRequest>> {
        let request = sqlx::query_as::<_, MaintenanceRequest>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM maintenance_requests
            WHERE room_id = ?1 AND holds_room = 1 AND status != 'completed'
            LIMIT 1
            "#
        ))
        .bind(room_id)
        .fetch_optional(conn)
        .await?;

        Ok(request)
    }

    /// Lists open (non-completed) requests for a room, newest first.
    pub async fn list_open_for_room(&self, room_id: &str) -> StoreResult<Vec<MaintenanceRequest>> {
        let requests = sqlx::query_as::<_, MaintenanceRequest>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM maintenance_requests
            WHERE room_id = ?1 AND status != 'completed'
            ORDER BY created_at DESC
            "#
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Lists open requests at the given priority across all rooms
    /// (maintenance board view).
    pub async fn list_open_by_priority(
        &self,
        priority: MaintenancePriority,
    ) -> StoreResult<Vec<MaintenanceRequest>> {
        let requests = sqlx::query_as::<_, MaintenanceRequest>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM maintenance_requests
            WHERE priority = ?1 AND status != 'completed'
            ORDER BY created_at
            "#
        ))
        .bind(priority)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// `pending → in_progress` inside a transaction (compare-and-set).
    pub async fn mark_in_progress_in(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance_requests
            SET status = 'in_progress', updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Completes a request inside a transaction, recording the final cost.
    /// Allowed from `pending` or `in_progress` (an urgent fix may be
    /// closed directly); completing twice touches zero rows.
    pub async fn complete_in(
        conn: &mut SqliteConnection,
        id: &str,
        cost_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance_requests
            SET status = 'completed', cost_cents = ?2, updated_at = ?3
            WHERE id = ?1 AND status != 'completed'
            "#,
        )
        .bind(id)
        .bind(cost_cents)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

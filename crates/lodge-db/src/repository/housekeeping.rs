//! # Cleaning Task Repository
//!
//! Database operations for housekeeping turnaround tasks.
//!
//! A room may accumulate many tasks over time; only the most recent
//! unresolved one gates the room's status. Archiving is a log operation
//! and only ever touches `inspected` tasks.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use lodge_core::CleaningTask;

const SELECT_COLUMNS: &str = "id, room_id, assignee, status, started_at, completed_at, \
     inspected_at, archived, created_at, updated_at";

/// Repository for cleaning task database operations.
#[derive(Debug, Clone)]
pub struct CleaningRepository {
    pool: SqlitePool,
}

impl CleaningRepository {
    /// Creates a new CleaningRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CleaningRepository { pool }
    }

    /// Inserts a cleaning task inside a transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, task: &CleaningTask) -> StoreResult<()> {
        debug!(id = %task.id, room_id = %task.room_id, assignee = %task.assignee, "Inserting cleaning task");

        sqlx::query(
            r#"
            INSERT INTO cleaning_tasks (
                id, room_id, assignee, status, started_at,
                completed_at, inspected_at, archived, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&task.id)
        .bind(&task.room_id)
        .bind(&task.assignee)
        .bind(task.status)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.inspected_at)
        .bind(task.archived)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Gets a cleaning task by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<CleaningTask>> {
        let task = sqlx::query_as::<_, CleaningTask>(&format!(
            "SELECT {SELECT_COLUMNS} FROM cleaning_tasks WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// The most recent unresolved task for a room - the gating task.
    pub async fn latest_unresolved_for_room(
        &self,
        room_id: &str,
    ) -> StoreResult<Option<CleaningTask>> {
        let task = sqlx::query_as::<_, CleaningTask>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM cleaning_tasks
            WHERE room_id = ?1 AND status != 'inspected'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Count of unresolved (`in_progress`/`completed`) tasks for a room.
    pub async fn unresolved_count_for_room(&self, room_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cleaning_tasks WHERE room_id = ?1 AND status != 'inspected'",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Transaction variant of the unresolved count: the inspect workflow
    /// decides whether to release the room from the count AFTER its own
    /// update, inside the same transaction.
    pub async fn unresolved_count_for_room_in(
        conn: &mut SqliteConnection,
        room_id: &str,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cleaning_tasks WHERE room_id = ?1 AND status != 'inspected'",
        )
        .bind(room_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    /// Lists a room's task log, newest first.
    pub async fn list_for_room(
        &self,
        room_id: &str,
        include_archived: bool,
    ) -> StoreResult<Vec<CleaningTask>> {
        let filter = if include_archived { "" } else { "AND archived = 0" };
        let tasks = sqlx::query_as::<_, CleaningTask>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM cleaning_tasks
            WHERE room_id = ?1 {filter}
            ORDER BY created_at DESC
            "#
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// `in_progress → completed` inside a transaction (compare-and-set).
    pub async fn mark_completed_in(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cleaning_tasks
            SET status = 'completed', completed_at = ?2, updated_at = ?2
            WHERE id = ?1 AND status = 'in_progress'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// `completed → inspected` inside a transaction (compare-and-set).
    /// The only transition allowed to release the room back to available.
    pub async fn mark_inspected_in(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cleaning_tasks
            SET status = 'inspected', inspected_at = ?2, updated_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Archives all inspected tasks for a room (housekeeping-log clear).
    /// Returns the number of archived tasks. The workflow refuses to call
    /// this while any unresolved task exists; the WHERE clause keeps the
    /// operation safe regardless.
    pub async fn archive_inspected(&self, room_id: &str, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE cleaning_tasks
            SET archived = 1, updated_at = ?2
            WHERE room_id = ?1 AND status = 'inspected' AND archived = 0
            "#,
        )
        .bind(room_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::{make_room, make_task};
    use lodge_core::CleaningStatus;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = make_room("101", 100_000, 2);
        db.rooms().insert(&room).await.unwrap();
        (db, room.id)
    }

    async fn insert(db: &Database, task: &CleaningTask) {
        let mut tx = db.begin().await.unwrap();
        CleaningRepository::insert_in(&mut *tx, task).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_lifecycle_cas() {
        let (db, room_id) = setup().await;
        let task = make_task(&room_id, "maria");
        insert(&db, &task).await;

        // Cannot inspect before completion
        let mut tx = db.begin().await.unwrap();
        let ok = CleaningRepository::mark_inspected_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert!(!ok);

        let mut tx = db.begin().await.unwrap();
        assert!(CleaningRepository::mark_completed_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap());
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert!(CleaningRepository::mark_inspected_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap());
        tx.commit().await.unwrap();

        let fetched = db.cleaning().get_by_id(&task.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CleaningStatus::Inspected);
        assert!(fetched.completed_at.is_some());
        assert!(fetched.inspected_at.is_some());
    }

    #[tokio::test]
    async fn test_gating_task_is_latest_unresolved() {
        let (db, room_id) = setup().await;
        let task = make_task(&room_id, "maria");
        insert(&db, &task).await;

        let gating = db
            .cleaning()
            .latest_unresolved_for_room(&room_id)
            .await
            .unwrap();
        assert_eq!(gating.unwrap().id, task.id);

        let mut tx = db.begin().await.unwrap();
        CleaningRepository::mark_completed_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap();
        CleaningRepository::mark_inspected_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(db
            .cleaning()
            .latest_unresolved_for_room(&room_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_archive_only_touches_inspected() {
        let (db, room_id) = setup().await;
        let task = make_task(&room_id, "maria");
        insert(&db, &task).await;

        // Unresolved task: nothing to archive
        let archived = db.cleaning().archive_inspected(&room_id, Utc::now()).await.unwrap();
        assert_eq!(archived, 0);

        let mut tx = db.begin().await.unwrap();
        CleaningRepository::mark_completed_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap();
        CleaningRepository::mark_inspected_in(&mut *tx, &task.id, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let archived = db.cleaning().archive_inspected(&room_id, Utc::now()).await.unwrap();
        assert_eq!(archived, 1);

        let log = db.cleaning().list_for_room(&room_id, false).await.unwrap();
        assert!(log.is_empty());
        let full_log = db.cleaning().list_for_room(&room_id, true).await.unwrap();
        assert_eq!(full_log.len(), 1);
    }
}

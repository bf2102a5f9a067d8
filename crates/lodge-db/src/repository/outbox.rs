//! # Event Outbox Repository
//!
//! Database operations for the domain event outbox queue.
//!
//! ## Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Event Outbox Flow                                  │
//! │                                                                         │
//! │  Workflow step (lodge-ops)                                             │
//! │       │  mutation + queue_in(event) in ONE transaction                 │
//! │       ▼                                                                 │
//! │  event_outbox row (dispatched_at = NULL)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  External subscriber: take_pending(n) → deliver → mark_dispatched      │
//! │                                                                         │
//! │  The mutation is durable before the event is observable; delivery      │
//! │  is at-least-once and entirely the subscriber's concern.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use lodge_core::{DomainEvent, EventOutboxEntry};

const SELECT_COLUMNS: &str = "id, event_type, entity_id, payload, created_at, dispatched_at";

/// Repository for event outbox database operations.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: SqlitePool,
}

impl OutboxRepository {
    /// Creates a new OutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutboxRepository { pool }
    }

    /// Queues a domain event inside the transaction of the mutation it
    /// describes.
    pub async fn queue_in(
        conn: &mut SqliteConnection,
        event: &DomainEvent,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(event)?;

        debug!(event_type = %event.event_type(), entity_id = %event.entity_id(), "Queueing event");

        sqlx::query(
            r#"
            INSERT INTO event_outbox (id, event_type, entity_id, payload, created_at, dispatched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL)
            "#,
        )
        .bind(&id)
        .bind(event.event_type())
        .bind(event.entity_id())
        .bind(&payload)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Takes up to `limit` undispatched entries, oldest first.
    pub async fn take_pending(&self, limit: i64) -> StoreResult<Vec<EventOutboxEntry>> {
        let entries = sqlx::query_as::<_, EventOutboxEntry>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM event_outbox
            WHERE dispatched_at IS NULL
            ORDER BY created_at
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Acks a delivered entry. Returns `false` if already acked.
    pub async fn mark_dispatched(&self, id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE event_outbox SET dispatched_at = ?2
            WHERE id = ?1 AND dispatched_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Number of undispatched entries (diagnostics).
    pub async fn pending_count(&self) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_outbox WHERE dispatched_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_queue_take_ack() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let event = DomainEvent::BookingConfirmed {
            booking_id: "b-1".to_string(),
        };
        let mut tx = db.begin().await.unwrap();
        OutboxRepository::queue_in(&mut *tx, &event, Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        let pending = db.outbox().take_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type, "booking_confirmed");
        assert_eq!(pending[0].entity_id, "b-1");

        let back: DomainEvent = serde_json::from_str(&pending[0].payload).unwrap();
        assert!(matches!(back, DomainEvent::BookingConfirmed { .. }));

        assert!(db.outbox().mark_dispatched(&pending[0].id, Utc::now()).await.unwrap());
        // Double ack is a no-op
        assert!(!db.outbox().mark_dispatched(&pending[0].id, Utc::now()).await.unwrap());
        assert_eq!(db.outbox().pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_uncommitted_event_is_invisible() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let event = DomainEvent::BookingConfirmed {
            booking_id: "b-2".to_string(),
        };
        let mut tx = db.begin().await.unwrap();
        OutboxRepository::queue_in(&mut *tx, &event, Utc::now()).await.unwrap();
        tx.rollback().await.unwrap();

        // Rolled-back mutation leaves no observable event
        assert_eq!(db.outbox().pending_count().await.unwrap(), 0);
    }
}

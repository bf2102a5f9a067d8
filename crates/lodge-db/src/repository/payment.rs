//! # Payment Repository
//!
//! Database operations for payments and payment slips.
//!
//! Payments are never deleted; a refund is a status flip on the existing
//! record. Slips resolve exactly once (`pending → approved | rejected`);
//! the resolution UPDATE is compare-and-set on `status = 'pending'`, so a
//! second approval attempt affects zero rows and the workflow reports
//! `AlreadyResolved` instead of double-applying the side effect.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use lodge_core::{Payment, PaymentSlip, PaymentStatus, SlipStatus};

const PAYMENT_COLUMNS: &str =
    "id, booking_id, order_id, amount_cents, method, status, reference, created_at, updated_at";

const SLIP_COLUMNS: &str = "id, booking_id, image_ref, claimed_cents, status, verifier_id, \
     verified_at, reject_reason, created_at";

/// Repository for payment and payment-slip database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Inserts a payment inside a transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, payment: &Payment) -> StoreResult<()> {
        debug!(id = %payment.id, amount = %payment.amount_cents, "Inserting payment");

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, order_id, amount_cents, method, status,
                reference, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.booking_id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(payment.status)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Lists all payments for a booking, oldest first.
    pub async fn list_for_booking(&self, booking_id: &str) -> StoreResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = ?1 ORDER BY created_at"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Total of completed payments for a booking, in cents.
    pub async fn total_completed_for_booking(&self, booking_id: &str) -> StoreResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount_cents) FROM payments
            WHERE booking_id = ?1 AND status = 'completed'
            "#,
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Compare-and-set payment-status write inside a transaction.
    pub async fn set_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        expected: PaymentStatus,
        next: PaymentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = ?3, updated_at = ?4
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

    // -------------------------------------------------------------------------
    // Payment slips
    // -------------------------------------------------------------------------

    /// Inserts a payment slip (guest upload).
    pub async fn insert_slip(&self, slip: &PaymentSlip) -> StoreResult<()> {
        debug!(id = %slip.id, booking_id = %slip.booking_id, "Inserting payment slip");

        sqlx::query(
            r#"
            INSERT INTO payment_slips (
                id, booking_id, image_ref, claimed_cents, status,
                verifier_id, verified_at, reject_reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&slip.id)
        .bind(&slip.booking_id)
        .bind(&slip.image_ref)
        .bind(slip.claimed_cents)
        .bind(slip.status)
        .bind(&slip.verifier_id)
        .bind(slip.verified_at)
        .bind(&slip.reject_reason)
        .bind(slip.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a payment slip by ID.
    pub async fn get_slip_by_id(&self, id: &str) -> StoreResult<Option<PaymentSlip>> {
        let slip = sqlx::query_as::<_, PaymentSlip>(&format!(
            "SELECT {SLIP_COLUMNS} FROM payment_slips WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(slip)
    }

    /// Lists slips for a booking, newest first.
    pub async fn list_slips_for_booking(&self, booking_id: &str) -> StoreResult<Vec<PaymentSlip>> {
        let slips = sqlx::query_as::<_, PaymentSlip>(&format!(
            "SELECT {SLIP_COLUMNS} FROM payment_slips WHERE booking_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slips)
    }

    /// Resolves a slip inside a transaction: `pending → approved|rejected`,
    /// stamping verifier and timestamp.
    ///
    /// Compare-and-set on `status = 'pending'`: returns `false` if the slip
    /// was already resolved (or does not exist) - zero rows touched.
    pub async fn resolve_slip_in(
        conn: &mut SqliteConnection,
        id: &str,
        resolution: SlipStatus,
        verifier_id: &str,
        reject_reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_slips
            SET status = ?2, verifier_id = ?3, verified_at = ?4, reject_reason = ?5
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(resolution)
        .bind(verifier_id)
        .bind(now)
        .bind(reject_reason)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::booking::BookingRepository;
    use crate::repository::test_support::{make_booking, make_payment, make_room, make_slip};
    use lodge_core::BookingStatus;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = make_room("101", 100_000, 2);
        db.rooms().insert(&room).await.unwrap();
        let booking = make_booking(&room.id, "2024-03-01", "2024-03-03", BookingStatus::Pending);
        let mut tx = db.begin().await.unwrap();
        BookingRepository::insert_in(&mut *tx, &booking).await.unwrap();
        tx.commit().await.unwrap();
        (db, booking.id)
    }

    #[tokio::test]
    async fn test_payment_roundtrip_and_totals() {
        let (db, booking_id) = setup().await;

        let pending = make_payment(&booking_id, 50_000, PaymentStatus::Pending);
        let completed = make_payment(&booking_id, 150_000, PaymentStatus::Completed);
        let mut tx = db.begin().await.unwrap();
        PaymentRepository::insert_in(&mut *tx, &pending).await.unwrap();
        PaymentRepository::insert_in(&mut *tx, &completed).await.unwrap();
        tx.commit().await.unwrap();

        let all = db.payments().list_for_booking(&booking_id).await.unwrap();
        assert_eq!(all.len(), 2);

        // Only completed payments count toward the settled total
        let total = db
            .payments()
            .total_completed_for_booking(&booking_id)
            .await
            .unwrap();
        assert_eq!(total, 150_000);
    }

    #[tokio::test]
    async fn test_slip_resolution_is_single_shot() {
        let (db, booking_id) = setup().await;

        let slip = make_slip(&booking_id, 200_000);
        db.payments().insert_slip(&slip).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let resolved = PaymentRepository::resolve_slip_in(
            &mut *tx,
            &slip.id,
            SlipStatus::Approved,
            "staff-7",
            None,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert!(resolved);

        // Second resolution attempt touches zero rows
        let mut tx = db.begin().await.unwrap();
        let resolved = PaymentRepository::resolve_slip_in(
            &mut *tx,
            &slip.id,
            SlipStatus::Rejected,
            "staff-8",
            Some("duplicate"),
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert!(!resolved);

        let fetched = db.payments().get_slip_by_id(&slip.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, SlipStatus::Approved);
        assert_eq!(fetched.verifier_id.as_deref(), Some("staff-7"));
    }
}

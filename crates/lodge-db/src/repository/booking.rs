//! # Booking Repository
//!
//! Database operations for bookings.
//!
//! ## Overlap Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two half-open intervals [a_in, a_out) and [b_in, b_out) overlap iff   │
//! │                                                                         │
//! │      a_in < b_out AND a_out > b_in                                     │
//! │                                                                         │
//! │  Same-day turnover (a_out == b_in) is NOT an overlap.                  │
//! │                                                                         │
//! │  Two scans use this test:                                              │
//! │  • find_conflicting  - creation-time double-booking guard; any        │
//! │    booking still holding the room counts (pending included, since a    │
//! │    pending booking is a hold awaiting confirmation)                    │
//! │  • rooms_with_active_overlap - availability index; only confirmed/     │
//! │    checked_in bookings count, per the active-booking definition        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use lodge_core::{Booking, BookingStatus, SettlementStatus, StayInterval};

const SELECT_COLUMNS: &str = "id, room_id, guest_id, guest_name, guest_phone, adults, children, \
     check_in, check_out, status, payment_status, rate_cents_snapshot, total_cents, \
     created_at, updated_at";

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {SELECT_COLUMNS} FROM bookings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Lists all bookings for a room, newest first.
    pub async fn list_for_room(&self, room_id: &str) -> StoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {SELECT_COLUMNS} FROM bookings WHERE room_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Inserts a booking inside a transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, booking: &Booking) -> StoreResult<()> {
        debug!(id = %booking.id, room_id = %booking.room_id, "Inserting booking");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, room_id, guest_id, guest_name, guest_phone,
                adults, children, check_in, check_out,
                status, payment_status, rate_cents_snapshot, total_cents,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.room_id)
        .bind(&booking.guest_id)
        .bind(&booking.guest_name)
        .bind(&booking.guest_phone)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(booking.rate_cents_snapshot)
        .bind(booking.total_cents)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Bookings that still hold the room over the given interval: any
    /// non-terminal booking (`pending`, `confirmed`, `checked_in`) whose
    /// interval overlaps. This is the creation-time double-booking guard.
    ///
    /// Must run inside the same transaction as the insert it guards, under
    /// the per-room serialization lock.
    pub async fn find_conflicting_in(
        conn: &mut SqliteConnection,
        room_id: &str,
        interval: &StayInterval,
    ) -> StoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM bookings
            WHERE room_id = ?1
              AND status IN ('pending', 'confirmed', 'checked_in')
              AND check_in < ?3
              AND check_out > ?2
            ORDER BY check_in
            "#
        ))
        .bind(room_id)
        .bind(interval.check_in())
        .bind(interval.check_out())
        .fetch_all(conn)
        .await?;

        Ok(bookings)
    }

    /// Room ids having at least one active (`confirmed`/`checked_in`)
    /// booking overlapping the interval. Backs the availability index.
    pub async fn rooms_with_active_overlap(
        &self,
        interval: &StayInterval,
    ) -> StoreResult<Vec<String>> {
        let room_ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT room_id FROM bookings
            WHERE status IN ('confirmed', 'checked_in')
              AND check_in < ?2
              AND check_out > ?1
            "#,
        )
        .bind(interval.check_in())
        .bind(interval.check_out())
        .fetch_all(&self.pool)
        .await?;

        Ok(room_ids)
    }

    /// Active bookings (other than `exclude_id`) whose stay covers the
    /// given date. Used by the cancellation release check.
    pub async fn find_active_covering_in(
        conn: &mut SqliteConnection,
        room_id: &str,
        date: NaiveDate,
        exclude_id: &str,
    ) -> StoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM bookings
            WHERE room_id = ?1
              AND id != ?2
              AND status IN ('confirmed', 'checked_in')
              AND check_in <= ?3
              AND check_out > ?3
            "#
        ))
        .bind(room_id)
        .bind(exclude_id)
        .bind(date)
        .fetch_all(conn)
        .await?;

        Ok(bookings)
    }

    /// Compare-and-set stay-status write inside a transaction.
    ///
    /// Returns `true` if the transition was applied, `false` if the booking
    /// was not in the expected status (or does not exist).
    pub async fn set_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET status = ?3, updated_at = ?4
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

    /// Sets the aggregate payment flag inside a transaction.
    ///
    /// `payment_status` is the one field of a terminal booking that stays
    /// mutable (refunds after cancellation/check-out).
    pub async fn set_payment_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        payment_status: SettlementStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET payment_status = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(payment_status)
        .bind(now)
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
    use crate::repository::test_support::{date, interval, make_booking, make_room};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = make_room("101", 100_000, 2);
        db.rooms().insert(&room).await.unwrap();
        (db, room.id)
    }

    async fn insert(db: &Database, booking: &Booking) {
        let mut tx = db.begin().await.unwrap();
        BookingRepository::insert_in(&mut *tx, booking).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, room_id) = setup().await;
        let booking = make_booking(&room_id, "2024-03-01", "2024-03-03", BookingStatus::Pending);
        insert(&db, &booking).await;

        let fetched = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.room_id, room_id);
        assert_eq!(fetched.nights(), 2);
        assert_eq!(fetched.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_find_conflicting_counts_pending() {
        let (db, room_id) = setup().await;
        let booking = make_booking(&room_id, "2024-03-01", "2024-03-03", BookingStatus::Pending);
        insert(&db, &booking).await;

        let mut tx = db.begin().await.unwrap();
        let conflicts = BookingRepository::find_conflicting_in(
            &mut *tx,
            &room_id,
            &interval("2024-03-02", "2024-03-04"),
        )
        .await
        .unwrap();
        assert_eq!(conflicts.len(), 1);

        // Back-to-back turnover is not a conflict
        let conflicts = BookingRepository::find_conflicting_in(
            &mut *tx,
            &room_id,
            &interval("2024-03-03", "2024-03-05"),
        )
        .await
        .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_find_conflicting_ignores_terminal() {
        let (db, room_id) = setup().await;
        let booking = make_booking(&room_id, "2024-03-01", "2024-03-03", BookingStatus::Cancelled);
        insert(&db, &booking).await;

        let mut tx = db.begin().await.unwrap();
        let conflicts = BookingRepository::find_conflicting_in(
            &mut *tx,
            &room_id,
            &interval("2024-03-01", "2024-03-03"),
        )
        .await
        .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_rooms_with_active_overlap_excludes_pending() {
        let (db, room_id) = setup().await;
        let booking = make_booking(&room_id, "2024-03-01", "2024-03-03", BookingStatus::Pending);
        insert(&db, &booking).await;

        // Pending bookings do not make a room "unavailable" in the index
        let busy = db
            .bookings()
            .rooms_with_active_overlap(&interval("2024-03-01", "2024-03-03"))
            .await
            .unwrap();
        assert!(busy.is_empty());

        let confirmed =
            make_booking(&room_id, "2024-04-01", "2024-04-03", BookingStatus::Confirmed);
        insert(&db, &confirmed).await;

        let busy = db
            .bookings()
            .rooms_with_active_overlap(&interval("2024-04-02", "2024-04-05"))
            .await
            .unwrap();
        assert_eq!(busy, vec![room_id]);
    }

    #[tokio::test]
    async fn test_status_cas() {
        let (db, room_id) = setup().await;
        let booking = make_booking(&room_id, "2024-03-01", "2024-03-03", BookingStatus::Pending);
        insert(&db, &booking).await;

        let mut tx = db.begin().await.unwrap();
        let ok = BookingRepository::set_status_in(
            &mut *tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert!(ok);

        // Stale expected status: no write
        let mut tx = db.begin().await.unwrap();
        let ok = BookingRepository::set_status_in(
            &mut *tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_active_covering() {
        let (db, room_id) = setup().await;
        let booking =
            make_booking(&room_id, "2024-03-01", "2024-03-03", BookingStatus::CheckedIn);
        insert(&db, &booking).await;

        let mut tx = db.begin().await.unwrap();
        let covering = BookingRepository::find_active_covering_in(
            &mut *tx,
            &room_id,
            date("2024-03-02"),
            "some-other-id",
        )
        .await
        .unwrap();
        assert_eq!(covering.len(), 1);

        // Check-out morning is not covered
        let covering = BookingRepository::find_active_covering_in(
            &mut *tx,
            &room_id,
            date("2024-03-03"),
            "some-other-id",
        )
        .await
        .unwrap();
        assert!(covering.is_empty());
    }
}

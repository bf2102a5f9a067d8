//! # Order Repository
//!
//! Database operations for food & beverage orders and their line items.
//!
//! Line items use the snapshot pattern: product name and unit price are
//! frozen at posting time, so catalog edits never rewrite a folio.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use lodge_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, booking_id, status, subtotal_cents, tax_cents, total_cents, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name_snapshot, unit_price_cents, \
     quantity, line_total_cents, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with its line items inside a transaction.
    pub async fn insert_with_items_in(
        conn: &mut SqliteConnection,
        order: &Order,
        items: &[OrderItem],
    ) -> StoreResult<()> {
        debug!(id = %order.id, total = %order.total_cents, items = items.len(), "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, booking_id, status, subtotal_cents, tax_cents, total_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.booking_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, name_snapshot, unit_price_cents,
                    quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all line items for an order.
    pub async fn get_items(&self, order_id: &str) -> StoreResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists orders billed to a booking, oldest first.
    pub async fn list_for_booking(&self, booking_id: &str) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE booking_id = ?1 ORDER BY created_at"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Sum of order totals billed to a booking, in cents.
    ///
    /// Counts every linked order regardless of status - unpaid and paid
    /// orders both belong on the folio until settled.
    pub async fn sum_totals_for_booking(&self, booking_id: &str) -> StoreResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(total_cents) FROM orders WHERE booking_id = ?1")
                .bind(booking_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }

    /// Compare-and-set status advance inside a transaction.
    pub async fn set_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = ?3, updated_at = ?4
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

//! # Order Workflow
//!
//! Food & beverage posting, kitchen progress, and order settlement.
//!
//! Line snapshots freeze product names and prices at posting time;
//! status moves strictly forward through the kitchen pipeline.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Action, Actor};
use crate::error::OpsResult;
use lodge_core::{
    validation, DomainError, Order, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};
use lodge_db::{Database, OrderRepository, PaymentRepository};

// =============================================================================
// Requests
// =============================================================================

/// One line of an order as posted.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: Option<String>,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

/// Intake data for a new order.
#[derive(Debug, Clone)]
pub struct PostOrderRequest {
    /// Folio to bill; `None` for walk-in bar sales settled on the spot.
    pub booking_id: Option<String>,
    pub tax_cents: i64,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Workflow
// =============================================================================

/// Order operations.
#[derive(Debug, Clone)]
pub struct OrderWorkflow {
    db: Database,
}

impl OrderWorkflow {
    pub fn new(db: Database) -> Self {
        OrderWorkflow { db }
    }

    /// Loads an order or fails with `NotFound`.
    pub async fn get(&self, order_id: &str) -> OpsResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id).into())
    }

    /// Posts an order, freezing names and prices into line snapshots.
    /// When billed to a booking, the booking must still be open - charges
    /// do not land on a checked-out or cancelled folio.
    pub async fn post_order(&self, actor: &Actor, request: PostOrderRequest) -> OpsResult<Order> {
        actor.require(Action::PostOrders)?;
        if request.lines.is_empty() {
            return Err(DomainError::Validation(lodge_core::ValidationError::Required {
                field: "lines".to_string(),
            })
            .into());
        }
        for line in &request.lines {
            validation::validate_positive_amount(line.unit_price_cents, "unit_price")
                .map_err(DomainError::from)?;
            validation::validate_positive_amount(line.quantity, "quantity")
                .map_err(DomainError::from)?;
        }

        if let Some(booking_id) = &request.booking_id {
            let booking = self
                .db
                .bookings()
                .get_by_id(booking_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
            if booking.status.is_terminal() {
                return Err(DomainError::invalid_transition(
                    "Booking",
                    booking_id,
                    booking.status,
                    "charged",
                )
                .into());
            }
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let items: Vec<OrderItem> = request
            .lines
            .into_iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id,
                name_snapshot: line.name,
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.unit_price_cents * line.quantity,
                created_at: now,
            })
            .collect();
        let subtotal_cents: i64 = items.iter().map(|item| item.line_total_cents).sum();
        let order = Order {
            id: order_id,
            booking_id: request.booking_id,
            status: OrderStatus::Pending,
            subtotal_cents,
            tax_cents: request.tax_cents,
            total_cents: subtotal_cents + request.tax_cents,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        OrderRepository::insert_with_items_in(&mut *tx, &order, &items).await?;
        tx.commit().await?;

        info!(order_id = %order.id, total = order.total_cents, items = items.len(), "Order posted");
        Ok(order)
    }

    /// Advances an order through the kitchen pipeline. Any forward move
    /// is legal; moving backwards never is.
    pub async fn advance_order(
        &self,
        actor: &Actor,
        order_id: &str,
        next: OrderStatus,
    ) -> OpsResult<Order> {
        actor.require(Action::PostOrders)?;
        let order = self.get(order_id).await?;
        if !order.status.can_advance_to(next) {
            return Err(
                DomainError::invalid_transition("Order", &order.id, order.status, next).into()
            );
        }

        let mut tx = self.db.begin().await?;
        let swapped =
            OrderRepository::set_status_in(&mut *tx, &order.id, order.status, next, Utc::now())
                .await?;
        if !swapped {
            return Err(
                DomainError::invalid_transition("Order", &order.id, order.status, next).into()
            );
        }
        tx.commit().await?;

        info!(order_id, to = %next, "Order advanced");
        self.get(order_id).await
    }

    /// Settles an order directly (walk-in sales): records a completed
    /// payment against the order and advances it to `paid`.
    pub async fn mark_order_paid(
        &self,
        actor: &Actor,
        order_id: &str,
        method: PaymentMethod,
    ) -> OpsResult<Order> {
        actor.require(Action::PostOrders)?;
        let order = self.get(order_id).await?;
        if !order.status.can_advance_to(OrderStatus::Paid) {
            return Err(DomainError::invalid_transition(
                "Order",
                &order.id,
                order.status,
                OrderStatus::Paid,
            )
            .into());
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: None,
            order_id: Some(order.id.clone()),
            amount_cents: order.total_cents,
            method,
            status: PaymentStatus::Completed,
            reference: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        let swapped =
            OrderRepository::set_status_in(&mut *tx, &order.id, order.status, OrderStatus::Paid, now)
                .await?;
        if !swapped {
            return Err(DomainError::invalid_transition(
                "Order",
                &order.id,
                order.status,
                OrderStatus::Paid,
            )
            .into());
        }
        PaymentRepository::insert_in(&mut *tx, &payment).await?;
        tx.commit().await?;

        info!(order_id, amount = order.total_cents, "Order paid");
        self.get(order_id).await
    }

    /// Orders billed to a booking, oldest first.
    pub async fn orders_for_booking(&self, booking_id: &str) -> OpsResult<Vec<Order>> {
        Ok(self.db.orders().list_for_booking(booking_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_booking, seed_room, test_db};
    use lodge_core::BookingStatus;

    fn lines(spec: &[(&str, i64, i64)]) -> Vec<OrderLine> {
        spec.iter()
            .map(|(name, price, qty)| OrderLine {
                product_id: None,
                name: name.to_string(),
                unit_price_cents: *price,
                quantity: *qty,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_post_computes_snapshot_totals() {
        let db = test_db().await;
        let orders = OrderWorkflow::new(db.clone());
        let actor = Actor::with_all("staff-1");

        let order = orders
            .post_order(
                &actor,
                PostOrderRequest {
                    booking_id: None,
                    tax_cents: 2_520,
                    lines: lines(&[("Pad Thai", 12_000, 2), ("Lager", 9_000, 2)]),
                },
            )
            .await
            .unwrap();
        assert_eq!(order.subtotal_cents, 42_000);
        assert_eq!(order.total_cents, 44_520);

        let items = db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name_snapshot, "Pad Thai");
    }

    #[tokio::test]
    async fn test_no_charges_on_terminal_folio() {
        let db = test_db().await;
        let room = seed_room(&db, "101", 100_000, 2).await;
        let booking =
            seed_booking(&db, &room.id, "2024-03-01", "2024-03-03", BookingStatus::CheckedOut).await;
        let orders = OrderWorkflow::new(db);
        let actor = Actor::with_all("staff-1");

        let err = orders
            .post_order(
                &actor,
                PostOrderRequest {
                    booking_id: Some(booking.id),
                    tax_cents: 0,
                    lines: lines(&[("Espresso", 4_000, 1)]),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_forward_only_pipeline() {
        let db = test_db().await;
        let orders = OrderWorkflow::new(db);
        let actor = Actor::with_all("staff-1");

        let order = orders
            .post_order(
                &actor,
                PostOrderRequest {
                    booking_id: None,
                    tax_cents: 0,
                    lines: lines(&[("Espresso", 4_000, 1)]),
                },
            )
            .await
            .unwrap();

        let order = orders
            .advance_order(&actor, &order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);

        let err = orders
            .advance_order(&actor, &order.id, OrderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_mark_paid_records_payment() {
        let db = test_db().await;
        let orders = OrderWorkflow::new(db.clone());
        let actor = Actor::with_all("staff-1");

        let order = orders
            .post_order(
                &actor,
                PostOrderRequest {
                    booking_id: None,
                    tax_cents: 0,
                    lines: lines(&[("Lager", 9_000, 3)]),
                },
            )
            .await
            .unwrap();
        let order = orders.mark_order_paid(&actor, &order.id, PaymentMethod::Cash).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);

        // Paying again is a backward move
        let err = orders
            .mark_order_paid(&actor, &order.id, PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidTransition { .. })));
    }
}

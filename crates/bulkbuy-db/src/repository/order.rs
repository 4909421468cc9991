//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Snapshot Pattern
//! The tier unit price and rounded subtotal of every line are copied onto
//! the order item when the order is placed. Later tier edits never change
//! what an existing order charged.
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT orders       (status = 'pending', total_cents, intent id)    │
//! │    INSERT order_items  (line 0) ─┐                                     │
//! │    INSERT order_items  (line 1)  ├─ one per priced line, in cart order │
//! │    ...                          ─┘                                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, parse_decimal};
use bulkbuy_core::{Money, Order, OrderDetail, OrderItem, OrderStatus, PricedLineItem};

// =============================================================================
// Input
// =============================================================================

/// Order header to persist alongside its priced lines.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// `None` for guest checkouts.
    pub user_id: Option<String>,
    pub total: Money,
    pub payment_intent_id: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    user_id: Option<String>,
    total_cents: i64,
    status: OrderStatus,
    payment_intent_id: Option<String>,
    shipping_address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> DbResult<Order> {
        let shipping_address = self
            .shipping_address
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DbError::corrupt("orders", &self.id, e))?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            total_cents: self.total_cents,
            status: self.status,
            payment_intent_id: self.payment_intent_id,
            shipping_address,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price: String,
    subtotal_cents: i64,
}

impl OrderItemRow {
    fn into_item(self) -> DbResult<OrderItem> {
        let unit_price = parse_decimal("order_items", &self.id, "unit_price", &self.unit_price)?;

        Ok(OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price,
            subtotal_cents: self.subtotal_cents,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

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

    /// Persists a `pending` order and its items in one transaction.
    ///
    /// ## Arguments
    /// * `order` - Header (customer, total, payment reference)
    /// * `items` - Priced lines, stored in the given order
    pub async fn create(&self, order: &NewOrder, items: &[PricedLineItem]) -> DbResult<OrderDetail> {
        let now = Utc::now();
        let stored = Order {
            id: generate_id(),
            user_id: order.user_id.clone(),
            total_cents: order.total.cents(),
            status: OrderStatus::Pending,
            payment_intent_id: order.payment_intent_id.clone(),
            shipping_address: order.shipping_address.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %stored.id,
            total_cents = stored.total_cents,
            items = items.len(),
            "Creating order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, total_cents, status, payment_intent_id,
                shipping_address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.user_id)
        .bind(stored.total_cents)
        .bind(stored.status)
        .bind(&stored.payment_intent_id)
        .bind(stored.shipping_address.as_ref().map(|v| v.to_string()))
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut stored_items = Vec::with_capacity(items.len());
        for (line_number, item) in items.iter().enumerate() {
            let stored_item = OrderItem {
                id: generate_id(),
                order_id: stored.id.clone(),
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal_cents: item.subtotal.cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, line_number, product_id,
                    quantity, unit_price, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&stored_item.id)
            .bind(&stored_item.order_id)
            .bind(line_number as i64)
            .bind(&stored_item.product_id)
            .bind(stored_item.quantity)
            .bind(stored_item.unit_price.to_string())
            .bind(stored_item.subtotal_cents)
            .execute(&mut *tx)
            .await?;

            stored_items.push(stored_item);
        }

        tx.commit().await?;

        Ok(OrderDetail {
            order: stored,
            items: stored_items,
        })
    }

    /// Gets an order header by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT
                id, user_id, total_cents, status, payment_intent_id,
                shipping_address, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(OrderRow::into_order)
        .transpose()
    }

    /// Gets an order with its items (current product names joined in).
    ///
    /// ## Returns
    /// * `Ok(Some(OrderDetail))` - Order found
    /// * `Ok(None)` - No such order
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<OrderDetail>> {
        debug!(id = %id, "Loading order");

        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT
                oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                oi.quantity, oi.unit_price, oi.subtotal_cents
            FROM order_items oi
            INNER JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ?1
            ORDER BY oi.line_number
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderItemRow::into_item)
        .collect::<DbResult<Vec<_>>>()?;

        Ok(Some(OrderDetail { order, items }))
    }

    /// Sets an order's status.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The updated order
    /// * `Err(DbError::NotFound)` - Order doesn't exist
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        debug!(id = %id, status = %status, "Updating order status");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

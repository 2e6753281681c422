//! Customer-side order reads and cancellation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pawmarket_core::{
    OrderId, OrderLineId, OrderStatus, ProductId, ShippingMethodId, UserId, line_total,
};

use super::RepositoryError;
use crate::models::order::{Order, OrderLine, OrderSummary};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, o.status, o.recipient_name, o.phone, o.shipping_address,
           o.shipping_method_id, s.name AS shipping_method_name, o.shipping_fee,
           o.subtotal, o.total, o.payment_method, o.note, o.expected_delivery_at,
           o.cancelled_at, o.created_at
    FROM shop.order o
    LEFT JOIN shop.shipping_method s ON s.id = o.shipping_method_id
";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    status: OrderStatus,
    recipient_name: String,
    phone: String,
    shipping_address: String,
    shipping_method_id: Option<ShippingMethodId>,
    shipping_method_name: Option<String>,
    shipping_fee: Decimal,
    subtotal: Decimal,
    total: Decimal,
    payment_method: String,
    note: Option<String>,
    expected_delivery_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            recipient_name: row.recipient_name,
            phone: row.phone,
            shipping_address: row.shipping_address,
            shipping_method_id: row.shipping_method_id,
            shipping_method_name: row.shipping_method_name,
            shipping_fee: row.shipping_fee,
            subtotal: row.subtotal,
            total: row.total,
            payment_method: row.payment_method,
            note: row.note,
            expected_delivery_at: row.expected_delivery_at,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    product_id: Option<ProductId>,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            line_total: line_total(row.unit_price, row.quantity),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    status: OrderStatus,
    total: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
}

/// Result of a customer cancellation attempt on an existing order.
#[derive(Debug)]
pub enum CancelOutcome {
    /// The order was pending and is now cancelled.
    Cancelled(Order),
    /// The order's status does not allow customer cancellation; nothing changed.
    NotAllowed(OrderStatus),
}

/// Repository for a customer's own orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.status, o.total, o.created_at,
                   COALESCE(SUM(l.quantity), 0)::bigint AS item_count
            FROM shop.order o
            LEFT JOIN shop.order_line l ON l.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OrderSummary {
                id: r.id,
                status: r.status,
                total: r.total,
                item_count: r.item_count,
                created_at: r.created_at,
                can_cancel: r.status.can_customer_cancel(),
            })
            .collect())
    }

    /// Get an order owned by the user.
    ///
    /// Orders belonging to someone else are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 AND o.user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Lines of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT id, product_id, product_name, quantity, unit_price
            FROM shop.order_line
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Cancel a pending order owned by the user.
    ///
    /// The status check and the update run under a row lock so a concurrent
    /// status change cannot slip in between.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or
    /// belongs to another user.
    pub async fn cancel_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<CancelOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM shop.order WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        if !status.can_customer_cancel() {
            return Ok(CancelOutcome::NotAllowed(status));
        }

        sqlx::query(
            r"
            UPDATE shop.order
            SET status = $1, cancelled_at = COALESCE(cancelled_at, now()), updated_at = now()
            WHERE id = $2
            ",
        )
        .bind(OrderStatus::Cancelled)
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await.map_err(RepositoryError::from_write)?;
        Ok(CancelOutcome::Cancelled(row.into()))
    }
}

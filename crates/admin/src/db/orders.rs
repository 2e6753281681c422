//! Order management queries for staff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pawmarket_core::{
    CouponId, OrderId, OrderLineId, OrderStatus, ProductId, UserId, line_total,
};

use super::RepositoryError;
use crate::models::{
    AdminOrderDetail, AdminOrderLine, AppliedCoupon, OrderCustomer, OrderListItem,
    OrderStatusUpdate,
};

/// Days between handing an order to the carrier and the promised delivery.
pub const EXPECTED_DELIVERY_DAYS: i32 = 3;

#[derive(Debug, sqlx::FromRow)]
struct OrderListRow {
    id: OrderId,
    recipient_name: String,
    phone: String,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    total: Decimal,
    payment_method: String,
}

impl From<OrderListRow> for OrderListItem {
    fn from(row: OrderListRow) -> Self {
        Self {
            id: row.id,
            recipient_name: row.recipient_name,
            phone: row.phone,
            created_at: row.created_at,
            status: row.status,
            total: row.total,
            payment_method: row.payment_method,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    id: OrderId,
    status: OrderStatus,
    recipient_name: String,
    phone: String,
    shipping_address: String,
    shipping_method: Option<String>,
    shipping_fee: Decimal,
    subtotal: Decimal,
    total: Decimal,
    payment_method: String,
    note: Option<String>,
    expected_delivery_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    customer_id: Option<UserId>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    coupon_id: Option<CouponId>,
    coupon_code: Option<String>,
    discount_percent: Option<i32>,
    discount_amount: Option<Decimal>,
}

impl OrderDetailRow {
    fn into_detail(self, lines: Vec<AdminOrderLine>) -> AdminOrderDetail {
        let customer = match (self.customer_id, self.customer_name, self.customer_email) {
            (Some(id), Some(full_name), Some(email)) => Some(OrderCustomer {
                id,
                full_name,
                email,
                phone: self.customer_phone,
            }),
            _ => None,
        };
        let coupon = match (self.coupon_id, self.coupon_code) {
            (Some(id), Some(code)) => Some(AppliedCoupon {
                id,
                code,
                discount_percent: self.discount_percent,
                discount_amount: self.discount_amount,
            }),
            _ => None,
        };
        let discount = coupon
            .as_ref()
            .map_or(Decimal::ZERO, |c| c.discount_on(self.total));

        AdminOrderDetail {
            id: self.id,
            status: self.status,
            recipient_name: self.recipient_name,
            phone: self.phone,
            shipping_address: self.shipping_address,
            shipping_method: self.shipping_method,
            shipping_fee: self.shipping_fee,
            subtotal: self.subtotal,
            total: self.total,
            payment_method: self.payment_method,
            note: self.note,
            expected_delivery_at: self.expected_delivery_at,
            cancelled_at: self.cancelled_at,
            created_at: self.created_at,
            customer,
            coupon,
            discount,
            amount_due: self.total - discount,
            can_cancel: self.status.can_admin_cancel(),
            lines,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: OrderLineId,
    product_id: Option<ProductId>,
    product_name: String,
    image_url: Option<String>,
    quantity: i32,
    unit_price: Decimal,
}

impl From<LineRow> for AdminOrderLine {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            line_total: line_total(row.unit_price, row.quantity),
            product_name: row.product_name,
            image_url: row.image_url,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusUpdateRow {
    status: OrderStatus,
    expected_delivery_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

/// Result of a staff cancellation attempt on an existing order.
#[derive(Debug)]
pub enum AdminCancelOutcome {
    Cancelled(OrderStatusUpdate),
    /// Completed and cancelled orders stay as they are.
    NotAllowed(OrderStatus),
}

/// Repository for back-office order management.
pub struct AdminOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminOrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders, newest first, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderListItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderListRow>(
            r"
            SELECT id, recipient_name, phone, created_at, status, total, payment_method
            FROM shop.order
            WHERE $1::shop.order_status IS NULL OR status = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(status)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The `limit` most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OrderListItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderListRow>(
            r"
            SELECT id, recipient_name, phone, created_at, status, total, payment_method
            FROM shop.order
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Order with customer, coupon, shipping method and lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, id: OrderId) -> Result<Option<AdminOrderDetail>, RepositoryError> {
        let Some(header) = sqlx::query_as::<_, OrderDetailRow>(
            r"
            SELECT o.id, o.status, o.recipient_name, o.phone, o.shipping_address,
                   s.name AS shipping_method, o.shipping_fee, o.subtotal, o.total,
                   o.payment_method, o.note, o.expected_delivery_at, o.cancelled_at,
                   o.created_at,
                   u.id AS customer_id, u.full_name AS customer_name,
                   u.email AS customer_email, u.phone AS customer_phone,
                   c.id AS coupon_id, c.code AS coupon_code,
                   c.discount_percent, c.discount_amount
            FROM shop.order o
            LEFT JOIN shop.user u ON u.id = o.user_id
            LEFT JOIN shop.coupon c ON c.id = o.coupon_id
            LEFT JOIN shop.shipping_method s ON s.id = o.shipping_method_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, LineRow>(
            r"
            SELECT l.id, l.product_id, l.product_name, p.image_url, l.quantity, l.unit_price
            FROM shop.order_line l
            LEFT JOIN shop.product p ON p.id = l.product_id
            WHERE l.order_id = $1
            ORDER BY l.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(
            header.into_detail(lines.into_iter().map(Into::into).collect()),
        ))
    }

    /// Move an order to any status.
    ///
    /// Becoming `cancelled` stamps `cancelled_at`; becoming `shipping` sets the
    /// expected delivery date. Neither overwrites an existing value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderStatusUpdate, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous_status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM shop.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, StatusUpdateRow>(
            r"
            UPDATE shop.order
            SET status = $1,
                cancelled_at = CASE WHEN $1 = 'cancelled'::shop.order_status
                                    THEN COALESCE(cancelled_at, now())
                                    ELSE cancelled_at END,
                expected_delivery_at = CASE WHEN $1 = 'shipping'::shop.order_status
                                    THEN COALESCE(expected_delivery_at, now() + make_interval(days => $3))
                                    ELSE expected_delivery_at END,
                updated_at = now()
            WHERE id = $2
            RETURNING status, expected_delivery_at, cancelled_at
            ",
        )
        .bind(status)
        .bind(id)
        .bind(EXPECTED_DELIVERY_DAYS)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        tx.commit().await.map_err(RepositoryError::from_write)?;

        Ok(OrderStatusUpdate {
            id,
            previous_status,
            status: row.status,
            expected_delivery_at: row.expected_delivery_at,
            cancelled_at: row.cancelled_at,
        })
    }

    /// Cancel an order unless it is already completed or cancelled.
    ///
    /// Stock is not returned to inventory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn cancel(&self, id: OrderId) -> Result<AdminCancelOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous_status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM shop.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        if !previous_status.can_admin_cancel() {
            return Ok(AdminCancelOutcome::NotAllowed(previous_status));
        }

        let row = sqlx::query_as::<_, StatusUpdateRow>(
            r"
            UPDATE shop.order
            SET status = $1, cancelled_at = COALESCE(cancelled_at, now()), updated_at = now()
            WHERE id = $2
            RETURNING status, expected_delivery_at, cancelled_at
            ",
        )
        .bind(OrderStatus::Cancelled)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        tx.commit().await.map_err(RepositoryError::from_write)?;

        Ok(AdminCancelOutcome::Cancelled(OrderStatusUpdate {
            id,
            previous_status,
            status: row.status,
            expected_delivery_at: row.expected_delivery_at,
            cancelled_at: row.cancelled_at,
        }))
    }
}

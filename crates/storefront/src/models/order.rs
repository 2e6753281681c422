//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pawmarket_core::{OrderId, OrderLineId, OrderStatus, ProductId, ShippingMethodId, UserId};

/// A delivery option offered at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub fee: Decimal,
    pub estimated_days: Option<i32>,
    pub description: Option<String>,
}

/// Order header.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub recipient_name: String,
    pub phone: String,
    pub shipping_address: String,
    pub shipping_method_id: Option<ShippingMethodId>,
    pub shipping_method_name: Option<String>,
    pub shipping_fee: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub note: Option<String>,
    pub expected_delivery_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of a purchased product.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Row in a customer's order history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub can_cancel: bool,
}

/// Order header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub can_cancel: bool,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        let can_cancel = order.status.can_customer_cancel();
        Self {
            order,
            lines,
            can_cancel,
        }
    }
}

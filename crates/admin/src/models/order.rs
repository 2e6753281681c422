//! Back-office order views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pawmarket_core::{CouponId, OrderId, OrderLineId, OrderStatus, ProductId, UserId};

/// Status filter for the order list. `all` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

impl StatusFilter {
    /// The status to filter on, if any.
    #[must_use]
    pub const fn status(self) -> Option<OrderStatus> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status),
        }
    }
}

/// One row of the order list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderListItem {
    pub id: OrderId,
    pub recipient_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub payment_method: String,
}

/// Account that placed an order. Absent for guest or deleted accounts.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Coupon attached to an order.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedCoupon {
    pub id: CouponId,
    pub code: String,
    pub discount_percent: Option<i32>,
    pub discount_amount: Option<Decimal>,
}

impl AppliedCoupon {
    /// Discount granted on `total`.
    ///
    /// A fixed amount takes precedence over a percentage. The discount never
    /// exceeds the total.
    #[must_use]
    pub fn discount_on(&self, total: Decimal) -> Decimal {
        let raw = match (self.discount_amount, self.discount_percent) {
            (Some(amount), _) => amount,
            (None, Some(percent)) => {
                (total * Decimal::from(percent) / Decimal::ONE_HUNDRED).round_dp(2)
            }
            (None, None) => Decimal::ZERO,
        };
        raw.clamp(Decimal::ZERO, total)
    }
}

/// Result of a status change.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub id: OrderId,
    pub previous_status: OrderStatus,
    pub status: OrderStatus,
    pub expected_delivery_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Purchased line as shown to staff.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderLine {
    pub id: OrderLineId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Full order view for the back-office.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderDetail {
    pub id: OrderId,
    pub status: OrderStatus,
    pub recipient_name: String,
    pub phone: String,
    pub shipping_address: String,
    pub shipping_method: Option<String>,
    pub shipping_fee: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub note: Option<String>,
    pub expected_delivery_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub customer: Option<OrderCustomer>,
    pub coupon: Option<AppliedCoupon>,
    pub discount: Decimal,
    pub amount_due: Decimal,
    pub can_cancel: bool,
    pub lines: Vec<AdminOrderLine>,
}

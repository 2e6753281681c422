//! Order status and user role enums.
//!
//! Both map onto Postgres enum types in the `shop` schema when the
//! `postgres` feature is enabled.

use serde::{Deserialize, Serialize};

/// Lifecycle of an order.
///
/// The happy path is `pending -> processing -> shipping -> completed`; any
/// non-terminal order may also become `cancelled`. Transitions are checked
/// by the individual operations below rather than a full state machine,
/// because the back-office is allowed to move an order to any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet confirmed.
    Pending,
    /// Confirmed and being packed.
    Processing,
    /// Handed to the carrier.
    Shipping,
    /// Delivered.
    Completed,
    /// Cancelled by the customer or the back-office.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipping,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses that count towards revenue figures.
    pub const REVENUE: [Self; 2] = [Self::Shipping, Self::Completed];

    /// Customers may only cancel orders nobody has started working on.
    #[must_use]
    pub const fn can_customer_cancel(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Staff may cancel anything that has not reached a terminal status.
    #[must_use]
    pub const fn can_admin_cancel(self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order's total is counted as revenue.
    #[must_use]
    pub const fn is_revenue_generating(self) -> bool {
        matches!(self, Self::Shipping | Self::Completed)
    }

    /// Invoices exist only once goods have left the warehouse.
    #[must_use]
    pub const fn allows_invoice(self) -> bool {
        self.is_revenue_generating()
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipping => "shipping",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Account role. Customers shop; staff and admins use the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    /// Order management and dashboard.
    Staff,
    /// Everything staff can do plus the report export.
    Admin,
}

impl UserRole {
    /// Whether the role may sign in to the back-office.
    #[must_use]
    pub const fn is_back_office(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Staff => write!(f, "staff"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_cancel_only_from_pending() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_customer_cancel(),
                status == OrderStatus::Pending,
                "{status}"
            );
        }
    }

    #[test]
    fn test_admin_cancel_blocked_on_terminal_statuses() {
        assert!(OrderStatus::Pending.can_admin_cancel());
        assert!(OrderStatus::Processing.can_admin_cancel());
        assert!(OrderStatus::Shipping.can_admin_cancel());
        assert!(!OrderStatus::Completed.can_admin_cancel());
        assert!(!OrderStatus::Cancelled.can_admin_cancel());
    }

    #[test]
    fn test_invoice_and_revenue_statuses() {
        let revenue: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_revenue_generating())
            .collect();
        assert_eq!(revenue, OrderStatus::REVENUE);
        assert!(OrderStatus::Shipping.allows_invoice());
        assert!(!OrderStatus::Pending.allows_invoice());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_role_back_office() {
        assert!(!UserRole::Customer.is_back_office());
        assert!(UserRole::Staff.is_back_office());
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
    }
}

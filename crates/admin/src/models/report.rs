//! Dashboard and export report types.
//!
//! `*Fact` types are raw aggregates read from the database; the service
//! layer turns them into the shapes below. Calendar buckets are UTC.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pawmarket_core::{OrderId, OrderStatus, ProductId, UserId};

use super::order::OrderListItem;

/// Revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

/// Revenue-generating orders grouped by payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodRevenue {
    pub payment_method: String,
    pub order_count: i64,
    pub revenue: Decimal,
}

/// A product ranked by units sold.
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub sold_count: i32,
    pub price: Decimal,
    pub effective_price: Decimal,
    /// `sold_count` times the current effective price.
    pub estimated_revenue: Decimal,
}

/// Customer ranked by number of revenue-generating orders.
#[derive(Debug, Clone, Serialize)]
pub struct LoyalCustomer {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: Decimal,
}

/// Headline counters. All counts are exact at query time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardCounters {
    pub monthly_revenue: Decimal,
    pub monthly_orders: i64,
    pub today_orders: i64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    pub shipping_orders: i64,
    pub total_products: i64,
    pub total_categories: i64,
    pub total_brands: i64,
    pub total_customers: i64,
}

/// Everything the dashboard endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counters: DashboardCounters,
    pub recent_orders: Vec<OrderListItem>,
    /// Oldest first, one entry per day including days without sales.
    pub revenue_last_7_days: Vec<DailyRevenue>,
    pub revenue_by_payment_method: Vec<PaymentMethodRevenue>,
    pub top_products: Vec<TopProduct>,
    pub loyal_customers: Vec<LoyalCustomer>,
}

// =============================================================================
// Export
// =============================================================================

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Decimal,
}

/// Raw row for the recent orders sheet.
#[derive(Debug, Clone)]
pub struct RecentOrderFact {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
}

/// Raw aggregates needed to build the export workbook.
#[derive(Debug, Clone, Default)]
pub struct ExportFacts {
    pub total_revenue: Decimal,
    pub revenue_order_count: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<RecentOrderFact>,
    pub payment_analysis: Vec<PaymentMethodRevenue>,
    /// First-order timestamp of every registered customer who has ordered.
    pub first_orders: Vec<DateTime<Utc>>,
}

/// Overview sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub total_revenue: Decimal,
    pub revenue_order_count: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub average_order_value: Decimal,
}

/// Row in the recent orders sheet with guest placeholders filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentOrderRow {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub total: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
}

/// New customers per first-order month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortRow {
    pub year: i32,
    pub month: u32,
    pub new_customers: i64,
}

/// Fully aggregated report, ready to be written out.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub overview: Overview,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<RecentOrderRow>,
    pub payment_analysis: Vec<PaymentMethodRevenue>,
    pub new_customers: Vec<CohortRow>,
}

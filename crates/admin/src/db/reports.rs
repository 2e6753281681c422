//! Read-only aggregates for the dashboard and the spreadsheet export.
//!
//! Calendar buckets are computed in UTC.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pawmarket_core::{OrderId, OrderStatus, ProductId, UserId, effective_unit_price};

use super::RepositoryError;
use crate::models::{
    DailyRevenue, DashboardCounters, LoyalCustomer, MonthlyRevenue, PaymentMethodRevenue,
    RecentOrderFact, TopProduct,
};

/// SQL list of the revenue-generating statuses.
const REVENUE_STATUSES: &str = "('shipping', 'completed')";

#[derive(Debug, sqlx::FromRow)]
struct CountersRow {
    monthly_revenue: Decimal,
    monthly_orders: i64,
    today_orders: i64,
    pending_orders: i64,
    processing_orders: i64,
    shipping_orders: i64,
    total_products: i64,
    total_categories: i64,
    total_brands: i64,
    total_customers: i64,
}

impl From<CountersRow> for DashboardCounters {
    fn from(row: CountersRow) -> Self {
        Self {
            monthly_revenue: row.monthly_revenue,
            monthly_orders: row.monthly_orders,
            today_orders: row.today_orders,
            pending_orders: row.pending_orders,
            processing_orders: row.processing_orders,
            shipping_orders: row.shipping_orders,
            total_products: row.total_products,
            total_categories: row.total_categories,
            total_brands: row.total_brands,
            total_customers: row.total_customers,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DailyRow {
    day: NaiveDate,
    revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    payment_method: String,
    order_count: i64,
    revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    id: ProductId,
    name: String,
    category: Option<String>,
    sold_count: i32,
    price: Decimal,
    promo_price: Option<Decimal>,
}

impl From<TopProductRow> for TopProduct {
    fn from(row: TopProductRow) -> Self {
        let effective_price = effective_unit_price(row.price, row.promo_price);
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            sold_count: row.sold_count,
            price: row.price,
            effective_price,
            estimated_revenue: effective_price * Decimal::from(row.sold_count),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LoyalRow {
    id: UserId,
    full_name: String,
    email: String,
    order_count: i64,
    total_spent: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct MonthRow {
    year: i32,
    month: i32,
    revenue: Decimal,
}

impl TryFrom<MonthRow> for MonthlyRevenue {
    type Error = RepositoryError;

    fn try_from(row: MonthRow) -> Result<Self, Self::Error> {
        let month = u32::try_from(row.month)
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| RepositoryError::DataCorruption(format!("month {}", row.month)))?;
        Ok(Self {
            year: row.year,
            month,
            revenue: row.revenue,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecentOrderRow {
    id: OrderId,
    created_at: DateTime<Utc>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    total: Decimal,
    payment_method: String,
    status: OrderStatus,
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    total_revenue: Decimal,
    revenue_order_count: i64,
    total_customers: i64,
    total_products: i64,
}

/// All-time headline figures for the export overview.
#[derive(Debug, Clone, Copy)]
pub struct Totals {
    pub total_revenue: Decimal,
    pub revenue_order_count: i64,
    pub total_customers: i64,
    pub total_products: i64,
}

/// Repository for reporting queries.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Dashboard counters for the month starting at `month_start` and the day
    /// starting at `day_start`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counters(
        &self,
        month_start: DateTime<Utc>,
        day_start: DateTime<Utc>,
    ) -> Result<DashboardCounters, RepositoryError> {
        let row = sqlx::query_as::<_, CountersRow>(&format!(
            r"
            SELECT
                (SELECT COALESCE(SUM(total), 0) FROM shop.order
                  WHERE status IN {REVENUE_STATUSES} AND created_at >= $1) AS monthly_revenue,
                (SELECT COUNT(*) FROM shop.order WHERE created_at >= $1) AS monthly_orders,
                (SELECT COUNT(*) FROM shop.order WHERE created_at >= $2) AS today_orders,
                (SELECT COUNT(*) FROM shop.order WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM shop.order WHERE status = 'processing') AS processing_orders,
                (SELECT COUNT(*) FROM shop.order WHERE status = 'shipping') AS shipping_orders,
                (SELECT COUNT(*) FROM shop.product) AS total_products,
                (SELECT COUNT(*) FROM shop.category) AS total_categories,
                (SELECT COUNT(*) FROM shop.brand) AS total_brands,
                (SELECT COUNT(*) FROM shop.user WHERE role = 'customer') AS total_customers
            "
        ))
        .bind(month_start)
        .bind(day_start)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Revenue per UTC day since `since`. Days without sales are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily_revenue(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailyRow>(&format!(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, SUM(total) AS revenue
            FROM shop.order
            WHERE status IN {REVENUE_STATUSES} AND created_at >= $1
            GROUP BY day
            ORDER BY day
            "
        ))
        .bind(since)
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| DailyRevenue {
                date: r.day,
                revenue: r.revenue,
            })
            .collect())
    }

    /// Revenue-generating orders grouped by payment method, highest revenue first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_by_payment_method(
        &self,
    ) -> Result<Vec<PaymentMethodRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            SELECT payment_method, COUNT(*) AS order_count, SUM(total) AS revenue
            FROM shop.order
            WHERE status IN {REVENUE_STATUSES}
            GROUP BY payment_method
            ORDER BY revenue DESC, payment_method
            "
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| PaymentMethodRevenue {
                payment_method: r.payment_method,
                order_count: r.order_count,
                revenue: r.revenue,
            })
            .collect())
    }

    /// Best sellers by lifetime units sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopProductRow>(
            r"
            SELECT p.id, p.name, c.name AS category, p.sold_count, p.price, p.promo_price
            FROM shop.product p
            LEFT JOIN shop.category c ON c.id = p.category_id
            ORDER BY p.sold_count DESC, p.id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Customers with the most revenue-generating orders; ties broken by spend.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn loyal_customers(&self, limit: i64) -> Result<Vec<LoyalCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, LoyalRow>(&format!(
            r"
            SELECT u.id, u.full_name, u.email,
                   COUNT(o.id) AS order_count, SUM(o.total) AS total_spent
            FROM shop.user u
            JOIN shop.order o ON o.user_id = u.id
            WHERE o.status IN {REVENUE_STATUSES}
            GROUP BY u.id
            ORDER BY order_count DESC, total_spent DESC, u.id
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| LoyalCustomer {
                id: r.id,
                full_name: r.full_name,
                email: r.email,
                order_count: r.order_count,
                total_spent: r.total_spent,
            })
            .collect())
    }

    /// All-time totals for the export overview.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<Totals, RepositoryError> {
        let row = sqlx::query_as::<_, TotalsRow>(&format!(
            r"
            SELECT
                (SELECT COALESCE(SUM(total), 0) FROM shop.order
                  WHERE status IN {REVENUE_STATUSES}) AS total_revenue,
                (SELECT COUNT(*) FROM shop.order
                  WHERE status IN {REVENUE_STATUSES}) AS revenue_order_count,
                (SELECT COUNT(*) FROM shop.user WHERE role = 'customer') AS total_customers,
                (SELECT COUNT(*) FROM shop.product) AS total_products
            "
        ))
        .fetch_one(self.pool)
        .await?;
        Ok(Totals {
            total_revenue: row.total_revenue,
            revenue_order_count: row.revenue_order_count,
            total_customers: row.total_customers,
            total_products: row.total_products,
        })
    }

    /// Revenue per UTC calendar month, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a month is out of range.
    pub async fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthRow>(&format!(
            r"
            SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int AS year,
                   EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int AS month,
                   SUM(total) AS revenue
            FROM shop.order
            WHERE status IN {REVENUE_STATUSES}
            GROUP BY year, month
            ORDER BY year, month
            "
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The latest orders of any status with the ordering account, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_orders(&self, limit: i64) -> Result<Vec<RecentOrderFact>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecentOrderRow>(
            r"
            SELECT o.id, o.created_at, u.full_name AS customer_name,
                   u.email AS customer_email, o.total, o.payment_method, o.status
            FROM shop.order o
            LEFT JOIN shop.user u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| RecentOrderFact {
                id: r.id,
                created_at: r.created_at,
                customer_name: r.customer_name,
                customer_email: r.customer_email,
                total: r.total,
                payment_method: r.payment_method,
                status: r.status,
            })
            .collect())
    }

    /// First order timestamp of every account that has ordered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_orders(&self) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
        let firsts = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            SELECT MIN(created_at)
            FROM shop.order
            WHERE user_id IS NOT NULL
            GROUP BY user_id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(firsts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_status_list_matches_core() {
        for status in OrderStatus::ALL {
            assert_eq!(
                REVENUE_STATUSES.contains(&format!("'{status}'")),
                status.is_revenue_generating(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_top_product_uses_effective_price() {
        let product: TopProduct = TopProductRow {
            id: ProductId::new(7),
            name: "Catnip Mouse".to_string(),
            category: Some("Toys".to_string()),
            sold_count: 12,
            price: Decimal::new(50, 0),
            promo_price: Some(Decimal::new(40, 0)),
        }
        .into();
        assert_eq!(product.effective_price, Decimal::new(40, 0));
        assert_eq!(product.estimated_revenue, Decimal::new(480, 0));
    }

    #[test]
    fn test_month_out_of_range_is_corruption() {
        let row = MonthRow {
            year: 2025,
            month: 13,
            revenue: Decimal::ZERO,
        };
        assert!(matches!(
            MonthlyRevenue::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}

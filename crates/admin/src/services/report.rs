//! Dashboard assembly and the spreadsheet export.
//!
//! The export runs in three steps: [`ReportService::export_facts`] reads raw
//! aggregates, [`build_report`] turns them into sheet-ready rows without
//! touching the database, and [`write_workbook`] renders the `.xlsx` bytes.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use crate::db::{AdminOrderRepository, ReportRepository, RepositoryError};
use crate::models::{
    CohortRow, DailyRevenue, Dashboard, ExportFacts, Overview, RecentOrderRow, Report,
};

/// Days in the dashboard revenue chart, today included.
pub const REVENUE_SERIES_DAYS: u32 = 7;
const DASHBOARD_RECENT_ORDERS: i64 = 5;
const DASHBOARD_TOP_PRODUCTS: i64 = 10;
const DASHBOARD_LOYAL_CUSTOMERS: i64 = 5;

const EXPORT_TOP_PRODUCTS: i64 = 20;
const EXPORT_RECENT_ORDERS: i64 = 100;

/// Placeholder for orders without an account.
pub const GUEST: &str = "Guest";

/// Errors from building or writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("amount {0} cannot be written as a number")]
    Amount(Decimal),
}

/// Midnight UTC on the first day of `now`'s month.
#[must_use]
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = now.date_naive().with_day(1).unwrap_or_else(|| now.date_naive());
    Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN))
}

/// Midnight UTC on `now`'s day.
#[must_use]
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// First day of a series of `days` days ending on `today`.
fn series_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(today)
}

/// Expand sparse per-day revenue into one entry per day ending on `today`.
///
/// Missing days are zero; entries outside the window are ignored.
#[must_use]
pub fn fill_daily_series(today: NaiveDate, days: u32, sparse: &[DailyRevenue]) -> Vec<DailyRevenue> {
    let by_day: BTreeMap<NaiveDate, Decimal> =
        sparse.iter().map(|d| (d.date, d.revenue)).collect();

    series_start(today, days)
        .iter_days()
        .take(days as usize)
        .map(|date| DailyRevenue {
            date,
            revenue: by_day.get(&date).copied().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Aggregate raw facts into the six report sheets.
#[must_use]
pub fn build_report(facts: ExportFacts, generated_at: DateTime<Utc>) -> Report {
    let average_order_value = if facts.revenue_order_count > 0 {
        (facts.total_revenue / Decimal::from(facts.revenue_order_count)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let recent_orders = facts
        .recent_orders
        .into_iter()
        .map(|o| RecentOrderRow {
            id: o.id,
            created_at: o.created_at,
            customer_name: o.customer_name.unwrap_or_else(|| GUEST.to_string()),
            customer_email: o.customer_email.unwrap_or_else(|| GUEST.to_string()),
            total: o.total,
            payment_method: o.payment_method,
            status: o.status,
        })
        .collect();

    let mut cohorts: BTreeMap<(i32, u32), i64> = BTreeMap::new();
    for first in &facts.first_orders {
        *cohorts.entry((first.year(), first.month())).or_default() += 1;
    }
    let new_customers = cohorts
        .into_iter()
        .map(|((year, month), new_customers)| CohortRow {
            year,
            month,
            new_customers,
        })
        .collect();

    Report {
        generated_at,
        overview: Overview {
            total_revenue: facts.total_revenue,
            revenue_order_count: facts.revenue_order_count,
            total_customers: facts.total_customers,
            total_products: facts.total_products,
            average_order_value,
        },
        monthly_revenue: facts.monthly_revenue,
        top_products: facts.top_products,
        recent_orders,
        payment_analysis: facts.payment_analysis,
        new_customers,
    }
}

/// Download name for a report generated at `generated_at`.
#[must_use]
pub fn report_filename(generated_at: DateTime<Utc>) -> String {
    format!("pawmarket_report_{}.xlsx", generated_at.format("%Y%m%d%H%M%S"))
}

// =============================================================================
// Sheets
// =============================================================================

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Money(Decimal),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Self::Money(value)
    }
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

fn timestamp(at: DateTime<Utc>) -> Cell {
    Cell::Text(at.format("%Y-%m-%d %H:%M").to_string())
}

impl Report {
    /// The workbook's sheets, in tab order.
    #[must_use]
    pub fn sheets(&self) -> Vec<Sheet> {
        let o = &self.overview;
        vec![
            Sheet {
                name: "Overview",
                headers: &["Metric", "Value"],
                rows: vec![
                    vec!["Report generated".into(), timestamp(self.generated_at)],
                    vec!["Total revenue".into(), o.total_revenue.into()],
                    vec!["Revenue orders".into(), o.revenue_order_count.into()],
                    vec!["Customers".into(), o.total_customers.into()],
                    vec!["Products".into(), o.total_products.into()],
                    vec!["Average order value".into(), o.average_order_value.into()],
                ],
            },
            Sheet {
                name: "Monthly Revenue",
                headers: &["Year", "Month", "Revenue"],
                rows: self
                    .monthly_revenue
                    .iter()
                    .map(|m| vec![m.year.into(), m.month.into(), m.revenue.into()])
                    .collect(),
            },
            Sheet {
                name: "Top Selling Products",
                headers: &["Product ID", "Product", "Category", "Units sold", "Price", "Revenue"],
                rows: self
                    .top_products
                    .iter()
                    .map(|p| {
                        vec![
                            p.id.as_i32().into(),
                            p.name.clone().into(),
                            p.category.clone().unwrap_or_default().into(),
                            p.sold_count.into(),
                            p.effective_price.into(),
                            p.estimated_revenue.into(),
                        ]
                    })
                    .collect(),
            },
            Sheet {
                name: "Recent Orders",
                headers: &["Order ID", "Date", "Customer", "Email", "Total", "Payment", "Status"],
                rows: self
                    .recent_orders
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.as_i32().into(),
                            timestamp(r.created_at),
                            r.customer_name.clone().into(),
                            r.customer_email.clone().into(),
                            r.total.into(),
                            r.payment_method.clone().into(),
                            r.status.as_str().into(),
                        ]
                    })
                    .collect(),
            },
            Sheet {
                name: "Payment Analysis",
                headers: &["Payment method", "Orders", "Revenue"],
                rows: self
                    .payment_analysis
                    .iter()
                    .map(|p| {
                        vec![
                            p.payment_method.clone().into(),
                            p.order_count.into(),
                            p.revenue.into(),
                        ]
                    })
                    .collect(),
            },
            Sheet {
                name: "New Customers",
                headers: &["Year", "Month", "New customers"],
                rows: self
                    .new_customers
                    .iter()
                    .map(|c| vec![c.year.into(), c.month.into(), c.new_customers.into()])
                    .collect(),
            },
        ]
    }
}

/// Render the report as an `.xlsx` workbook.
///
/// # Errors
///
/// Returns `ReportError::Xlsx` if the workbook cannot be assembled.
pub fn write_workbook(report: &Report) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x00D9_D9D9));
    let money = Format::new().set_num_format("#,##0.00");

    for sheet in report.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;

        for (col, title) in (0u16..).zip(sheet.headers) {
            worksheet.write_string_with_format(0, col, *title, &header)?;
        }

        for (row, cells) in (1u32..).zip(&sheet.rows) {
            for (col, cell) in (0u16..).zip(cells) {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row, col, text)?;
                    }
                    Cell::Int(n) => {
                        #[allow(clippy::cast_precision_loss)]
                        worksheet.write_number(row, col, *n as f64)?;
                    }
                    Cell::Money(amount) => {
                        let value = amount.to_f64().ok_or(ReportError::Amount(*amount))?;
                        worksheet.write_number_with_format(row, col, value, &money)?;
                    }
                }
            }
        }

        worksheet.autofit();
    }

    Ok(workbook.save_to_buffer()?)
}

// =============================================================================
// Service
// =============================================================================

/// Reads dashboard and export data.
pub struct ReportService<'a> {
    reports: ReportRepository<'a>,
    orders: AdminOrderRepository<'a>,
}

impl<'a> ReportService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reports: ReportRepository::new(pool),
            orders: AdminOrderRepository::new(pool),
        }
    }

    /// Dashboard figures as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Repository` if any query fails.
    #[instrument(skip(self))]
    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard, ReportError> {
        let counters = self.reports.counters(month_start(now), day_start(now)).await?;

        let today = now.date_naive();
        let since = Utc.from_utc_datetime(
            &series_start(today, REVENUE_SERIES_DAYS).and_time(NaiveTime::MIN),
        );
        let sparse = self.reports.daily_revenue(since).await?;

        Ok(Dashboard {
            counters,
            recent_orders: self.orders.recent(DASHBOARD_RECENT_ORDERS).await?,
            revenue_last_7_days: fill_daily_series(today, REVENUE_SERIES_DAYS, &sparse),
            revenue_by_payment_method: self.reports.revenue_by_payment_method().await?,
            top_products: self.reports.top_products(DASHBOARD_TOP_PRODUCTS).await?,
            loyal_customers: self.reports.loyal_customers(DASHBOARD_LOYAL_CUSTOMERS).await?,
        })
    }

    /// Raw aggregates for the export.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Repository` if any query fails.
    #[instrument(skip(self))]
    pub async fn export_facts(&self) -> Result<ExportFacts, ReportError> {
        let totals = self.reports.totals().await?;
        Ok(ExportFacts {
            total_revenue: totals.total_revenue,
            revenue_order_count: totals.revenue_order_count,
            total_customers: totals.total_customers,
            total_products: totals.total_products,
            monthly_revenue: self.reports.monthly_revenue().await?,
            top_products: self.reports.top_products(EXPORT_TOP_PRODUCTS).await?,
            recent_orders: self.reports.recent_orders(EXPORT_RECENT_ORDERS).await?,
            payment_analysis: self.reports.revenue_by_payment_method().await?,
            first_orders: self.reports.first_orders().await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use pawmarket_core::{OrderId, OrderStatus, ProductId};

    use super::*;
    use crate::models::{MonthlyRevenue, PaymentMethodRevenue, RecentOrderFact, TopProduct};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_facts() -> ExportFacts {
        ExportFacts {
            total_revenue: Decimal::new(1000, 0),
            revenue_order_count: 3,
            total_customers: 4,
            total_products: 12,
            monthly_revenue: vec![
                MonthlyRevenue {
                    year: 2025,
                    month: 5,
                    revenue: Decimal::new(400, 0),
                },
                MonthlyRevenue {
                    year: 2025,
                    month: 6,
                    revenue: Decimal::new(600, 0),
                },
            ],
            top_products: vec![TopProduct {
                id: ProductId::new(1),
                name: "Dog Bed".to_string(),
                category: None,
                sold_count: 3,
                price: Decimal::new(200, 0),
                effective_price: Decimal::new(150, 0),
                estimated_revenue: Decimal::new(450, 0),
            }],
            recent_orders: vec![
                RecentOrderFact {
                    id: OrderId::new(9),
                    created_at: at(2025, 6, 3, 10),
                    customer_name: None,
                    customer_email: None,
                    total: Decimal::new(320, 0),
                    payment_method: "cod".to_string(),
                    status: OrderStatus::Pending,
                },
                RecentOrderFact {
                    id: OrderId::new(8),
                    created_at: at(2025, 6, 2, 10),
                    customer_name: Some("Linh".to_string()),
                    customer_email: Some("linh@example.vn".to_string()),
                    total: Decimal::new(120, 0),
                    payment_method: "bank_transfer".to_string(),
                    status: OrderStatus::Completed,
                },
            ],
            payment_analysis: vec![PaymentMethodRevenue {
                payment_method: "cod".to_string(),
                order_count: 3,
                revenue: Decimal::new(1000, 0),
            }],
            first_orders: vec![at(2025, 6, 2, 1), at(2025, 5, 30, 23), at(2025, 6, 20, 8)],
        }
    }

    #[test]
    fn test_month_and_day_start() {
        let now = at(2025, 6, 17, 15);
        assert_eq!(month_start(now), Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(day_start(now), Utc.with_ymd_and_hms(2025, 6, 17, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_fill_daily_series_includes_empty_days() {
        let sparse = vec![
            DailyRevenue {
                date: date(2025, 6, 12),
                revenue: Decimal::new(50, 0),
            },
            DailyRevenue {
                date: date(2025, 6, 15),
                revenue: Decimal::new(70, 0),
            },
            DailyRevenue {
                date: date(2025, 5, 1),
                revenue: Decimal::new(999, 0),
            },
        ];
        let series = fill_daily_series(date(2025, 6, 15), REVENUE_SERIES_DAYS, &sparse);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, date(2025, 6, 9));
        assert_eq!(series[6].date, date(2025, 6, 15));
        assert_eq!(series[3].revenue, Decimal::new(50, 0));
        assert_eq!(series[6].revenue, Decimal::new(70, 0));
        let total: Decimal = series.iter().map(|d| d.revenue).sum();
        assert_eq!(total, Decimal::new(120, 0));
    }

    #[test]
    fn test_build_report_overview_and_guests() {
        let report = build_report(sample_facts(), at(2025, 6, 20, 9));

        assert_eq!(report.overview.average_order_value, Decimal::new(33333, 2));
        assert_eq!(report.recent_orders[0].customer_name, GUEST);
        assert_eq!(report.recent_orders[0].customer_email, GUEST);
        assert_eq!(report.recent_orders[1].customer_name, "Linh");
    }

    #[test]
    fn test_average_order_value_zero_without_orders() {
        let facts = ExportFacts::default();
        let report = build_report(facts, at(2025, 6, 20, 9));
        assert_eq!(report.overview.average_order_value, Decimal::ZERO);
        assert!(report.new_customers.is_empty());
    }

    #[test]
    fn test_new_customer_cohorts() {
        let report = build_report(sample_facts(), at(2025, 6, 20, 9));
        assert_eq!(
            report.new_customers,
            vec![
                CohortRow {
                    year: 2025,
                    month: 5,
                    new_customers: 1
                },
                CohortRow {
                    year: 2025,
                    month: 6,
                    new_customers: 2
                },
            ]
        );
    }

    #[test]
    fn test_six_sheets_in_order() {
        let report = build_report(sample_facts(), at(2025, 6, 20, 9));
        let sheets = report.sheets();
        let names: Vec<_> = sheets.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "Overview",
                "Monthly Revenue",
                "Top Selling Products",
                "Recent Orders",
                "Payment Analysis",
                "New Customers",
            ]
        );
        for sheet in &sheets {
            for row in &sheet.rows {
                assert_eq!(row.len(), sheet.headers.len(), "{}", sheet.name);
            }
        }
        assert_eq!(sheets[3].rows[0][2], Cell::Text("Guest".to_string()));
        assert_eq!(sheets[2].rows[0][5], Cell::Money(Decimal::new(450, 0)));
    }

    #[test]
    fn test_report_filename() {
        let generated = Utc.with_ymd_and_hms(2025, 6, 20, 9, 5, 7).unwrap();
        assert_eq!(report_filename(generated), "pawmarket_report_20250620090507.xlsx");
    }

    #[test]
    fn test_write_workbook_produces_zip() {
        let report = build_report(sample_facts(), at(2025, 6, 20, 9));
        let bytes = write_workbook(&report).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}

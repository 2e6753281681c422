//! Domain models for the back-office.

pub mod order;
pub mod report;
pub mod session;

pub use order::{
    AdminOrderDetail, AdminOrderLine, AppliedCoupon, OrderCustomer, OrderListItem, OrderStatusUpdate,
    StatusFilter,
};
pub use report::{
    CohortRow, Dashboard, DashboardCounters, DailyRevenue, ExportFacts, LoyalCustomer,
    MonthlyRevenue, Overview, PaymentMethodRevenue, RecentOrderFact, RecentOrderRow, Report,
    TopProduct,
};
pub use session::{CurrentStaff, keys as session_keys};

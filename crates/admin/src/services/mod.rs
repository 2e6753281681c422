//! Business logic for the back-office.
//!
//! - `auth` - Password login restricted to staff and admin roles
//! - `report` - Dashboard figures and the six-sheet spreadsheet export

pub mod auth;
pub mod report;

pub use auth::{AuthError, StaffAuthService};
pub use report::{ReportError, ReportService};

//! Middleware and extractors for the back-office.

pub mod auth;
pub mod session;

pub use auth::{RequireAdmin, RequireAdminAuth, clear_current_staff, set_current_staff};
pub use session::create_session_layer;

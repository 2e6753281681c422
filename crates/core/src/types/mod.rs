//! Core types for Paw Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod price;
pub mod secret;
pub mod status;

pub use catalog::{PriceRange, ProductSort};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{effective_unit_price, line_total};
pub use secret::{MIN_SESSION_SECRET_LENGTH, WeakSecret, check_session_secret};
pub use status::*;

//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! - `user` - Accounts (customers, staff and admins share one table)
//! - `category`, `brand`, `product` - Catalog
//! - `cart`, `cart_line` - One cart per user, created on first add
//! - `wishlist_entry` - Saved products
//! - `shipping_method`, `coupon` - Checkout reference data
//! - `order`, `order_line` - Placed orders; lines are never updated
//!
//! Sessions live in `tower_sessions.session`, managed by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p pawmarket-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod shipping;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use shipping::ShippingRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// `SQLSTATE` for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// `SQLSTATE` for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// `SQLSTATE` for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or concurrent modification.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Classify a write error.
    ///
    /// Unique and check violations, serialization failures and deadlocks
    /// become `Conflict`; everything else stays a database error.
    #[must_use]
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict("record already exists".to_owned());
            }
            match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                    return Self::Conflict("concurrent update, please retry".to_owned());
                }
                Some(CHECK_VIOLATION) => {
                    return Self::Conflict("constraint check failed".to_owned());
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_database() {
        let err = RepositoryError::from_write(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}

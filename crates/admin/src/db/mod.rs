//! Database access for the back-office.
//!
//! Reads and writes the same `shop` schema as the storefront. Migrations are
//! owned by the storefront crate and applied by `pm-cli migrate`.

pub mod orders;
pub mod reports;
pub mod staff;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::{AdminCancelOutcome, AdminOrderRepository};
pub use reports::ReportRepository;
pub use staff::StaffRepository;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map serialization failures and deadlocks to `Conflict`.
    #[must_use]
    pub fn from_write(err: sqlx::Error) -> Self {
        let retryable = match &err {
            sqlx::Error::Database(db_err) => matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
            ),
            _ => false,
        };
        if retryable {
            return Self::Conflict("concurrent update, please retry".to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// The back-office sees little traffic, so the pool is smaller than the
/// storefront's.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

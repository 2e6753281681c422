//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

/// Open a single short-lived pool for one command.
pub async fn connect(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.expose_secret())
        .await
}

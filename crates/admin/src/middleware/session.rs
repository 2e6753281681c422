//! Session layer for the back-office.
//!
//! Same `PostgreSQL` store as the storefront, separate cookie name and
//! `SameSite=Strict`.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for the back-office.
pub const SESSION_COOKIE_NAME: &str = "pm_admin_session";

const SESSION_EXPIRY_DAYS: i64 = 7;

/// Create the signed-cookie session layer.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie> {
    let store = PostgresStore::new(pool.clone());
    let key = Key::from(config.session_secret.expose_secret().as_bytes());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}

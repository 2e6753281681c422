//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{HttpLocationClient, LocationLookup};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    location: Arc<dyn LocationLookup>,
}

impl AppState {
    /// Create a new application state with the HTTP location client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let location = HttpLocationClient::new(&config.location)?;
        Ok(Self::with_location(config, pool, Arc::new(location)))
    }

    /// Create state with a caller-supplied location lookup.
    #[must_use]
    pub fn with_location(
        config: StorefrontConfig,
        pool: PgPool,
        location: Arc<dyn LocationLookup>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                location,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Province/district/ward lookup used by checkout.
    #[must_use]
    pub fn location(&self) -> &dyn LocationLookup {
        self.inner.location.as_ref()
    }
}

//! HTTP routes for the back-office. Every endpoint except the export speaks JSON.
//!
//! ```text
//! GET  /health                 - Database health
//! POST /auth/login             - Staff/admin password login
//! POST /auth/logout            - Sign out
//! GET  /dashboard              - Headline figures and charts
//! GET  /orders?status=         - Order list (default: all)
//! GET  /orders/{id}            - Order detail
//! POST /orders/{id}/status     - Set status
//! POST /orders/{id}/cancel     - Cancel with optional note
//! GET  /reports/export         - XLSX report (admin role)
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod reports;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::create_session_layer;
use crate::state::AppState;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel))
}

/// All back-office routes, without layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::show))
        .nest("/orders", order_routes())
        .route("/reports/export", get(reports::export))
}

/// The full application with session, tracing and Sentry layers.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    routes()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

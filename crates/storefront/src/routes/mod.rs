//! HTTP route handlers for the storefront. Every endpoint speaks JSON.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database)
//!
//! # Auth (rate limited)
//! POST /auth/register          - Create account and sign in
//! POST /auth/login             - Password login
//! POST /auth/logout            - Sign out
//! GET  /auth/me                - Current user
//!
//! # Account (requires auth)
//! GET  /account/profile        - Profile
//! POST /account/profile        - Update profile
//! POST /account/password       - Change password
//!
//! # Catalog
//! GET  /products               - Filtered, sorted product list
//! GET  /products/bestsellers   - Top sellers
//! GET  /products/{id}          - Product detail (bumps view count)
//! GET  /products/{id}/related  - Same-category products
//! GET  /categories             - Categories with product counts
//! GET  /brands                 - Brands
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart with effective prices
//! POST /cart/add               - Add product
//! POST /cart/update            - Set line quantity
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Remove all lines
//! GET  /cart/count             - Item count
//!
//! # Wishlist (requires auth)
//! POST /wishlist/toggle        - Add or remove
//! GET  /wishlist/status        - Membership of one product
//!
//! # Checkout and orders (requires auth)
//! GET  /checkout               - Preview
//! POST /checkout               - Place order
//! GET  /orders                 - History
//! GET  /orders/{id}            - Detail
//! POST /orders/{id}/cancel     - Cancel (pending only)
//! GET  /orders/{id}/invoice    - Invoice (shipping/completed only)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route("/password", post(account::change_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/bestsellers", get(products::bestsellers))
        .route("/{id}", get(products::show))
        .route("/{id}/related", get(products::related))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .route("/brands", get(products::brands))
        .nest("/cart", cart_routes())
        .route("/wishlist/toggle", post(wishlist::toggle))
        .route("/wishlist/status", get(wishlist::status))
        .route(
            "/checkout",
            get(checkout::preview).post(checkout::place_order),
        )
        .nest("/orders", order_routes())
}

/// The full application: routes, session, headers, request IDs, tracing
/// and Sentry.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    routes()
        .layer(session_layer)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

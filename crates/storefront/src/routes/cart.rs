//! Cart route handlers. All routes require a signed-in user.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pawmarket_core::{CartLineId, ProductId};

use crate::db::CartRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::CartService;
use crate::state::AppState;

const fn default_quantity() -> i32 {
    1
}

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Quantity update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub line_id: CartLineId,
    pub quantity: i32,
}

/// Line removal payload.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub line_id: CartLineId,
}

/// Response to an add.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub product_id: ProductId,
    pub quantity: i32,
    pub item_count: i64,
}

/// Item count badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: i64,
}

/// Show the cart.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    Ok(Json(CartRepository::new(state.pool()).get(user.id).await?))
}

/// Add a product.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>> {
    let quantity = CartService::new(state.pool())
        .add(user.id, form.product_id, form.quantity)
        .await?;
    let item_count = CartRepository::new(state.pool())
        .item_count(user.id)
        .await?;

    Ok(Json(AddToCartResponse {
        product_id: form.product_id,
        quantity,
        item_count,
    }))
}

/// Change a line's quantity.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<UpdateCartRequest>,
) -> Result<Json<Cart>> {
    CartService::new(state.pool())
        .update(user.id, form.line_id, form.quantity)
        .await?;
    Ok(Json(CartRepository::new(state.pool()).get(user.id).await?))
}

/// Remove a line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<RemoveFromCartRequest>,
) -> Result<Json<Cart>> {
    CartService::new(state.pool())
        .remove(user.id, form.line_id)
        .await?;
    Ok(Json(CartRepository::new(state.pool()).get(user.id).await?))
}

/// Empty the cart.
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let carts = CartRepository::new(state.pool());
    let removed = carts.clear(user.id).await?;
    tracing::debug!(user_id = %user.id, removed, "Cart cleared");
    Ok(Json(carts.get(user.id).await?))
}

/// Sum of quantities in the cart.
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartCount>> {
    let count = CartRepository::new(state.pool())
        .item_count(user.id)
        .await?;
    Ok(Json(CartCount { count }))
}

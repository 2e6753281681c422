//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use pawmarket_core::ProductId;

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Toggle payload and status query.
#[derive(Debug, Deserialize)]
pub struct WishlistProduct {
    pub product_id: ProductId,
}

/// Whether a product is on the wishlist.
#[derive(Debug, Serialize)]
pub struct WishlistStatus {
    pub product_id: ProductId,
    pub in_wishlist: bool,
}

/// Add the product if absent, remove it if present.
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<WishlistProduct>,
) -> Result<Json<WishlistStatus>> {
    let in_wishlist = WishlistRepository::new(state.pool())
        .toggle(user.id, form.product_id)
        .await?;
    Ok(Json(WishlistStatus {
        product_id: form.product_id,
        in_wishlist,
    }))
}

/// Check one product.
pub async fn status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<WishlistProduct>,
) -> Result<Json<WishlistStatus>> {
    let in_wishlist = WishlistRepository::new(state.pool())
        .contains(user.id, query.product_id)
        .await?;
    Ok(Json(WishlistStatus {
        product_id: query.product_id,
        in_wishlist,
    }))
}

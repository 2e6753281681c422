//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use pawmarket_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CheckoutService;
use crate::services::checkout::{CheckoutPreview, CheckoutRequest};
use crate::state::AppState;

/// Response to a placed order.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
}

/// Cart, subtotal and shipping options.
pub async fn preview(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutPreview>> {
    let preview = CheckoutService::new(state.pool(), state.location())
        .preview(user.id)
        .await?;
    Ok(Json(preview))
}

/// Place the order.
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let order_id = CheckoutService::new(state.pool(), state.location())
        .place_order(user.id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(OrderPlaced { order_id })))
}

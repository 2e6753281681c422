//! Customer order history, detail, cancellation and invoice.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use pawmarket_core::{Email, OrderId};

use crate::db::{OrderRepository, RepositoryError};
use crate::db::orders::CancelOutcome;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, OrderDetail, OrderSummary};
use crate::state::AppState;

/// Invoice data for a shipped or completed order.
#[derive(Debug, Serialize)]
pub struct Invoice {
    pub customer_name: String,
    pub customer_email: Email,
    pub issued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub order: OrderDetail,
}

async fn load_detail(state: &AppState, user: &CurrentUser, id: OrderId) -> Result<OrderDetail> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
    let lines = orders.lines(order.id).await?;
    Ok(OrderDetail::new(order, lines))
}

/// Order history, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// Order detail with lines.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    Ok(Json(load_detail(&state, &user, id).await?))
}

/// Cancel a pending order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    match orders.cancel_for_user(user.id, id).await {
        Ok(CancelOutcome::Cancelled(order)) => {
            tracing::info!(order_id = %id, "Order cancelled by customer");
            let lines = orders.lines(order.id).await?;
            Ok(Json(OrderDetail::new(order, lines)))
        }
        Ok(CancelOutcome::NotAllowed(status)) => Err(AppError::Conflict(format!(
            "Orders can only be cancelled while pending (this order is {status})"
        ))),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("Order".to_string())),
        Err(err) => Err(err.into()),
    }
}

/// Invoice, once the order has left the warehouse.
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Invoice>> {
    let order = load_detail(&state, &user, id).await?;
    if !order.order.status.allows_invoice() {
        return Err(AppError::Conflict(
            "An invoice is available once the order is shipping or completed".to_string(),
        ));
    }

    Ok(Json(Invoice {
        customer_name: user.full_name,
        customer_email: user.email,
        issued_at: Utc::now(),
        order,
    }))
}

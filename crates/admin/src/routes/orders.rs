//! Order management: list, detail, status changes and cancellation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use pawmarket_core::{OrderId, OrderStatus};

use crate::db::{AdminCancelOutcome, AdminOrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::models::{AdminOrderDetail, OrderListItem, OrderStatusUpdate, StatusFilter};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub note: Option<String>,
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Order".to_string()),
        other => other.into(),
    }
}

/// All orders, newest first. `?status=` narrows the list; `all` is the default.
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_staff): RequireAdminAuth,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderListItem>>> {
    let orders = AdminOrderRepository::new(state.pool())
        .list(query.status.status())
        .await?;
    Ok(Json(orders))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_staff): RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<AdminOrderDetail>> {
    AdminOrderRepository::new(state.pool())
        .detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// Move an order to any status.
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(staff): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<OrderStatusUpdate>> {
    let update = AdminOrderRepository::new(state.pool())
        .update_status(id, change.status)
        .await
        .map_err(not_found)?;

    tracing::info!(
        order_id = %id,
        from = %update.previous_status,
        to = %update.status,
        "Order status updated"
    );
    Ok(Json(update))
}

/// Cancel an order that has not been completed or cancelled yet.
#[instrument(skip(state, staff, request), fields(staff_id = %staff.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdminAuth(staff): RequireAdminAuth,
    Path(id): Path<OrderId>,
    request: Option<Json<CancelRequest>>,
) -> Result<Json<OrderStatusUpdate>> {
    let note = request
        .and_then(|Json(r)| r.note)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    match AdminOrderRepository::new(state.pool())
        .cancel(id)
        .await
        .map_err(not_found)?
    {
        AdminCancelOutcome::Cancelled(update) => {
            tracing::info!(
                order_id = %id,
                from = %update.previous_status,
                note = note.as_deref().unwrap_or(""),
                "Order cancelled by staff"
            );
            Ok(Json(update))
        }
        AdminCancelOutcome::NotAllowed(status) => Err(AppError::Conflict(format!(
            "Order is already {status} and cannot be cancelled"
        ))),
    }
}

//! Health probe.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Reports 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> StatusCode {
    if let Err(err) = sqlx::query("SELECT 1").execute(state.pool()).await {
        tracing::warn!(error = %err, "Health check failed");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

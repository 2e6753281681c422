//! Dashboard figures.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::models::Dashboard;
use crate::services::ReportService;
use crate::state::AppState;

pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_staff): RequireAdminAuth,
) -> Result<Json<Dashboard>> {
    let dashboard = ReportService::new(state.pool()).dashboard(Utc::now()).await?;
    Ok(Json(dashboard))
}

//! Back-office login and logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_staff, set_current_staff};
use crate::models::CurrentStaff;
use crate::services::StaffAuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password login for staff and admins.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginRequest>,
) -> Result<Json<CurrentStaff>> {
    let staff = StaffAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|err| tracing::info!(error = %err, "Back-office login failed"))?;

    set_current_staff(&session, &staff).await?;
    set_sentry_user(&staff.id, staff.email.as_str());
    tracing::info!(user_id = %staff.id, role = %staff.role, "Staff logged in");

    Ok(Json(staff))
}

pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_staff(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

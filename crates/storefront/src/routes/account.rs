//! Profile and password management. All routes require a signed-in user.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Profile, ProfileUpdate, session_keys};
use crate::services::AuthService;
use crate::state::AppState;

/// Password change payload.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Show the profile.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = UserRepository::new(state.pool()).get_profile(user.id).await?;
    Ok(Json(profile))
}

/// Update the profile and the name kept in the session.
#[instrument(skip(state, session, user, update), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let update = update.normalized();
    if update.full_name.is_empty() {
        return Err(AppError::BadRequest("full_name is required".to_string()));
    }

    let profile = UserRepository::new(state.pool())
        .update_profile(user.id, &update)
        .await?;

    let refreshed = CurrentUser {
        full_name: profile.full_name.clone(),
        ..user
    };
    session
        .insert(session_keys::CURRENT_USER, &refreshed)
        .await?;
    Ok(Json(profile))
}

/// Change the password after checking the current one.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    if form.new_password != form.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    AuthService::new(state.pool())
        .change_password(user.id, &form.current_password, &form.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

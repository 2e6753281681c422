//! Back-office authentication extractors.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentStaff, session_keys};

/// Extractor that requires a signed-in staff member or admin.
///
/// ```rust,ignore
/// async fn handler(RequireAdminAuth(staff): RequireAdminAuth) -> impl IntoResponse {
///     format!("Hello, {}!", staff.full_name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentStaff);

/// Extractor that additionally requires the `admin` role.
pub struct RequireAdmin(pub CurrentStaff);

/// Rejection for the back-office extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Nobody is signed in.
    Unauthorized,
    /// Signed in as staff, but the route needs an admin.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Sign in required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Only admins can access this resource"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn current_staff(parts: &Parts) -> Option<CurrentStaff> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await
        .ok()
        .flatten()
        .filter(|staff| staff.role.is_back_office())
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_staff(parts)
            .await
            .map(Self)
            .ok_or(AdminAuthRejection::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let staff = current_staff(parts)
            .await
            .ok_or(AdminAuthRejection::Unauthorized)?;

        if !staff.is_admin() {
            return Err(AdminAuthRejection::Forbidden);
        }

        Ok(Self(staff))
    }
}

/// Store the signed-in staff member, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_staff(
    session: &Session,
    staff: &CurrentStaff,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_STAFF, staff).await
}

/// Sign out.
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_current_staff(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AdminAuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminAuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}

//! Account role management.
//!
//! Accounts are created through storefront registration; this command only
//! changes the role so an existing account can sign in to the back-office.

use secrecy::SecretString;
use thiserror::Error;

use pawmarket_core::{Email, UserId, UserRole};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Valid roles: customer, staff, admin")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No account with email: {0}")]
    NotFound(String),
}

fn parse_args(email: &str, role: &str) -> Result<(Email, UserRole), UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;
    let role = role
        .trim()
        .to_lowercase()
        .parse::<UserRole>()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    Ok((email, role))
}

/// Set the role of the account registered under `email`.
///
/// # Errors
///
/// Returns `UserError::NotFound` if no account has that email.
pub async fn promote(
    database_url: &SecretString,
    email: &str,
    role: &str,
) -> Result<UserId, UserError> {
    let (email, role) = parse_args(email, role)?;
    let pool = super::connect(database_url).await?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        r"
        UPDATE shop.user
        SET role = $1, updated_at = now()
        WHERE lower(email) = lower($2)
        RETURNING id
        ",
    )
    .bind(role)
    .bind(email.as_str())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| UserError::NotFound(email.to_string()))?;

    tracing::info!(%user_id, %email, %role, "Role updated");
    if role.is_back_office() {
        tracing::info!("The account can now sign in to the back-office");
    }

    Ok(user_id)
}

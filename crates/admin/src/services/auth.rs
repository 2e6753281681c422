//! Back-office login.
//!
//! Staff and admins share the `shop.user` table with customers; the role
//! decides who may sign in here. Hashes are Argon2id PHC strings written by
//! the storefront or `pm-cli`.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use pawmarket_core::Email;

use crate::db::{RepositoryError, StaffRepository};
use crate::models::CurrentStaff;

/// Errors from back-office authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Correct password, but the account has no back-office role.
    #[error("account is not allowed to use the back-office")]
    NotStaff,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Back-office authentication service.
pub struct StaffAuthService<'a> {
    staff: StaffRepository<'a>,
}

impl<'a> StaffAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            staff: StaffRepository::new(pool),
        }
    }

    /// Verify credentials and the back-office role.
    ///
    /// The role is checked after the password so the response never reveals
    /// which emails belong to staff.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, `AuthError::NotStaff` for customer accounts.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentStaff, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .staff
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        if !credentials.account.role.is_back_office() {
            tracing::warn!(user_id = %credentials.account.id, "Customer attempted back-office login");
            return Err(AuthError::NotStaff);
        }

        Ok(credentials.account)
    }
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

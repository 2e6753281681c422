//! Back-office account lookups.

use sqlx::PgPool;

use pawmarket_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::CurrentStaff;

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: UserId,
    email: String,
    full_name: String,
    role: UserRole,
    password_hash: String,
}

/// Account plus stored password hash, used only during login.
#[derive(Debug)]
pub struct StaffCredentials {
    pub account: CurrentStaff,
    pub password_hash: String,
}

impl TryFrom<StaffRow> for StaffCredentials {
    type Error = RepositoryError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            account: CurrentStaff {
                id: row.id,
                email,
                full_name: row.full_name,
                role: row.role,
            },
            password_hash: row.password_hash,
        })
    }
}

/// Repository for back-office accounts.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find any account by email, whatever its role.
    ///
    /// The caller decides whether the role may use the back-office.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StaffCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            r"
            SELECT id, email, full_name, role, password_hash
            FROM shop.user
            WHERE lower(email) = lower($1)
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

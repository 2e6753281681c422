//! Shipping methods.

use rust_decimal::Decimal;
use sqlx::PgPool;

use pawmarket_core::ShippingMethodId;

use super::RepositoryError;
use crate::models::order::ShippingMethod;

#[derive(Debug, sqlx::FromRow)]
struct ShippingMethodRow {
    id: ShippingMethodId,
    name: String,
    fee: Decimal,
    estimated_days: Option<i32>,
    description: Option<String>,
}

impl From<ShippingMethodRow> for ShippingMethod {
    fn from(row: ShippingMethodRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            fee: row.fee,
            estimated_days: row.estimated_days,
            description: row.description,
        }
    }
}

/// Repository for shipping methods.
pub struct ShippingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingRepository<'a> {
    /// Create a new shipping repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All shipping methods, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShippingMethodRow>(
            "SELECT id, name, fee, estimated_days, description FROM shop.shipping_method ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a shipping method by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ShippingMethodId) -> Result<Option<ShippingMethod>, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingMethodRow>(
            "SELECT id, name, fee, estimated_days, description FROM shop.shipping_method WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

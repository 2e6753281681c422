//! Wishlist persistence.

use sqlx::PgPool;

use pawmarket_core::{ProductId, UserId};

use super::RepositoryError;

/// Repository for wishlist entries.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns `true` when the product is on the wishlist afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn toggle(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM shop.wishlist_entry WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        let is_added = if removed.rows_affected() > 0 {
            false
        } else {
            let inserted = sqlx::query(
                r"
                INSERT INTO shop.wishlist_entry (user_id, product_id)
                SELECT $1, p.id FROM shop.product p WHERE p.id = $2
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;

            if inserted.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
            true
        };

        tx.commit().await?;
        Ok(is_added)
    }

    /// Whether the product is on the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM shop.wishlist_entry WHERE user_id = $1 AND product_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}

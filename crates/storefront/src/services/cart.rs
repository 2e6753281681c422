//! Stock-checked cart writes.
//!
//! Quantity checks read the product's stock under a row lock, so the
//! "line quantity never exceeds stock at write time" rule holds even with
//! concurrent writers.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use pawmarket_core::{CartLineId, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::cart::{self as cart_tx, CartRepository};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The line is not in the user's cart.
    #[error("cart item not found")]
    LineNotFound,

    /// Requested quantity exceeds current stock.
    #[error("only {available} of '{product}' in stock")]
    InsufficientStock { product: String, available: i32 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Check a resulting line quantity against stock.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` for a quantity below one and
/// `CartError::InsufficientStock` when `quantity` exceeds `stock`.
pub fn check_quantity(product: &str, quantity: i32, stock: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }
    if quantity > stock {
        return Err(CartError::InsufficientStock {
            product: product.to_string(),
            available: stock,
        });
    }
    Ok(())
}

/// Cart write operations.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add `quantity` of a product, creating the cart on first use.
    ///
    /// The combined quantity (existing line plus the addition) must fit in
    /// stock. Returns the new line quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity`, `CartError::ProductNotFound` or
    /// `CartError::InsufficientStock`; nothing is written in those cases.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<i32, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let product = cart_tx::lock_product_stock(&mut tx, product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        check_quantity(&product.name, quantity, product.stock)?;

        let cart_id = cart_tx::ensure_cart(&mut tx, user_id).await?;
        let existing = cart_tx::line_quantity(&mut tx, cart_id, product_id)
            .await?
            .unwrap_or(0);
        let new_quantity = existing.saturating_add(quantity);
        check_quantity(&product.name, new_quantity, product.stock)?;

        cart_tx::upsert_line(&mut tx, cart_id, product_id, new_quantity).await?;
        tx.commit().await.map_err(RepositoryError::from_write)?;

        tracing::debug!(%cart_id, new_quantity, "Cart line updated");
        Ok(new_quantity)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the line is not in the user's
    /// cart and `CartError::InsufficientStock` if stock is too low.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let product_id = cart_tx::lock_line(&mut tx, user_id, line_id)
            .await?
            .ok_or(CartError::LineNotFound)?;
        let product = cart_tx::lock_product_stock(&mut tx, product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        check_quantity(&product.name, quantity, product.stock)?;

        cart_tx::set_line_quantity(&mut tx, line_id, quantity).await?;
        tx.commit().await.map_err(RepositoryError::from_write)?;
        Ok(())
    }

    /// Remove a line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the line is not in the user's cart.
    pub async fn remove(&self, user_id: UserId, line_id: CartLineId) -> Result<(), CartError> {
        if CartRepository::new(self.pool)
            .remove_line(user_id, line_id)
            .await?
        {
            Ok(())
        } else {
            Err(CartError::LineNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_quantity_within_stock() {
        assert!(check_quantity("Cat Tree", 3, 5).is_ok());
        assert!(check_quantity("Cat Tree", 5, 5).is_ok());
    }

    #[test]
    fn test_check_quantity_over_stock() {
        match check_quantity("Cat Tree", 6, 5) {
            Err(CartError::InsufficientStock { product, available }) => {
                assert_eq!(product, "Cat Tree");
                assert_eq!(available, 5);
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
    }

    #[test]
    fn test_check_quantity_rejects_zero_and_negative() {
        assert!(matches!(
            check_quantity("Leash", 0, 10),
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            check_quantity("Leash", -2, 10),
            Err(CartError::InvalidQuantity)
        ));
    }
}

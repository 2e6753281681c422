//! Cart persistence.
//!
//! Reads go through [`CartRepository`]. Writes that must check stock run
//! inside a transaction owned by the cart service and use the free functions
//! at the bottom of this module, which take a connection instead of the pool.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use pawmarket_core::{CartId, CartLineId, ProductId, UserId, effective_unit_price, line_total};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    cart_id: CartId,
    id: CartLineId,
    product_id: ProductId,
    product_name: String,
    image_url: Option<String>,
    price: Decimal,
    promo_price: Option<Decimal>,
    quantity: i32,
    stock: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let unit_price = effective_unit_price(row.price, row.promo_price);
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            image_url: row.image_url,
            unit_price,
            quantity: row.quantity,
            stock: row.stock,
            line_total: line_total(unit_price, row.quantity),
        }
    }
}

/// Stock snapshot of a product locked for update.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedStock {
    pub name: String,
    pub stock: i32,
}

/// Repository for cart reads and simple deletes.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart. A user without a cart gets an empty one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.id AS cart_id, l.id, l.product_id, p.name AS product_name, p.image_url,
                   p.price, p.promo_price, l.quantity, p.stock
            FROM shop.cart c
            JOIN shop.cart_line l ON l.cart_id = c.id
            JOIN shop.product p ON p.id = l.product_id
            WHERE c.user_id = $1
            ORDER BY l.created_at, l.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let cart_id = match rows.first() {
            Some(row) => Some(row.cart_id),
            None => self.cart_id(user_id).await?,
        };

        Ok(Cart::from_lines(
            cart_id,
            rows.into_iter().map(Into::into).collect(),
        ))
    }

    /// The user's cart ID, if a cart exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_id(&self, user_id: UserId) -> Result<Option<CartId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartId>("SELECT id FROM shop.cart WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    /// Sum of quantities in the user's cart; 0 when there is no cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(l.quantity), 0)::bigint
            FROM shop.cart c
            JOIN shop.cart_line l ON l.cart_id = c.id
            WHERE c.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Remove one line from the user's cart.
    ///
    /// Returns `false` if the line does not belong to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_line l
            USING shop.cart c
            WHERE l.cart_id = c.id AND c.user_id = $1 AND l.id = $2
            ",
        )
        .bind(user_id)
        .bind(line_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every line in the user's cart. The cart row itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_line l
            USING shop.cart c
            WHERE l.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

/// Get the user's cart, creating it if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn ensure_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<CartId, RepositoryError> {
    let id = sqlx::query_scalar::<_, CartId>(
        r"
        INSERT INTO shop.cart (user_id) VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        ",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(id)
}

/// Lock a product row and read its stock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_product_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Option<LockedStock>, RepositoryError> {
    let row = sqlx::query_as::<_, LockedStock>(
        "SELECT name, stock FROM shop.product WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(row)
}

/// Current quantity of a product in a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn line_quantity(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
) -> Result<Option<i32>, RepositoryError> {
    let qty = sqlx::query_scalar::<_, i32>(
        "SELECT quantity FROM shop.cart_line WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(qty)
}

/// Set the quantity of a product in a cart, inserting the line if absent.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.cart_line (cart_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(())
}

/// Find a line in the user's cart and lock it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_line(
    conn: &mut PgConnection,
    user_id: UserId,
    line_id: CartLineId,
) -> Result<Option<ProductId>, RepositoryError> {
    let product_id = sqlx::query_scalar::<_, ProductId>(
        r"
        SELECT l.product_id
        FROM shop.cart_line l
        JOIN shop.cart c ON c.id = l.cart_id
        WHERE c.user_id = $1 AND l.id = $2
        FOR UPDATE OF l
        ",
    )
    .bind(user_id)
    .bind(line_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(product_id)
}

/// Overwrite the quantity of an existing line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_line_quantity(
    conn: &mut PgConnection,
    line_id: CartLineId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.cart_line SET quantity = $1 WHERE id = $2")
        .bind(quantity)
        .bind(line_id)
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;
    Ok(())
}

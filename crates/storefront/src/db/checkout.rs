//! Checkout transaction steps.
//!
//! Each function runs on the caller's transaction connection; the checkout
//! service owns `BEGIN`/`COMMIT` and the ordering of steps.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use pawmarket_core::{CartId, OrderId, OrderStatus, ProductId, ShippingMethodId, UserId};

use super::RepositoryError;

/// A cart line joined with its product, read under `FOR UPDATE`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedCartLine {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub promo_price: Option<Decimal>,
    pub stock: i32,
}

/// Order header values written at checkout.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub recipient_name: &'a str,
    pub phone: &'a str,
    pub shipping_address: &'a str,
    pub province_code: &'a str,
    pub district_code: &'a str,
    pub ward_code: &'a str,
    pub shipping_method_id: ShippingMethodId,
    pub shipping_fee: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub payment_method: &'a str,
    pub note: Option<&'a str>,
}

/// Lock the user's cart lines and their products.
///
/// Rows are locked in product ID order so two checkouts touching the same
/// products always acquire locks in the same sequence.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on serialization failure or deadlock.
pub async fn lock_cart_lines(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<LockedCartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, LockedCartLine>(
        r"
        SELECT c.id AS cart_id, l.product_id, p.name AS product_name, l.quantity,
               p.price, p.promo_price, p.stock
        FROM shop.cart c
        JOIN shop.cart_line l ON l.cart_id = c.id
        JOIN shop.product p ON p.id = l.product_id
        WHERE c.user_id = $1
        ORDER BY p.id
        FOR UPDATE OF c, l, p
        ",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(rows)
}

/// Insert the order header with status `pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder<'_>,
) -> Result<OrderId, RepositoryError> {
    let id = sqlx::query_scalar::<_, OrderId>(
        r"
        INSERT INTO shop.order (
            user_id, status, recipient_name, phone, shipping_address,
            province_code, district_code, ward_code, shipping_method_id,
            shipping_fee, subtotal, total, payment_method, note
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        ",
    )
    .bind(order.user_id)
    .bind(OrderStatus::Pending)
    .bind(order.recipient_name)
    .bind(order.phone)
    .bind(order.shipping_address)
    .bind(order.province_code)
    .bind(order.district_code)
    .bind(order.ward_code)
    .bind(order.shipping_method_id)
    .bind(order.shipping_fee)
    .bind(order.subtotal)
    .bind(order.total)
    .bind(order.payment_method)
    .bind(order.note)
    .fetch_one(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(id)
}

/// Insert one immutable order line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    product_name: &str,
    quantity: i32,
    unit_price: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_line (order_id, product_id, product_name, quantity, unit_price)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(quantity)
    .bind(unit_price)
    .execute(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;
    Ok(())
}

/// Move `quantity` units from stock to sold.
///
/// The `stock >= 0` check constraint backs up the planner's stock check.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the constraint rejects the update.
pub async fn take_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.product
        SET stock = stock - $2, sold_count = sold_count + $2, updated_at = now()
        WHERE id = $1
        ",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await
    .map_err(RepositoryError::from_write)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Delete a cart and all of its lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_line WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;
    sqlx::query("DELETE FROM shop.cart WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;
    Ok(())
}

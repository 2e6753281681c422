//! Cart domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use pawmarket_core::{CartId, CartLineId, ProductId};

/// One (product, quantity) entry with the product's current pricing.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub stock: i32,
    pub line_total: Decimal,
}

/// A user's cart. An absent cart is represented as an empty one.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: Option<CartId>,
    pub lines: Vec<CartLine>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl Cart {
    /// Build a cart view, computing the count and subtotal from its lines.
    #[must_use]
    pub fn from_lines(id: Option<CartId>, lines: Vec<CartLine>) -> Self {
        let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        Self {
            id,
            lines,
            item_count,
            subtotal,
        }
    }

    /// A user without a cart row.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_lines(None, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, price: i64, qty: i32) -> CartLine {
        let unit_price = Decimal::new(price, 0);
        CartLine {
            id: CartLineId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            image_url: None,
            unit_price,
            quantity: qty,
            stock: 10,
            line_total: pawmarket_core::line_total(unit_price, qty),
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from_lines(Some(CartId::new(1)), vec![line(1, 100, 2), line(2, 35, 1)]);
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.subtotal, Decimal::new(235, 0));
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::empty();
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert!(cart.id.is_none());
    }
}

//! Price arithmetic shared by the catalog, cart and checkout.
//!
//! Prices are stored as `numeric(12, 2)` and handled as [`Decimal`] end to
//! end; floating point never touches a money amount.

use rust_decimal::Decimal;

/// The price a customer actually pays for one unit.
///
/// The promotional price wins when it is present and strictly positive.
/// A zero or negative promo price is treated as "no promotion".
///
/// ```
/// use pawmarket_core::effective_unit_price;
/// use rust_decimal::Decimal;
///
/// let list = Decimal::new(100, 0);
/// assert_eq!(effective_unit_price(list, Some(Decimal::new(80, 0))), Decimal::new(80, 0));
/// assert_eq!(effective_unit_price(list, Some(Decimal::ZERO)), list);
/// assert_eq!(effective_unit_price(list, None), list);
/// ```
#[must_use]
pub fn effective_unit_price(list_price: Decimal, promo_price: Option<Decimal>) -> Decimal {
    match promo_price {
        Some(promo) if promo > Decimal::ZERO => promo,
        _ => list_price,
    }
}

/// Unit price times quantity.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_promo_falls_back_to_list_price() {
        let list = Decimal::new(4990, 2);
        assert_eq!(effective_unit_price(list, Some(Decimal::new(-1, 0))), list);
    }

    #[test]
    fn test_promo_above_list_is_still_used() {
        // Promo is a replacement price, not a discount cap.
        let list = Decimal::new(10, 0);
        let promo = Decimal::new(12, 0);
        assert_eq!(effective_unit_price(list, Some(promo)), promo);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::new(1250, 2), 3), Decimal::new(3750, 2));
        assert_eq!(line_total(Decimal::new(100, 0), 0), Decimal::ZERO);
    }
}

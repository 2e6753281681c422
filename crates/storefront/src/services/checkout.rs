//! Checkout: turn a cart into an order in one transaction.
//!
//! The flow is split so the arithmetic can be tested without a database:
//!
//! 1. [`CheckoutRequest::validate`] trims and checks the form fields.
//! 2. [`resolve_address`] resolves the location codes; the ward must belong
//!    to the district.
//! 3. Inside the transaction, [`plan_order`] prices the locked cart lines
//!    and rejects any line that no longer fits in stock.
//! 4. The plan is written out (order, lines, stock moves, cart delete) and
//!    committed. Any error before `COMMIT` drops the transaction, which rolls
//!    everything back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use pawmarket_core::{OrderId, ProductId, ShippingMethodId, UserId, effective_unit_price, line_total};

use super::location::{LocationError, LocationLookup};
use crate::db::checkout::{self as checkout_tx, LockedCartLine, NewOrder};
use crate::db::{CartRepository, RepositoryError, ShippingRepository};
use crate::models::{Cart, ShippingMethod};

/// Default payment method when the form leaves it blank.
pub const DEFAULT_PAYMENT_METHOD: &str = "cod";

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to check out.
    #[error("your cart is empty")]
    EmptyCart,

    /// A required form field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The province/district/ward selection does not resolve.
    #[error("{0}")]
    InvalidAddress(String),

    /// The selected shipping method does not exist.
    #[error("unknown shipping method")]
    UnknownShippingMethod,

    /// A line asks for more than is in stock.
    #[error("only {available} of '{product}' in stock, {requested} requested")]
    InsufficientStock {
        product: String,
        requested: i32,
        available: i32,
    },

    /// The location API could not be reached.
    #[error("address lookup failed: {0}")]
    Location(#[from] LocationError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout form.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub recipient_name: String,
    pub phone: String,
    pub street_address: String,
    pub province_code: String,
    pub district_code: String,
    pub ward_code: String,
    pub shipping_method_id: ShippingMethodId,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CheckoutRequest {
    /// Trim every field and check that the required ones are present.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` naming the first blank field, or
    /// `CheckoutError::InvalidAddress` when a location code is not a number.
    pub fn validate(&self) -> Result<Self, CheckoutError> {
        fn required(value: &str, name: &'static str) -> Result<String, CheckoutError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(CheckoutError::MissingField(name))
            } else {
                Ok(trimmed.to_owned())
            }
        }

        // Codes end up in the lookup URL path.
        fn location_code(value: &str, name: &'static str) -> Result<String, CheckoutError> {
            required(value, name)?
                .parse::<u32>()
                .map(|code| code.to_string())
                .map_err(|_| CheckoutError::InvalidAddress(format!("invalid {name}")))
        }

        Ok(Self {
            recipient_name: required(&self.recipient_name, "recipient_name")?,
            phone: required(&self.phone, "phone")?,
            street_address: required(&self.street_address, "street_address")?,
            province_code: location_code(&self.province_code, "province_code")?,
            district_code: location_code(&self.district_code, "district_code")?,
            ward_code: location_code(&self.ward_code, "ward_code")?,
            shipping_method_id: self.shipping_method_id,
            payment_method: Some(
                self.payment_method
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_PAYMENT_METHOD)
                    .to_owned(),
            ),
            note: crate::models::user::blank_to_none(self.note.clone()),
        })
    }

    fn payment_method(&self) -> &str {
        self.payment_method
            .as_deref()
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
    }
}

/// Resolve the location codes into a one-line delivery address.
///
/// The result reads `"{street}, {ward}, {district}, {province}"`.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidAddress` when a code is unknown, the
/// district lies in another province, or the ward is not in the district.
pub async fn resolve_address(
    location: &dyn LocationLookup,
    request: &CheckoutRequest,
) -> Result<String, CheckoutError> {
    let province = location
        .province(&request.province_code)
        .await?
        .ok_or_else(|| CheckoutError::InvalidAddress("invalid province".to_owned()))?;
    let district = location
        .district(&request.district_code)
        .await?
        .ok_or_else(|| CheckoutError::InvalidAddress("invalid district".to_owned()))?;

    if district.province_code.is_some_and(|code| code != province.code) {
        return Err(CheckoutError::InvalidAddress(
            "district does not belong to the selected province".to_owned(),
        ));
    }

    let ward = district.ward(&request.ward_code).ok_or_else(|| {
        CheckoutError::InvalidAddress(
            "ward is invalid or does not belong to the selected district".to_owned(),
        )
    })?;

    Ok(format!(
        "{}, {}, {}, {}",
        request.street_address, ward.name, district.name, province.name
    ))
}

/// One priced order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Priced order ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub lines: Vec<PlannedLine>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

/// Price locked cart lines and check each against stock.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for no lines and
/// `CheckoutError::InsufficientStock` for the first line over stock.
pub fn plan_order(
    lines: &[LockedCartLine],
    shipping_fee: Decimal,
) -> Result<OrderPlan, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut planned = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;
    for line in lines {
        if line.quantity > line.stock {
            return Err(CheckoutError::InsufficientStock {
                product: line.product_name.clone(),
                requested: line.quantity,
                available: line.stock,
            });
        }
        let unit_price = effective_unit_price(line.price, line.promo_price);
        subtotal += line_total(unit_price, line.quantity);
        planned.push(PlannedLine {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price,
        });
    }

    Ok(OrderPlan {
        lines: planned,
        subtotal,
        shipping_fee,
        total: subtotal + shipping_fee,
    })
}

/// What the checkout page shows before the order is placed.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPreview {
    pub cart: Cart,
    pub shipping_methods: Vec<ShippingMethod>,
}

/// Checkout operations.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    location: &'a dyn LocationLookup,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, location: &'a dyn LocationLookup) -> Self {
        Self { pool, location }
    }

    /// Cart with effective prices plus the shipping options.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    pub async fn preview(&self, user_id: UserId) -> Result<CheckoutPreview, CheckoutError> {
        let cart = CartRepository::new(self.pool).get(user_id).await?;
        if cart.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let shipping_methods = ShippingRepository::new(self.pool).list().await?;
        Ok(CheckoutPreview {
            cart,
            shipping_methods,
        })
    }

    /// Place an order from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any write, or an error from inside
    /// the transaction after which nothing has been changed.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<OrderId, CheckoutError> {
        let request = request.validate()?;
        let shipping_address = resolve_address(self.location, &request).await?;
        let shipping_method = ShippingRepository::new(self.pool)
            .get(request.shipping_method_id)
            .await?
            .ok_or(CheckoutError::UnknownShippingMethod)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let locked = checkout_tx::lock_cart_lines(&mut tx, user_id).await?;
        let plan = plan_order(&locked, shipping_method.fee)?;
        let Some(cart_id) = locked.first().map(|line| line.cart_id) else {
            return Err(CheckoutError::EmptyCart);
        };

        let order_id = checkout_tx::insert_order(
            &mut tx,
            &NewOrder {
                user_id,
                recipient_name: &request.recipient_name,
                phone: &request.phone,
                shipping_address: &shipping_address,
                province_code: &request.province_code,
                district_code: &request.district_code,
                ward_code: &request.ward_code,
                shipping_method_id: shipping_method.id,
                shipping_fee: plan.shipping_fee,
                subtotal: plan.subtotal,
                total: plan.total,
                payment_method: request.payment_method(),
                note: request.note.as_deref(),
            },
        )
        .await?;

        for line in &plan.lines {
            checkout_tx::insert_order_line(
                &mut tx,
                order_id,
                line.product_id,
                &line.product_name,
                line.quantity,
                line.unit_price,
            )
            .await?;
            checkout_tx::take_stock(&mut tx, line.product_id, line.quantity).await?;
        }

        checkout_tx::delete_cart(&mut tx, cart_id).await?;
        tx.commit().await.map_err(RepositoryError::from_write)?;

        tracing::info!(
            %order_id,
            total = %plan.total,
            lines = plan.lines.len(),
            "Order placed"
        );
        Ok(order_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use pawmarket_core::CartId;

    use super::*;
    use crate::services::location::{District, Province, Ward};

    fn locked(product: i32, qty: i32, stock: i32, price: i64, promo: Option<i64>) -> LockedCartLine {
        LockedCartLine {
            cart_id: CartId::new(1),
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            quantity: qty,
            price: Decimal::new(price, 0),
            promo_price: promo.map(|p| Decimal::new(p, 0)),
            stock,
        }
    }

    #[test]
    fn test_plan_single_line_with_shipping() {
        let plan = plan_order(&[locked(1, 3, 5, 100, None)], Decimal::new(20, 0)).unwrap();
        assert_eq!(plan.subtotal, Decimal::new(300, 0));
        assert_eq!(plan.total, Decimal::new(320, 0));
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].unit_price, Decimal::new(100, 0));
        assert_eq!(plan.lines[0].quantity, 3);
    }

    #[test]
    fn test_plan_uses_promo_price() {
        let lines = [locked(1, 2, 10, 100, Some(80)), locked(2, 1, 10, 50, Some(0))];
        let plan = plan_order(&lines, Decimal::ZERO).unwrap();
        assert_eq!(plan.lines[0].unit_price, Decimal::new(80, 0));
        assert_eq!(plan.lines[1].unit_price, Decimal::new(50, 0));
        assert_eq!(plan.total, Decimal::new(210, 0));
    }

    #[test]
    fn test_plan_total_is_sum_of_lines_plus_fee() {
        let lines = [locked(1, 2, 3, 15, None), locked(2, 4, 4, 7, Some(5))];
        let fee = Decimal::new(1250, 2);
        let plan = plan_order(&lines, fee).unwrap();
        let sum: Decimal = plan
            .lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();
        assert_eq!(plan.total, sum + fee);
    }

    #[test]
    fn test_plan_rejects_any_line_over_stock() {
        let lines = [locked(1, 1, 10, 100, None), locked(2, 4, 3, 10, None)];
        match plan_order(&lines, Decimal::ZERO) {
            Err(CheckoutError::InsufficientStock {
                product,
                requested,
                available,
            }) => {
                assert_eq!(product, "Product 2");
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_empty_cart() {
        assert!(matches!(
            plan_order(&[], Decimal::ZERO),
            Err(CheckoutError::EmptyCart)
        ));
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            recipient_name: " Mai Lan ".to_owned(),
            phone: "0901234567".to_owned(),
            street_address: "12 Hang Bai".to_owned(),
            province_code: "1".to_owned(),
            district_code: "1".to_owned(),
            ward_code: "4".to_owned(),
            shipping_method_id: ShippingMethodId::new(1),
            payment_method: None,
            note: Some("   ".to_owned()),
        }
    }

    #[test]
    fn test_validate_trims_and_defaults() {
        let valid = request().validate().unwrap();
        assert_eq!(valid.recipient_name, "Mai Lan");
        assert_eq!(valid.payment_method(), "cod");
        assert!(valid.note.is_none());
    }

    #[test]
    fn test_validate_missing_field() {
        let mut req = request();
        req.ward_code = String::new();
        assert!(matches!(
            req.validate(),
            Err(CheckoutError::MissingField("ward_code"))
        ));
    }

    #[test]
    fn test_validate_rejects_non_numeric_codes() {
        for bad in ["1/../../x", "1?x=", "-1", "79a"] {
            let mut req = request();
            req.district_code = bad.to_owned();
            assert!(
                matches!(req.validate(), Err(CheckoutError::InvalidAddress(_))),
                "{bad} should be rejected"
            );
        }

        let mut req = request();
        req.province_code = " 079 ".to_owned();
        assert_eq!(req.validate().unwrap().province_code, "79");
    }

    struct StubLookup {
        provinces: HashMap<String, Province>,
        districts: HashMap<String, District>,
    }

    #[async_trait]
    impl LocationLookup for StubLookup {
        async fn province(&self, code: &str) -> Result<Option<Province>, LocationError> {
            Ok(self.provinces.get(code).cloned())
        }

        async fn district(&self, code: &str) -> Result<Option<District>, LocationError> {
            Ok(self.districts.get(code).cloned())
        }
    }

    fn stub() -> StubLookup {
        let mut provinces = HashMap::new();
        provinces.insert(
            "1".to_owned(),
            Province {
                code: 1,
                name: "Thành phố Hà Nội".to_owned(),
            },
        );
        let mut districts = HashMap::new();
        districts.insert(
            "1".to_owned(),
            District {
                code: 1,
                name: "Quận Ba Đình".to_owned(),
                province_code: Some(1),
                wards: vec![Ward {
                    code: 4,
                    name: "Phường Trúc Bạch".to_owned(),
                }],
            },
        );
        districts.insert(
            "760".to_owned(),
            District {
                code: 760,
                name: "Quận 1".to_owned(),
                province_code: Some(79),
                wards: vec![],
            },
        );
        StubLookup {
            provinces,
            districts,
        }
    }

    #[tokio::test]
    async fn test_resolve_address_formats_components() {
        let address = resolve_address(&stub(), &request()).await.unwrap();
        assert_eq!(
            address,
            "12 Hang Bai, Phường Trúc Bạch, Quận Ba Đình, Thành phố Hà Nội"
        );
    }

    #[tokio::test]
    async fn test_resolve_address_rejects_foreign_ward() {
        let mut req = request();
        req.ward_code = "26734".to_owned();
        assert!(matches!(
            resolve_address(&stub(), &req).await,
            Err(CheckoutError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_address_rejects_unknown_codes() {
        let mut req = request();
        req.province_code = "99".to_owned();
        assert!(matches!(
            resolve_address(&stub(), &req).await,
            Err(CheckoutError::InvalidAddress(_))
        ));

        let mut req = request();
        req.district_code = "760".to_owned();
        assert!(matches!(
            resolve_address(&stub(), &req).await,
            Err(CheckoutError::InvalidAddress(_))
        ));
    }
}

//! Integration tests for cart and checkout.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p pawmarket-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;

use pawmarket_core::UserRole;
use pawmarket_integration_tests::{
    FixedLocations, cart_exists, checkout_request, create_product, create_shipping_method,
    create_user, order_count, set_stock, stock_and_sold, test_pool,
};
use pawmarket_storefront::db::{CartRepository, OrderRepository};
use pawmarket_storefront::services::{CartError, CartService, CheckoutError, CheckoutService};

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_cart_add_accumulates_and_respects_stock() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let product = create_product(&pool, Decimal::from(50), None, 4).await;
    let carts = CartService::new(&pool);

    assert_eq!(carts.add(user, product, 2).await.unwrap(), 2);
    assert_eq!(carts.add(user, product, 2).await.unwrap(), 4);

    let err = carts.add(user, product, 1).await.unwrap_err();
    assert!(matches!(err, CartError::InsufficientStock { .. }));

    let err = carts.add(user, product, 0).await.unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_cart_update_respects_stock() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let product = create_product(&pool, Decimal::from(50), None, 3).await;
    let carts = CartService::new(&pool);
    carts.add(user, product, 1).await.unwrap();
    let line = CartRepository::new(&pool).get(user).await.unwrap().lines[0].id;

    let err = carts.update(user, line, 4).await.unwrap_err();
    assert!(matches!(err, CartError::InsufficientStock { available: 3, .. }));

    carts.update(user, line, 3).await.unwrap();
    let cart = CartRepository::new(&pool).get(user).await.unwrap();
    assert_eq!(cart.lines[0].quantity, 3);

    let err = carts.update(user, line, 0).await.unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity));

    let stranger = create_user(&pool, UserRole::Customer).await;
    let err = carts.update(stranger, line, 1).await.unwrap_err();
    assert!(matches!(err, CartError::LineNotFound));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_checkout_totals_stock_and_cart() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let product = create_product(&pool, Decimal::from(100), None, 5).await;
    let shipping = create_shipping_method(&pool, Decimal::from(20)).await;
    CartService::new(&pool).add(user, product, 3).await.unwrap();

    let locations = FixedLocations::default();
    let order_id = CheckoutService::new(&pool, &locations)
        .place_order(user, &checkout_request(shipping))
        .await
        .unwrap();

    let order = OrderRepository::new(&pool)
        .get_for_user(user, order_id)
        .await
        .unwrap()
        .expect("order should belong to the user");
    assert_eq!(order.subtotal, Decimal::from(300));
    assert_eq!(order.shipping_fee, Decimal::from(20));
    assert_eq!(order.total, Decimal::from(320));
    assert_eq!(order.payment_method, "cod");
    assert!(order.shipping_address.contains("Quận 1"));

    let lines = OrderRepository::new(&pool).lines(order_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
    assert_eq!(lines[0].unit_price, Decimal::from(100));

    assert_eq!(stock_and_sold(&pool, product).await, (2, 3));
    assert!(!cart_exists(&pool, user).await);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_checkout_uses_promo_price() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let product =
        create_product(&pool, Decimal::from(200), Some(Decimal::from(150)), 10).await;
    let shipping = create_shipping_method(&pool, Decimal::ZERO).await;
    CartService::new(&pool).add(user, product, 2).await.unwrap();

    let locations = FixedLocations::default();
    let order_id = CheckoutService::new(&pool, &locations)
        .place_order(user, &checkout_request(shipping))
        .await
        .unwrap();

    let order = OrderRepository::new(&pool)
        .get_for_user(user, order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.total, Decimal::from(300));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_checkout_without_enough_stock_changes_nothing() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let plenty = create_product(&pool, Decimal::from(10), None, 10).await;
    let scarce = create_product(&pool, Decimal::from(10), None, 5).await;
    let shipping = create_shipping_method(&pool, Decimal::from(20)).await;

    let carts = CartService::new(&pool);
    carts.add(user, plenty, 2).await.unwrap();
    carts.add(user, scarce, 4).await.unwrap();
    // Someone else bought most of it after it went into the cart.
    set_stock(&pool, scarce, 1).await;

    let locations = FixedLocations::default();
    let err = CheckoutService::new(&pool, &locations)
        .place_order(user, &checkout_request(shipping))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            requested: 4,
            available: 1,
            ..
        }
    ));

    assert_eq!(order_count(&pool, user).await, 0);
    assert_eq!(stock_and_sold(&pool, plenty).await, (10, 0));
    assert_eq!(stock_and_sold(&pool, scarce).await, (1, 0));
    assert!(cart_exists(&pool, user).await);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_checkout_rejects_unknown_address() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let product = create_product(&pool, Decimal::from(10), None, 10).await;
    let shipping = create_shipping_method(&pool, Decimal::from(20)).await;
    CartService::new(&pool).add(user, product, 1).await.unwrap();

    let mut request = checkout_request(shipping);
    request.ward_code = "99999".to_string();

    let locations = FixedLocations::default();
    let err = CheckoutService::new(&pool, &locations)
        .place_order(user, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidAddress(_)));
    assert_eq!(order_count(&pool, user).await, 0);
    assert_eq!(stock_and_sold(&pool, product).await, (10, 0));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_checkout_empty_cart() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let shipping = create_shipping_method(&pool, Decimal::from(20)).await;

    let locations = FixedLocations::default();
    let err = CheckoutService::new(&pool, &locations)
        .place_order(user, &checkout_request(shipping))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

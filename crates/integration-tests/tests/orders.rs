//! Integration tests for order cancellation and back-office status changes.
//!
//! Run with: cargo test -p pawmarket-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;

use pawmarket_admin::db::{AdminCancelOutcome, AdminOrderRepository, RepositoryError};
use pawmarket_core::{OrderId, OrderStatus, UserId, UserRole};
use pawmarket_integration_tests::{
    FixedLocations, checkout_request, create_product, create_shipping_method, create_user,
    force_status, stock_and_sold, test_pool,
};
use pawmarket_storefront::db::OrderRepository;
use pawmarket_storefront::db::orders::CancelOutcome;
use pawmarket_storefront::services::{CartService, CheckoutService};

/// Place a one-line order of quantity 2 and return it with its owner.
async fn place_order(pool: &PgPool) -> (UserId, OrderId) {
    let user = create_user(pool, UserRole::Customer).await;
    let product = create_product(pool, Decimal::from(40), None, 10).await;
    let shipping = create_shipping_method(pool, Decimal::from(15)).await;
    CartService::new(pool).add(user, product, 2).await.unwrap();

    let locations = FixedLocations::default();
    let order_id = CheckoutService::new(pool, &locations)
        .place_order(user, &checkout_request(shipping))
        .await
        .unwrap();
    (user, order_id)
}

// ============================================================================
// Customer cancellation
// ============================================================================

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_customer_cancels_pending_order() {
    let pool = test_pool().await;
    let (user, order_id) = place_order(&pool).await;

    let outcome = OrderRepository::new(&pool)
        .cancel_for_user(user, order_id)
        .await
        .unwrap();
    let CancelOutcome::Cancelled(order) = outcome else {
        panic!("pending order should be cancellable");
    };
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.cancelled_at.is_some());

    // A second attempt sees the cancelled status.
    let outcome = OrderRepository::new(&pool)
        .cancel_for_user(user, order_id)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        CancelOutcome::NotAllowed(OrderStatus::Cancelled)
    ));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_customer_cannot_cancel_after_processing() {
    let pool = test_pool().await;
    let (user, order_id) = place_order(&pool).await;
    force_status(&pool, order_id, OrderStatus::Processing).await;

    let outcome = OrderRepository::new(&pool)
        .cancel_for_user(user, order_id)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        CancelOutcome::NotAllowed(OrderStatus::Processing)
    ));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_customer_cannot_cancel_someone_elses_order() {
    let pool = test_pool().await;
    let (_, order_id) = place_order(&pool).await;
    let stranger = create_user(&pool, UserRole::Customer).await;

    let result = OrderRepository::new(&pool)
        .cancel_for_user(stranger, order_id)
        .await;
    assert!(matches!(
        result,
        Err(pawmarket_storefront::db::RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_cancel_does_not_restock() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let product = create_product(&pool, Decimal::from(40), None, 10).await;
    let shipping = create_shipping_method(&pool, Decimal::ZERO).await;
    CartService::new(&pool).add(user, product, 3).await.unwrap();

    let locations = FixedLocations::default();
    let order_id = CheckoutService::new(&pool, &locations)
        .place_order(user, &checkout_request(shipping))
        .await
        .unwrap();
    OrderRepository::new(&pool)
        .cancel_for_user(user, order_id)
        .await
        .unwrap();

    assert_eq!(stock_and_sold(&pool, product).await, (7, 3));
}

// ============================================================================
// Back-office status changes
// ============================================================================

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_admin_shipping_sets_expected_delivery() {
    let pool = test_pool().await;
    let (_, order_id) = place_order(&pool).await;
    let orders = AdminOrderRepository::new(&pool);

    let update = orders
        .update_status(order_id, OrderStatus::Shipping)
        .await
        .unwrap();
    assert_eq!(update.previous_status, OrderStatus::Pending);
    assert_eq!(update.status, OrderStatus::Shipping);
    let first_estimate = update
        .expected_delivery_at
        .expect("shipping should set a delivery estimate");
    assert!(update.cancelled_at.is_none());

    // Leaving and re-entering shipping keeps the first estimate.
    orders
        .update_status(order_id, OrderStatus::Processing)
        .await
        .unwrap();
    let update = orders
        .update_status(order_id, OrderStatus::Shipping)
        .await
        .unwrap();
    assert_eq!(update.expected_delivery_at, Some(first_estimate));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_admin_status_change_to_cancelled_stamps_time() {
    let pool = test_pool().await;
    let (_, order_id) = place_order(&pool).await;

    let update = AdminOrderRepository::new(&pool)
        .update_status(order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(update.status, OrderStatus::Cancelled);
    assert!(update.cancelled_at.is_some());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_admin_cancel_rules() {
    let pool = test_pool().await;
    let orders = AdminOrderRepository::new(&pool);

    let (_, shipping_order) = place_order(&pool).await;
    force_status(&pool, shipping_order, OrderStatus::Shipping).await;
    let outcome = orders.cancel(shipping_order).await.unwrap();
    let AdminCancelOutcome::Cancelled(update) = outcome else {
        panic!("shipping order should be cancellable by staff");
    };
    assert_eq!(update.previous_status, OrderStatus::Shipping);
    assert!(update.cancelled_at.is_some());

    let (_, completed_order) = place_order(&pool).await;
    force_status(&pool, completed_order, OrderStatus::Completed).await;
    let outcome = orders.cancel(completed_order).await.unwrap();
    assert!(matches!(
        outcome,
        AdminCancelOutcome::NotAllowed(OrderStatus::Completed)
    ));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_admin_detail_and_missing_order() {
    let pool = test_pool().await;
    let (_, order_id) = place_order(&pool).await;
    let orders = AdminOrderRepository::new(&pool);

    let detail = orders.detail(order_id).await.unwrap().unwrap();
    assert_eq!(detail.total, Decimal::from(95));
    assert_eq!(detail.lines.len(), 1);
    assert!(detail.can_cancel);

    let missing = OrderId::new(i32::MAX);
    assert!(orders.detail(missing).await.unwrap().is_none());
    assert!(matches!(
        orders.update_status(missing, OrderStatus::Completed).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_admin_list_filters_by_status() {
    let pool = test_pool().await;
    let (_, order_id) = place_order(&pool).await;
    force_status(&pool, order_id, OrderStatus::Processing).await;
    let orders = AdminOrderRepository::new(&pool);

    let processing = orders.list(Some(OrderStatus::Processing)).await.unwrap();
    assert!(processing.iter().any(|o| o.id == order_id));
    assert!(processing.iter().all(|o| o.status == OrderStatus::Processing));

    let pending = orders.list(Some(OrderStatus::Pending)).await.unwrap();
    assert!(pending.iter().all(|o| o.id != order_id));

    let all = orders.list(None).await.unwrap();
    assert!(all.iter().any(|o| o.id == order_id));
}

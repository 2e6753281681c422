//! Integration tests for the catalog read path and the wishlist.
//!
//! Run with: cargo test -p pawmarket-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;

use pawmarket_core::{PriceRange, ProductId, ProductSort, UserRole};
use pawmarket_integration_tests::{
    classify_product, create_brand, create_category, create_product, create_user,
    rename_product, test_pool, unique_token,
};
use pawmarket_storefront::db::{CatalogRepository, RepositoryError, WishlistRepository};
use pawmarket_storefront::models::catalog::{Product, ProductFilter};

fn ids(products: &[Product]) -> Vec<ProductId> {
    products.iter().map(|p| p.id).collect()
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_wishlist_toggle_and_wishlist_only_view() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;
    let liked = create_product(&pool, Decimal::from(30), None, 3).await;
    let other = create_product(&pool, Decimal::from(30), None, 3).await;
    let wishlist = WishlistRepository::new(&pool);

    assert!(wishlist.toggle(user, liked).await.unwrap());
    assert!(wishlist.contains(user, liked).await.unwrap());
    assert!(!wishlist.contains(user, other).await.unwrap());

    let filter = ProductFilter {
        wishlist_of: Some(user),
        ..ProductFilter::default()
    };
    let products = CatalogRepository::new(&pool)
        .list_products(&filter)
        .await
        .unwrap();
    assert_eq!(ids(&products), vec![liked]);

    assert!(!wishlist.toggle(user, liked).await.unwrap());
    assert!(!wishlist.contains(user, liked).await.unwrap());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_wishlist_toggle_unknown_product() {
    let pool = test_pool().await;
    let user = create_user(&pool, UserRole::Customer).await;

    let result = WishlistRepository::new(&pool)
        .toggle(user, ProductId::new(i32::MAX))
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_product_view_count_and_effective_price() {
    let pool = test_pool().await;
    let product =
        create_product(&pool, Decimal::from(120), Some(Decimal::from(99)), 2).await;
    let catalog = CatalogRepository::new(&pool);

    catalog.increment_view_count(product).await.unwrap();
    catalog.increment_view_count(product).await.unwrap();

    let found = catalog.get_product(product).await.unwrap().unwrap();
    assert_eq!(found.view_count, 2);
    assert_eq!(found.effective_price, Decimal::from(99));

    assert!(matches!(
        catalog.increment_view_count(ProductId::new(i32::MAX)).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_list_products_by_category_and_brand() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let (brand, brand_name) = create_brand(&pool).await;
    let branded = create_product(&pool, Decimal::from(20), None, 1).await;
    let plain = create_product(&pool, Decimal::from(10), None, 1).await;
    let elsewhere = create_product(&pool, Decimal::from(10), None, 1).await;
    classify_product(&pool, branded, category, Some(brand)).await;
    classify_product(&pool, plain, category, None).await;
    let catalog = CatalogRepository::new(&pool);

    let by_category = ProductFilter {
        category_id: Some(category),
        sort: ProductSort::PriceAsc,
        ..ProductFilter::default()
    };
    let products = catalog.list_products(&by_category).await.unwrap();
    assert_eq!(ids(&products), vec![plain, branded]);
    assert!(!ids(&products).contains(&elsewhere));

    let by_brand = ProductFilter {
        brand: Some(format!(" {brand_name} ")),
        ..ProductFilter::default()
    };
    let products = catalog.list_products(&by_brand).await.unwrap();
    assert_eq!(ids(&products), vec![branded]);

    let unknown_brand = ProductFilter {
        brand: Some(format!("{brand_name}-missing")),
        ..ProductFilter::default()
    };
    assert!(catalog.list_products(&unknown_brand).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_list_products_price_range_and_sort() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let cheap = create_product(&pool, Decimal::from(12), None, 1).await;
    let mid = create_product(&pool, Decimal::from(13), Some(Decimal::from(5)), 1).await;
    let dear = create_product(&pool, Decimal::from(40), None, 1).await;
    for product in [cheap, mid, dear] {
        classify_product(&pool, product, category, None).await;
    }
    let catalog = CatalogRepository::new(&pool);
    let in_category = |price_range: Option<&str>, sort| ProductFilter {
        category_id: Some(category),
        price_range: price_range.and_then(PriceRange::parse),
        sort,
        ..ProductFilter::default()
    };

    let products = catalog
        .list_products(&in_category(None, ProductSort::PriceDesc))
        .await
        .unwrap();
    assert_eq!(ids(&products), vec![dear, mid, cheap]);

    // Bounds are inclusive and apply to the list price, not the promo price.
    let products = catalog
        .list_products(&in_category(Some("12.5-40"), ProductSort::PriceAsc))
        .await
        .unwrap();
    assert_eq!(ids(&products), vec![mid, dear]);

    let products = catalog
        .list_products(&in_category(Some("40-12"), ProductSort::PriceAsc))
        .await
        .unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_list_products_search_escapes_wildcards() {
    let pool = test_pool().await;
    let token = unique_token();
    let percent = create_product(&pool, Decimal::from(9), None, 1).await;
    let digits = create_product(&pool, Decimal::from(9), None, 1).await;
    let underscore = create_product(&pool, Decimal::from(9), None, 1).await;
    let letter = create_product(&pool, Decimal::from(9), None, 1).await;
    rename_product(&pool, percent, &format!("Salmon {token} 100% Pate")).await;
    rename_product(&pool, digits, &format!("Salmon {token} 1000 Pate")).await;
    rename_product(&pool, underscore, &format!("Tuna {token} a_b")).await;
    rename_product(&pool, letter, &format!("Tuna {token} axb")).await;
    let catalog = CatalogRepository::new(&pool);
    let search = |term: String| ProductFilter {
        search: Some(term),
        ..ProductFilter::default()
    };

    let products = catalog
        .list_products(&search(format!("{token} 100%")))
        .await
        .unwrap();
    assert_eq!(ids(&products), vec![percent]);

    let products = catalog
        .list_products(&search(format!("{token} A_B")))
        .await
        .unwrap();
    assert_eq!(ids(&products), vec![underscore]);

    let products = catalog
        .list_products(&search(format!("salmon {}", token.to_uppercase())))
        .await
        .unwrap();
    let mut found = ids(&products);
    found.sort_unstable();
    let mut expected = vec![percent, digits];
    expected.sort_unstable();
    assert_eq!(found, expected);
}

//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pawmarket_core::{CategoryId, PriceRange, ProductId, ProductSort, UserId};

use crate::db::catalog::{BESTSELLER_COUNT, DEFAULT_RELATED_COUNT};
use crate::db::{CatalogRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{Brand, CategorySummary, Product, ProductFilter};
use crate::state::AppState;

/// Upper bound on the `count` parameter of the widget endpoints.
const MAX_WIDGET_COUNT: i64 = 24;

/// Product list query string. Every field is optional and forgiving:
/// blank or malformed values are ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<String>,
    pub brand: Option<String>,
    pub price_range: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub wishlist: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ProductQuery {
    /// Build the repository filter. The wishlist flag only applies when
    /// someone is signed in.
    #[must_use]
    pub fn into_filter(self, user: Option<UserId>) -> ProductFilter {
        let wishlist = matches!(
            non_blank(self.wishlist.as_deref()),
            Some("true" | "1" | "on")
        );

        ProductFilter {
            category_id: non_blank(self.category_id.as_deref())
                .and_then(|id| id.parse::<i32>().ok())
                .map(CategoryId::new),
            brand: non_blank(self.brand.as_deref()).map(str::to_owned),
            price_range: non_blank(self.price_range.as_deref()).and_then(PriceRange::parse),
            search: non_blank(self.search.as_deref()).map(str::to_owned),
            sort: ProductSort::from_query(non_blank(self.sort.as_deref())),
            wishlist_of: user.filter(|_| wishlist),
        }
    }
}

/// `count` parameter of the widget endpoints.
#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub count: Option<i64>,
}

/// Product list response.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: usize,
}

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub in_wishlist: bool,
}

/// List products.
#[instrument(skip(state, user, query))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductList>> {
    let filter = query.into_filter(user.map(|u| u.id));
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(Json(ProductList {
        total: products.len(),
        products,
    }))
}

/// Product detail. Each view bumps the product's view counter.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let catalog = CatalogRepository::new(state.pool());
    let mut product = catalog
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    catalog.increment_view_count(id).await?;
    product.view_count = product.view_count.saturating_add(1);

    let in_wishlist = match user {
        Some(user) => {
            WishlistRepository::new(state.pool())
                .contains(user.id, id)
                .await?
        }
        None => false,
    };

    Ok(Json(ProductDetail {
        product,
        in_wishlist,
    }))
}

/// Products from the same category.
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<Product>>> {
    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let count = query
        .count
        .unwrap_or(DEFAULT_RELATED_COUNT)
        .clamp(1, MAX_WIDGET_COUNT);
    Ok(Json(catalog.related_products(&product, count).await?))
}

/// Best-selling products.
pub async fn bestsellers(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = CatalogRepository::new(state.pool())
        .bestsellers(BESTSELLER_COUNT)
        .await?;
    Ok(Json(products))
}

/// Categories with product counts.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>> {
    Ok(Json(
        CatalogRepository::new(state.pool()).categories().await?,
    ))
}

/// Brands, alphabetical.
pub async fn brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    Ok(Json(CatalogRepository::new(state.pool()).brands().await?))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_query_parses_all_fields() {
        let query = ProductQuery {
            category_id: Some("3".into()),
            brand: Some(" Royal Canin ".into()),
            price_range: Some("100-500".into()),
            search: Some("kibble".into()),
            sort: Some("price_desc".into()),
            wishlist: None,
        };
        let filter = query.into_filter(None);
        assert_eq!(filter.category_id, Some(CategoryId::new(3)));
        assert_eq!(filter.brand.as_deref(), Some("Royal Canin"));
        assert_eq!(
            filter.price_range.map(|r| r.max),
            Some(Decimal::new(500, 0))
        );
        assert_eq!(filter.sort, ProductSort::PriceDesc);
    }

    #[test]
    fn test_query_ignores_malformed_values() {
        let query = ProductQuery {
            category_id: Some("abc".into()),
            price_range: Some("lots".into()),
            sort: Some("popular".into()),
            search: Some("   ".into()),
            ..ProductQuery::default()
        };
        let filter = query.into_filter(None);
        assert!(filter.category_id.is_none());
        assert!(filter.price_range.is_none());
        assert!(filter.search.is_none());
        assert_eq!(filter.sort, ProductSort::NameAsc);
    }

    #[test]
    fn test_wishlist_flag_needs_user() {
        let query = || ProductQuery {
            wishlist: Some("true".into()),
            category_id: Some("2".into()),
            ..ProductQuery::default()
        };
        assert!(query().into_filter(None).wishlist_of.is_none());

        let filter = query().into_filter(Some(UserId::new(9)));
        assert_eq!(filter.wishlist_of, Some(UserId::new(9)));
        assert_eq!(filter.effective_category(), None);
    }
}

//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pawmarket_core::{BrandId, CategoryId, PriceRange, ProductId, ProductSort, UserId};

/// A product as shown to customers.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub promo_price: Option<Decimal>,
    /// Price actually charged: promo when positive, else list.
    pub effective_price: Decimal,
    pub stock: i32,
    pub sold_count: i32,
    pub view_count: i32,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub brand_id: Option<BrandId>,
    pub brand_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A category together with how many products it holds.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub product_count: i64,
}

/// A brand name.
#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

/// Product list filter, already parsed from the query string.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub brand: Option<String>,
    pub price_range: Option<PriceRange>,
    pub search: Option<String>,
    pub sort: ProductSort,
    /// Restrict to this user's wishlist. Replaces `category_id` when set.
    pub wishlist_of: Option<UserId>,
}

impl ProductFilter {
    /// The category restriction that actually applies.
    ///
    /// A wishlist-only view ignores the category.
    #[must_use]
    pub const fn effective_category(&self) -> Option<CategoryId> {
        if self.wishlist_of.is_some() {
            None
        } else {
            self.category_id
        }
    }

    /// Search term wrapped for `ILIKE`, with wildcard characters escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wishlist_replaces_category() {
        let filter = ProductFilter {
            category_id: Some(CategoryId::new(3)),
            wishlist_of: Some(UserId::new(1)),
            ..ProductFilter::default()
        };
        assert_eq!(filter.effective_category(), None);

        let filter = ProductFilter {
            category_id: Some(CategoryId::new(3)),
            ..ProductFilter::default()
        };
        assert_eq!(filter.effective_category(), Some(CategoryId::new(3)));
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = ProductFilter {
            search: Some(" 100%_cat ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%100\\%\\_cat%"));

        let blank = ProductFilter {
            search: Some("   ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(blank.search_pattern(), None);
    }
}

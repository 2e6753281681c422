//! Catalog read path: product lists, detail, widgets, categories and brands.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pawmarket_core::{BrandId, CategoryId, ProductId, effective_unit_price};

use super::RepositoryError;
use crate::models::catalog::{Brand, CategorySummary, Product, ProductFilter};

/// Default number of related products shown on a detail page.
pub const DEFAULT_RELATED_COUNT: i64 = 4;
/// Number of bestsellers shown on the home page.
pub const BESTSELLER_COUNT: i64 = 8;

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.promo_price, p.stock,
           p.sold_count, p.view_count, p.image_url, p.created_at,
           p.category_id, c.name AS category_name,
           p.brand_id, b.name AS brand_name
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id
    LEFT JOIN shop.brand b ON b.id = p.brand_id
";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Decimal,
    promo_price: Option<Decimal>,
    stock: i32,
    sold_count: i32,
    view_count: i32,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    brand_id: Option<BrandId>,
    brand_name: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            effective_price: effective_unit_price(row.price, row.promo_price),
            name: row.name,
            description: row.description,
            price: row.price,
            promo_price: row.promo_price,
            stock: row.stock,
            sold_count: row.sold_count,
            view_count: row.view_count,
            image_url: row.image_url,
            category_id: row.category_id,
            category_name: row.category_name,
            brand_id: row.brand_id,
            brand_name: row.brand_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    product_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: BrandId,
    name: String,
}

/// Repository for catalog queries.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching a filter.
    ///
    /// Every restriction is optional; absent ones are skipped with
    /// `$n IS NULL OR ...`. The sort fragment comes from a closed enum.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            {PRODUCT_SELECT}
            WHERE ($1::int IS NULL OR p.category_id = $1)
              AND ($2::text IS NULL OR b.name = $2)
              AND ($3::numeric IS NULL OR p.price >= $3)
              AND ($4::numeric IS NULL OR p.price <= $4)
              AND ($5::text IS NULL OR p.name ILIKE $5 OR p.description ILIKE $5)
              AND ($6::int IS NULL OR EXISTS (
                    SELECT 1 FROM shop.wishlist_entry w
                    WHERE w.product_id = p.id AND w.user_id = $6))
            ORDER BY {order_by}
            ",
            order_by = filter.sort.order_by(),
        );

        let brand = filter
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty());

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.effective_category())
            .bind(brand)
            .bind(filter.price_range.map(|r| r.min))
            .bind(filter.price_range.map(|r| r.max))
            .bind(filter.search_pattern())
            .bind(filter.wishlist_of)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Increment a product's view counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn increment_view_count(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.product SET view_count = view_count + 1 WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// In-stock products from the same category, newest first.
    ///
    /// Products without a category have no related products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related_products(
        &self,
        product: &Product,
        count: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            {PRODUCT_SELECT}
            WHERE p.category_id = $1 AND p.id <> $2 AND p.stock > 0
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3
            "
        ))
        .bind(category_id)
        .bind(product.id)
        .bind(count)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Best-selling products by sold count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn bestsellers(&self, count: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} ORDER BY p.sold_count DESC, p.id ASC LIMIT $1"
        ))
        .bind(count)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Categories with product counts, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.name, COUNT(p.id) AS product_count
            FROM shop.category c
            LEFT JOIN shop.product p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategorySummary {
                id: r.id,
                name: r.name,
                product_count: r.product_count,
            })
            .collect())
    }

    /// All brands, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandRow>("SELECT id, name FROM shop.brand ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Brand {
                id: r.id,
                name: r.name,
            })
            .collect())
    }
}

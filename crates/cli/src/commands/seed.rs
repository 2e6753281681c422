//! Catalog seeding from YAML.
//!
//! The whole file is validated before connecting, then loaded in a single
//! transaction. Categories, brands, shipping methods and coupons are upserted
//! by their unique name or code; products are inserted only when no product
//! with the same name exists, so re-running a seed file is safe.
//!
//! ```yaml
//! categories:
//!   - name: Cat Food
//! brands:
//!   - name: Whiskas
//! shipping_methods:
//!   - { name: Standard, fee: 20000, estimated_days: 4 }
//! coupons:
//!   - { code: PAW10, discount_percent: 10 }
//! products:
//!   - name: Tuna Pouch 85g
//!     price: 15000
//!     promo_price: 12000
//!     stock: 200
//!     category: Cat Food
//!     brand: Whiskas
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use sqlx::PgConnection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read {0}: {1}")]
    Io(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<NamedSeed>,
    #[serde(default)]
    pub brands: Vec<NamedSeed>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethodSeed>,
    #[serde(default)]
    pub coupons: Vec<CouponSeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Category or brand.
#[derive(Debug, Deserialize)]
pub struct NamedSeed {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShippingMethodSeed {
    pub name: String,
    pub fee: Decimal,
    pub estimated_days: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CouponSeed {
    pub code: String,
    pub discount_percent: Option<i32>,
    pub discount_amount: Option<Decimal>,
    pub min_order_total: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub promo_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    pub image_url: Option<String>,
    /// Category name; must be listed under `categories` or already exist.
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// Counts of rows written per table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: u64,
    pub brands: u64,
    pub shipping_methods: u64,
    pub coupons: u64,
    pub products_inserted: u64,
    pub products_skipped: u64,
}

fn duplicates<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    names.filter(|n| !seen.insert(n.to_lowercase())).collect()
}

/// Check the file for mistakes that would otherwise fail halfway through.
///
/// Category and brand references are checked against the file only; names
/// that already exist in the database are accepted at load time.
#[must_use]
pub fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    for (kind, names) in [
        ("category", duplicates(seed.categories.iter().map(|c| c.name.as_str()))),
        ("brand", duplicates(seed.brands.iter().map(|b| b.name.as_str()))),
        (
            "shipping method",
            duplicates(seed.shipping_methods.iter().map(|s| s.name.as_str())),
        ),
        ("coupon", duplicates(seed.coupons.iter().map(|c| c.code.as_str()))),
    ] {
        errors.extend(names.into_iter().map(|n| format!("duplicate {kind}: {n}")));
    }

    for method in &seed.shipping_methods {
        if method.fee < Decimal::ZERO {
            errors.push(format!("shipping method {}: negative fee", method.name));
        }
    }

    for coupon in &seed.coupons {
        if coupon.discount_percent.is_none() && coupon.discount_amount.is_none() {
            errors.push(format!("coupon {}: needs discount_percent or discount_amount", coupon.code));
        }
        if coupon.discount_percent.is_some_and(|p| !(0..=100).contains(&p)) {
            errors.push(format!("coupon {}: discount_percent must be 0-100", coupon.code));
        }
        if matches!((coupon.starts_at, coupon.expires_at), (Some(start), Some(end)) if end <= start) {
            errors.push(format!("coupon {}: expires before it starts", coupon.code));
        }
    }

    for product in &seed.products {
        if product.name.trim().is_empty() {
            errors.push("product with empty name".to_string());
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("product {}: negative price", product.name));
        }
        if product.stock < 0 {
            errors.push(format!("product {}: negative stock", product.name));
        }
        if product.promo_price.is_some_and(|promo| promo > product.price) {
            errors.push(format!("product {}: promo_price above price", product.name));
        }
    }

    errors
}

/// Load a catalog seed file.
///
/// # Errors
///
/// Returns `SeedError::Invalid` without touching the database if validation
/// fails. Any database error rolls the whole file back.
pub async fn catalog(database_url: &SecretString, path: &Path) -> Result<SeedSummary, SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Io(path.display().to_string(), e))?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        tracing::error!("Seed file validation failed:");
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = super::connect(database_url).await?;
    let mut tx = pool.begin().await?;
    let summary = load(&mut *tx, &seed).await?;
    tx.commit().await?;

    tracing::info!("Seeding complete");
    tracing::info!("  Categories: {}", summary.categories);
    tracing::info!("  Brands: {}", summary.brands);
    tracing::info!("  Shipping methods: {}", summary.shipping_methods);
    tracing::info!("  Coupons: {}", summary.coupons);
    tracing::info!(
        "  Products: {} inserted, {} already present",
        summary.products_inserted,
        summary.products_skipped
    );
    Ok(summary)
}

async fn upsert_named(
    conn: &mut PgConnection,
    table: &str,
    items: &[NamedSeed],
) -> Result<HashMap<String, i32>, sqlx::Error> {
    let mut ids = HashMap::new();
    for item in items {
        let id = sqlx::query_scalar::<_, i32>(&format!(
            r"
            INSERT INTO shop.{table} (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING id
            "
        ))
        .bind(item.name.trim())
        .bind(item.description.as_deref())
        .fetch_one(&mut *conn)
        .await?;
        ids.insert(item.name.trim().to_lowercase(), id);
    }
    Ok(ids)
}

async fn resolve(
    conn: &mut PgConnection,
    table: &str,
    known: &HashMap<String, i32>,
    name: Option<&str>,
) -> Result<Option<i32>, sqlx::Error> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if let Some(id) = known.get(&name.to_lowercase()) {
        return Ok(Some(*id));
    }
    let id = sqlx::query_scalar::<_, i32>(&format!(
        "SELECT id FROM shop.{table} WHERE lower(name) = lower($1)"
    ))
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    if id.is_none() {
        tracing::warn!(%table, %name, "Unknown reference, product left without it");
    }
    Ok(id)
}

async fn load(conn: &mut PgConnection, seed: &CatalogSeed) -> Result<SeedSummary, sqlx::Error> {
    let mut summary = SeedSummary::default();

    let categories = upsert_named(conn, "category", &seed.categories).await?;
    summary.categories = seed.categories.len() as u64;
    let brands = upsert_named(conn, "brand", &seed.brands).await?;
    summary.brands = seed.brands.len() as u64;

    for method in &seed.shipping_methods {
        summary.shipping_methods += sqlx::query(
            r"
            INSERT INTO shop.shipping_method (name, fee, estimated_days, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET fee = EXCLUDED.fee,
                estimated_days = EXCLUDED.estimated_days,
                description = EXCLUDED.description
            ",
        )
        .bind(method.name.trim())
        .bind(method.fee)
        .bind(method.estimated_days)
        .bind(method.description.as_deref())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }

    for coupon in &seed.coupons {
        summary.coupons += sqlx::query(
            r"
            INSERT INTO shop.coupon
                (code, discount_percent, discount_amount, min_order_total,
                 starts_at, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO UPDATE
            SET discount_percent = EXCLUDED.discount_percent,
                discount_amount = EXCLUDED.discount_amount,
                min_order_total = EXCLUDED.min_order_total,
                starts_at = EXCLUDED.starts_at,
                expires_at = EXCLUDED.expires_at,
                is_active = EXCLUDED.is_active
            ",
        )
        .bind(coupon.code.trim().to_uppercase())
        .bind(coupon.discount_percent)
        .bind(coupon.discount_amount)
        .bind(coupon.min_order_total)
        .bind(coupon.starts_at)
        .bind(coupon.expires_at)
        .bind(coupon.is_active)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }

    for product in &seed.products {
        let category_id = resolve(conn, "category", &categories, product.category.as_deref()).await?;
        let brand_id = resolve(conn, "brand", &brands, product.brand.as_deref()).await?;

        let inserted = sqlx::query(
            r"
            INSERT INTO shop.product
                (name, description, price, promo_price, stock, image_url, category_id, brand_id)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (SELECT 1 FROM shop.product WHERE lower(name) = lower($1))
            ",
        )
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.promo_price)
        .bind(product.stock)
        .bind(product.image_url.as_deref())
        .bind(category_id)
        .bind(brand_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            summary.products_skipped += 1;
        } else {
            summary.products_inserted += 1;
        }
    }

    Ok(summary)
}

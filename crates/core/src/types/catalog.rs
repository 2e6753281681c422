//! Catalog query parameters: sort keys and price ranges.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl ProductSort {
    /// Parse a query-string sort key. Unknown keys fall back to the default.
    #[must_use]
    pub fn from_query(key: Option<&str>) -> Self {
        key.and_then(|k| k.parse().ok()).unwrap_or_default()
    }

    /// SQL `ORDER BY` fragment for this sort. Never built from user input.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "p.name ASC, p.id ASC",
            Self::NameDesc => "p.name DESC, p.id DESC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::Newest => "p.created_at DESC, p.id DESC",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "newest" => Ok(Self::Newest),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

/// Inclusive list-price bounds parsed from a `"min-max"` string.
///
/// Bounds are kept in the order given, so a reversed range such as
/// `"500-100"` matches no product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Parse `"min-max"`. Anything malformed yields `None` and the filter is
    /// simply not applied.
    ///
    /// ```
    /// use pawmarket_core::PriceRange;
    ///
    /// let range = PriceRange::parse("100-500").unwrap();
    /// assert_eq!(range.min.to_string(), "100");
    /// assert!(PriceRange::parse("cheap").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (min, max) = raw.trim().split_once('-')?;
        let min: Decimal = min.trim().parse().ok()?;
        let max: Decimal = max.trim().parse().ok()?;
        if min.is_sign_negative() || max.is_sign_negative() {
            return None;
        }
        Some(Self { min, max })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_query() {
        assert_eq!(ProductSort::from_query(None), ProductSort::NameAsc);
        assert_eq!(ProductSort::from_query(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_query(Some("newest")), ProductSort::Newest);
        assert_eq!(ProductSort::from_query(Some("random")), ProductSort::NameAsc);
    }

    #[test]
    fn test_price_range_parse() {
        let r = PriceRange::parse(" 0 - 250.5 ").unwrap();
        assert_eq!(r.min, Decimal::ZERO);
        assert_eq!(r.max, Decimal::new(2505, 1));
    }

    #[test]
    fn test_price_range_reversed_is_kept() {
        let r = PriceRange::parse("500-100").unwrap();
        assert_eq!(r.min, Decimal::from(500));
        assert_eq!(r.max, Decimal::from(100));
        assert!(r.min > r.max);
    }

    #[test]
    fn test_price_range_malformed_is_ignored() {
        assert!(PriceRange::parse("").is_none());
        assert!(PriceRange::parse("100").is_none());
        assert!(PriceRange::parse("abc-200").is_none());
        assert!(PriceRange::parse("100-200-300").is_none());
        assert!(PriceRange::parse("100--5").is_none());
    }
}

//! Province/district/ward lookup against the public administrative-units API.
//!
//! Checkout only needs by-code resolution: the province by code and the
//! district with its wards (`depth=2`). Responses are cached for 24 hours.
//! The API answers an unknown code with `404` or an empty JSON array; both
//! are reported as "not found".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::LocationApiConfig;

/// Cache lifetime for lookups.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors from the location API.
#[derive(Debug, Error)]
pub enum LocationError {
    /// Transport failure or timeout.
    #[error("location API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected status code.
    #[error("location API returned {0}")]
    Status(u16),

    /// Body did not match the expected shape.
    #[error("invalid location API response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A ward (commune level).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Ward {
    pub code: u32,
    pub name: String,
}

/// A district with its wards.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct District {
    pub code: u32,
    pub name: String,
    #[serde(default)]
    pub province_code: Option<u32>,
    #[serde(default)]
    pub wards: Vec<Ward>,
}

impl District {
    /// Find a ward of this district by its code string.
    #[must_use]
    pub fn ward(&self, code: &str) -> Option<&Ward> {
        let code = code.trim().parse::<u32>().ok()?;
        self.wards.iter().find(|w| w.code == code)
    }
}

/// A province (top level).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Province {
    pub code: u32,
    pub name: String,
}

/// Location lookup port used by checkout.
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// Province by code, `None` if unknown.
    async fn province(&self, code: &str) -> Result<Option<Province>, LocationError>;

    /// District by code including its wards, `None` if unknown.
    async fn district(&self, code: &str) -> Result<Option<District>, LocationError>;
}

#[derive(Clone)]
enum Cached {
    Province(Option<Province>),
    District(Option<District>),
}

/// `reqwest` client for the location API with an in-memory cache.
#[derive(Clone)]
pub struct HttpLocationClient {
    inner: Arc<HttpLocationClientInner>,
}

struct HttpLocationClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, Cached>,
}

impl HttpLocationClient {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &LocationApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let cache = Cache::builder()
            .max_capacity(2_000)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(HttpLocationClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, LocationError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self
            .inner
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Location API returned non-success status");
            return Err(LocationError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_lookup_body(&body)
    }
}

/// Decode a lookup body, treating an empty JSON array as "not found".
fn parse_lookup_body<T: serde::de::DeserializeOwned>(
    body: &str,
) -> Result<Option<T>, LocationError> {
    if body.trim() == "[]" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

#[async_trait]
impl LocationLookup for HttpLocationClient {
    #[instrument(skip(self))]
    async fn province(&self, code: &str) -> Result<Option<Province>, LocationError> {
        let Ok(code) = code.parse::<u32>() else {
            return Ok(None);
        };
        let key = format!("province:{code}");
        if let Some(Cached::Province(hit)) = self.inner.cache.get(&key).await {
            return Ok(hit);
        }
        let province: Option<Province> = self.fetch(&format!("/p/{code}")).await?;
        self.inner
            .cache
            .insert(key, Cached::Province(province.clone()))
            .await;
        Ok(province)
    }

    #[instrument(skip(self))]
    async fn district(&self, code: &str) -> Result<Option<District>, LocationError> {
        let Ok(code) = code.parse::<u32>() else {
            return Ok(None);
        };
        let key = format!("district:{code}");
        if let Some(Cached::District(hit)) = self.inner.cache.get(&key).await {
            return Ok(hit);
        }
        let district: Option<District> = self.fetch(&format!("/d/{code}?depth=2")).await?;
        self.inner
            .cache
            .insert(key, Cached::District(district.clone()))
            .await;
        Ok(district)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DISTRICT_JSON: &str = r#"{
        "name": "Quận Ba Đình",
        "code": 1,
        "division_type": "quận",
        "codename": "quan_ba_dinh",
        "province_code": 1,
        "wards": [
            {"name": "Phường Phúc Xá", "code": 1, "division_type": "phường", "codename": "phuong_phuc_xa", "district_code": 1},
            {"name": "Phường Trúc Bạch", "code": 4, "division_type": "phường", "codename": "phuong_truc_bach", "district_code": 1}
        ]
    }"#;

    #[test]
    fn test_parse_district_with_wards() {
        let district: District = parse_lookup_body(DISTRICT_JSON).unwrap().unwrap();
        assert_eq!(district.name, "Quận Ba Đình");
        assert_eq!(district.wards.len(), 2);
        assert_eq!(district.province_code, Some(1));
        assert_eq!(district.ward("4").map(|w| w.name.as_str()), Some("Phường Trúc Bạch"));
        assert!(district.ward("7").is_none());
        assert!(district.ward("abc").is_none());
    }

    #[tokio::test]
    async fn test_non_numeric_code_never_hits_the_api() {
        let client = HttpLocationClient::new(&LocationApiConfig {
            base_url: "http://127.0.0.1:9".to_owned(),
            timeout: std::time::Duration::from_millis(50),
        })
        .unwrap();

        assert!(client.province("1/../../x").await.unwrap().is_none());
        assert!(client.district("1?depth=3").await.unwrap().is_none());
        assert_eq!(client.inner.cache.entry_count(), 0);
    }

    #[test]
    fn test_empty_array_is_not_found() {
        let province: Option<Province> = parse_lookup_body(" [] ").unwrap();
        assert!(province.is_none());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result: Result<Option<Province>, _> = parse_lookup_body("<html>");
        assert!(matches!(result, Err(LocationError::Parse(_))));
    }
}

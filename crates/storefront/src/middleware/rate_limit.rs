//! Rate limiting for the auth endpoints (`governor` via `tower_governor`).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers checked for the client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// Key extractor that reads the client IP from proxy headers.
///
/// `X-Forwarded-For` contributes its first (client) entry. Without any proxy
/// header the TCP peer address is used, which needs the server to be started
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        CLIENT_IP_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
            .find_map(|value| value.split(',').next()?.trim().parse::<IpAddr>().ok())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for login and registration: one token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Never in practice: both quota values are non-zero constants.
#[must_use]
#[allow(clippy::expect_used)]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("non-zero quota is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tower::ServiceExt;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn peer() -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 51234)))
    }

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap_or_default()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        let ip = ProxyIpKeyExtractor.extract(&req).ok();
        assert_eq!(ip, "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let req = request(&[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        let ip = ProxyIpKeyExtractor.extract(&req).ok();
        assert_eq!(ip, "198.51.100.4".parse().ok());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[]);
        req.extensions_mut().insert(peer());
        let ip = ProxyIpKeyExtractor.extract(&req).ok();
        assert_eq!(ip, "192.0.2.10".parse().ok());
    }

    #[test]
    fn test_header_wins_over_peer_address() {
        let mut req = request(&[("x-real-ip", "198.51.100.9")]);
        req.extensions_mut().insert(peer());
        let ip = ProxyIpKeyExtractor.extract(&req).ok();
        assert_eq!(ip, "198.51.100.9".parse().ok());
    }

    #[test]
    fn test_no_headers_and_no_peer_is_error() {
        assert!(ProxyIpKeyExtractor.extract(&request(&[])).is_err());
    }

    #[tokio::test]
    async fn test_direct_client_is_limited_not_rejected() {
        let app = Router::new()
            .route("/auth/login", post(|| async { "ok" }))
            .layer(auth_rate_limiter());

        let mut statuses = Vec::new();
        for _ in 0..6 {
            let mut req = Request::builder()
                .method("POST")
                .uri("/auth/login")
                .body(Body::empty())
                .unwrap_or_default();
            req.extensions_mut().insert(peer());
            let response = app.clone().oneshot(req).await;
            statuses.push(response.map(|r| r.status()).unwrap_or(StatusCode::IM_A_TEAPOT));
        }

        assert_eq!(&statuses[..5], &[StatusCode::OK; 5]);
        assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
    }
}

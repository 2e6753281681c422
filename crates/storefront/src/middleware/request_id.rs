//! Request ID middleware for tracing and correlation.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID that is accepted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Use the upstream `x-request-id` if it is sane, otherwise a fresh UUID v4.
fn request_id(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Tag each request with an ID.
///
/// The ID is recorded on the current span, set as a Sentry tag and echoed in
/// the response headers.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id(&request);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn with_header(value: &str) -> Request {
        Request::builder()
            .header(REQUEST_ID_HEADER, value)
            .body(Body::empty())
            .unwrap_or_default()
    }

    #[test]
    fn test_upstream_id_kept() {
        assert_eq!(request_id(&with_header("cf-ray.8a1b2c")), "cf-ray.8a1b2c");
    }

    #[test]
    fn test_bad_upstream_id_replaced() {
        let id = request_id(&with_header("<script>"));
        assert!(Uuid::parse_str(&id).is_ok());

        let id = request_id(&with_header(&"a".repeat(200)));
        assert!(Uuid::parse_str(&id).is_ok());
    }
}

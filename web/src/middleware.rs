//! Request tracing middleware.

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use tower_http::trace::TraceLayer;

/// Install the request tracing layer on a router.
///
/// Every request gets an `http_request` span carrying method, path and the
/// caller's correlation id (when present), so service logs can be joined
/// across the gateway boundary.
#[must_use]
pub fn with_tracing(router: Router) -> Router {
    router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let correlation_id = request
            .headers()
            .get("X-Correlation-ID")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            correlation_id,
        )
    }))
}

//! Access logging
//!
//! One debug record per request: method, request URI, status and response
//! size. The layer observes the response and hands it back untouched.

use axum::{
    body::{Body, HttpBody},
    http::{header::CONTENT_LENGTH, Request},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tracing::debug;

/// Wrap every route of `router` with the access logger
pub fn with_access_log(router: Router) -> Router {
    router.layer(middleware::from_fn(access_log_middleware))
}

async fn access_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    debug!(
        status = response.status().as_u16(),
        res_size = response_size(&response),
        "{} {}",
        method,
        uri
    );

    response
}

/// Body size from `Content-Length`, else the body's exact size hint, else 0
fn response_size(response: &Response) -> u64 {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0)
}

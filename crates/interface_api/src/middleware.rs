//! API middleware

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use chrono::Utc;
use tracing::{info, warn};

/// Header set by `SetRequestIdLayer` on every request
pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs every request with its request id, status and latency
///
/// Client errors are logged at `warn` so rejected registrations stand out;
/// server errors are already logged by `ApiError`.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let started = Utc::now();
    let response = next.run(request).await;
    let elapsed_ms = (Utc::now() - started).num_milliseconds();
    let status = response.status().as_u16();

    if response.status().is_client_error() {
        warn!(%method, %path, %request_id, status, elapsed_ms, "Request rejected");
    } else {
        info!(%method, %path, %request_id, status, elapsed_ms, "Request handled");
    }

    response
}

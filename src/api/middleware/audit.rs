//! Audit logging middleware.
//!
//! Logs every API request with the claimed user id, method, path, and
//! response status. Runs outermost, so rejected callers are logged too.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::BHW_ID_HEADER;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user_id = req
        .headers()
        .get(BHW_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, %user_id, status, elapsed_ms, "API access");
    } else {
        tracing::info!(%method, %path, %user_id, status, elapsed_ms, "API access");
    }
    response
}

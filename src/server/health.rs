//! Health check endpoint for liveness probes.
//!
//! Returns 200 OK if the server is running. The hosting platform probes
//! either `GET /health` or `GET /?health=check` (the legacy query-parameter
//! form handled in [`super::console`]); both answer without touching the
//! store client, the dispatch client, or any cache state.

use axum::http::StatusCode;

/// Health check handler.
///
/// Returns 200 OK with the text "OK". This simple endpoint is used
/// to verify that the server is running and accepting connections.
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

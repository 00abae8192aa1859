//! CSV export of the current snapshot.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::warn;

use super::AppState;

/// Export handler.
///
/// Serves the current snapshot as a CSV download named with an embedded UTC
/// timestamp (`snapshot_YYYYMMDD_HHMMSS.csv`). The read may be served from
/// cache; a failed read degrades to an empty file rather than an error
/// page, matching the store client's degraded-read contract.
pub async fn export_handler(State(state): State<AppState>) -> Response {
    let (snapshot, error) = state.cache().fetch_degraded().await;
    if let Some(error) = &error {
        warn!(error = %error, "export served from a degraded read");
    }

    let filename = format!("snapshot_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
    let headers = [
        (
            header::CONTENT_TYPE,
            "text/csv; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    (headers, snapshot.to_csv()).into_response()
}

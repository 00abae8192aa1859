//! The run endpoint: validate, dispatch, wait, render.
//!
//! One POST drives the whole submit -> poll -> show flow on the request
//! task. The row-count baseline is snapshotted before dispatch; dispatch is
//! fail-soft per handle; polling only happens when at least one dispatch
//! was accepted (a fully failed run has nothing to wait for). The three
//! terminal wait outcomes keep their own user-facing messages - a timeout
//! must never read like a dispatch failure or a store outage.

use std::time::Duration;

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::dispatch::{DispatchReport, any_succeeded, run_batch};
use crate::poll::{LogProgress, PollOutcome, await_growth};
use crate::sheet::{SheetError, SheetSnapshot};
use crate::types::ScrapeRequest;

use super::AppState;
use super::pages;

/// The submitted form: raw usernames (one per line) and a post count.
#[derive(Debug, Deserialize)]
pub struct RunForm {
    #[serde(default)]
    pub usernames: String,
    pub posts: u32,
}

/// Run handler.
///
/// # Request
///
/// - Method: POST, url-encoded form with `usernames` and `posts`
///
/// # Response
///
/// - 200 OK: the run was dispatched; body shows per-handle results, the
///   wait outcome, and the current table
/// - 422 Unprocessable Entity: validation failed; nothing was dispatched
pub async fn run_handler(State(state): State<AppState>, Form(form): Form<RunForm>) -> Response {
    let request = match ScrapeRequest::parse(&form.usernames, form.posts) {
        Ok(request) => request,
        Err(error) => {
            info!(error = %error, "run rejected by validation");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                pages::console(Some(&error.to_string())),
            )
                .into_response();
        }
    };

    // Baseline before dispatch; a failed read starts detection from zero
    // and the error is surfaced on the page.
    let (baseline_snapshot, baseline_error) = state.cache().fetch_degraded().await;
    let baseline = baseline_snapshot.len();

    info!(
        usernames = request.usernames().len(),
        posts = %request.posts(),
        baseline,
        "run started"
    );

    let reports = run_batch(state.dispatcher(), &request, state.settings().payload_shape).await;

    if !any_succeeded(&reports) {
        let page = render_results(
            &reports,
            None,
            baseline_error.as_ref(),
            &baseline_snapshot,
            state.settings().wait_timeout,
        );
        return (StatusCode::OK, page).into_response();
    }

    let outcome = await_growth(
        state.cache(),
        baseline,
        &state.poll_config(),
        &LogProgress,
    )
    .await;

    let snapshot = match &outcome {
        PollOutcome::Completed(snapshot) => snapshot.clone(),
        PollOutcome::TimedOut(snapshot) => snapshot.clone(),
        PollOutcome::ReadFailed { snapshot, .. } => snapshot.clone(),
    };

    let page = render_results(
        &reports,
        Some(&outcome),
        baseline_error.as_ref(),
        &snapshot,
        state.settings().wait_timeout,
    );
    (StatusCode::OK, page).into_response()
}

/// Renders the outcome page: dispatch results, wait outcome, table, export.
fn render_results(
    reports: &[DispatchReport],
    outcome: Option<&PollOutcome>,
    baseline_error: Option<&SheetError>,
    snapshot: &SheetSnapshot,
    wait_timeout: Duration,
) -> Html<String> {
    let mut body = String::new();

    let failures: Vec<&DispatchReport> =
        reports.iter().filter(|r| r.result.is_err()).collect();
    let accepted = reports.len() - failures.len();
    body.push_str(&format!(
        "<p>{accepted} of {} dispatch request(s) accepted.</p>\n",
        reports.len()
    ));

    if !failures.is_empty() {
        body.push_str("<ul class=\"error\">\n");
        for report in &failures {
            if let Err(error) = &report.result {
                body.push_str(&format!(
                    "<li>{}: {}</li>\n",
                    pages::escape(&report.subject),
                    pages::escape(&error.to_string())
                ));
            }
        }
        body.push_str("</ul>\n");
    }

    let banner = match outcome {
        Some(PollOutcome::Completed(_)) => {
            "<p class=\"success\">New rows arrived; the table below is current.</p>\n".to_string()
        }
        Some(PollOutcome::TimedOut(_)) => format!(
            "<p class=\"warning\">No new rows after {}s. The workflow may still be \
             running - check again in a few minutes.</p>\n",
            wait_timeout.as_secs()
        ),
        Some(PollOutcome::ReadFailed { error, .. }) => format!(
            "<p class=\"error\">The results store could not be read while waiting: {}</p>\n",
            pages::escape(&error.to_string())
        ),
        None => "<p class=\"error\">No dispatch was accepted; nothing to wait for.</p>\n"
            .to_string(),
    };
    body.push_str(&banner);

    if let Some(error) = baseline_error {
        body.push_str(&format!(
            "<p class=\"warning\">The baseline read failed ({}); new-row detection \
             started from zero.</p>\n",
            pages::escape(&error.to_string())
        ));
    }

    body.push_str(&pages::table(snapshot));
    body.push_str(
        "\n<p><a href=\"/export.csv\">Download CSV</a> &middot; <a href=\"/\">Back</a></p>",
    );

    pages::layout(&body)
}

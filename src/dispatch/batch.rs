//! Fail-soft batch dispatch.
//!
//! Each username in a run is attempted exactly once, in input order; a
//! failure is recorded and the loop moves on. Some handles succeeding while
//! others fail is a normal outcome, surfaced as a per-handle report list,
//! never as an aggregate abort.

use tracing::{info, warn};

use crate::types::{ScrapeRequest, Username};

use super::client::{Dispatch, DispatchError};
use super::contract::PayloadShape;

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// What was dispatched: a single handle, or the whole batch.
    pub subject: String,
    /// The result of the attempt.
    pub result: Result<(), DispatchError>,
}

impl DispatchReport {
    fn new(subject: impl Into<String>, result: Result<(), DispatchError>) -> Self {
        DispatchReport {
            subject: subject.into(),
            result,
        }
    }
}

/// Dispatches a validated run.
///
/// Under the single-username contract this is one request per handle, in
/// input order, continuing past failures; under the batch contract it is a
/// single request covering the whole run. Returns one report per request
/// made.
pub async fn run_batch(
    dispatcher: &dyn Dispatch,
    request: &ScrapeRequest,
    shape: PayloadShape,
) -> Vec<DispatchReport> {
    match shape {
        PayloadShape::Single => {
            let mut reports = Vec::with_capacity(request.usernames().len());
            for username in request.usernames() {
                let result = dispatcher
                    .send(std::slice::from_ref(username), request.posts())
                    .await;
                match &result {
                    Ok(()) => info!(username = %username, "dispatched"),
                    Err(error) => warn!(username = %username, error = %error, "dispatch failed"),
                }
                reports.push(DispatchReport::new(username.as_str(), result));
            }
            reports
        }
        PayloadShape::Batch => {
            let result = dispatcher.send(request.usernames(), request.posts()).await;
            let subject = request
                .usernames()
                .iter()
                .map(Username::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Err(error) = &result {
                warn!(error = %error, "batch dispatch failed");
            }
            vec![DispatchReport::new(subject, result)]
        }
    }
}

/// True if at least one dispatch in the run was accepted.
pub fn any_succeeded(reports: &[DispatchReport]) -> bool {
    reports.iter().any(|r| r.result.is_ok())
}

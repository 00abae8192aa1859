//! HTTP server for the console.
//!
//! This module implements the HTTP surface that:
//! - Renders the submission form and drives the dispatch -> wait -> show flow
//! - Serves the current snapshot as a timestamped CSV download
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `GET /` - Console page (`?health=check` short-circuits to a plain `OK`)
//! - `POST /run` - Validates and dispatches a run, waits for new rows
//! - `GET /export.csv` - Downloads the current snapshot as CSV
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod console;
pub mod export;
pub mod health;
pub mod pages;
pub mod run;

pub use console::console_handler;
pub use export::export_handler;
pub use health::health_handler;
pub use run::run_handler;

use crate::config::Settings;
use crate::dispatch::Dispatch;
use crate::poll::PollConfig;
use crate::sheet::{RowSource, SnapshotCache};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. All mutable
/// state lives inside the snapshot cache; there are no ambient globals -
/// the poller and dispatch layer receive what they need explicitly,
/// per request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Resolved application settings.
    settings: Settings,

    /// TTL-memoized view of the results store.
    cache: SnapshotCache,

    /// Outbound webhook client.
    dispatcher: Arc<dyn Dispatch>,
}

impl AppState {
    /// Creates a new `AppState` over the given collaborators.
    ///
    /// The snapshot cache is built here so every handler shares one
    /// memoized view with the TTL taken from `settings`.
    pub fn new(
        settings: Settings,
        source: Arc<dyn RowSource>,
        dispatcher: Arc<dyn Dispatch>,
    ) -> Self {
        let cache = SnapshotCache::new(source, settings.snapshot_ttl);
        AppState {
            inner: Arc::new(AppStateInner {
                settings,
                cache,
                dispatcher,
            }),
        }
    }

    /// Returns the resolved settings.
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Returns the shared snapshot cache.
    pub fn cache(&self) -> &SnapshotCache {
        &self.inner.cache
    }

    /// Returns the dispatch client.
    pub fn dispatcher(&self) -> &dyn Dispatch {
        self.inner.dispatcher.as_ref()
    }

    /// Builds the poll configuration for one run.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.inner.settings.poll_interval,
            timeout: self.inner.settings.wait_timeout,
            ..PollConfig::default()
        }
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(console_handler))
        .route("/run", post(run_handler))
        .route("/export.csv", get(export_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

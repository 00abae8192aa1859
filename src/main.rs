use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridwatch::config::Settings;
use gridwatch::dispatch::DispatchClient;
use gridwatch::server::{AppState, build_router};
use gridwatch::sheet::SheetsClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Fail closed: no partial operation without the full configuration.
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The dispatch client carries the configured request timeout; sheet
    // reads keep the HTTP client's defaults.
    let dispatch_http = match reqwest::Client::builder()
        .timeout(settings.dispatch_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build dispatch HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    let sheets_http = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build sheets HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let source = Arc::new(SheetsClient::new(
        sheets_http,
        settings.sheet_id.clone(),
        settings.sheet_range.clone(),
        settings.sheets_api_key.clone(),
    ));
    let dispatcher = Arc::new(DispatchClient::new(
        dispatch_http,
        settings.webhook_url.clone(),
        settings.webhook_api_key.clone(),
        settings.auth_scheme,
        settings.payload_shape,
        settings.dispatch_timeout,
    ));

    let addr = settings.bind_addr;
    let app = build_router(AppState::new(settings, source, dispatcher));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

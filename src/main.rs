use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use relay_guard::config::LogFormat;
use relay_guard::{AppState, Config, build_router, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Config is loaded before tracing so its log settings apply; a load error
    // is reported once the fallback subscriber is up.
    let config = Config::from_env();
    match &config {
        Ok(config) => init_tracing(config.log_filter(), config.log_format),
        Err(_) => init_tracing(EnvFilter::new("info"), LogFormat::default()),
    }

    info!("Starting relay_guard v{}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

fn init_tracing(filter: EnvFilter, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_thread_ids(true).init(),
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: relay_guard::AppResult<Config>) -> Result<(), exitcode::ExitCode> {
    let config = config.map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        allowed_origins = config.allowed_origins.len(),
        max_requests = config.rate_limit_max_requests,
        window_ms = config.rate_limit_window.as_millis() as u64,
        "Configuration loaded"
    );

    if config.allowed_origins.is_empty() {
        warn!("ALLOWED_ORIGINS is empty; every relay request will be rejected");
    }
    if !config.tokens_enabled() {
        warn!("JWT_SECRET not set; token issuance and bearer verification will fail");
    }
    if config.assemblyai_api_key.is_none() {
        warn!("ASSEMBLYAI_API_KEY not set; /api/assemblyai will return 500");
    }
    if config.deepl_api_key.is_none() {
        warn!("DEEPL_API_KEY not set; /api/deepl will return 500");
    }

    // Metrics exporter (optional)
    if let Some(metrics_addr) = config.metrics_addr() {
        relay_guard::metrics::try_init_metrics(metrics_addr);
    }

    // Build application state and router
    let state = AppState::new(config.clone()).map_err(|e| {
        error!("Failed to build application state: {e}");
        exitcode::CONFIG
    })?;
    let app = build_router(state.clone());

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /health          - Health check");
    info!("  POST /api/auth/token  - Issue session token");
    info!("  POST /api/assemblyai  - Transcription socket URL");
    info!("  POST /api/deepl       - Translate text");

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    // Gracefully shutdown background tasks
    info!("HTTP server stopped, shutting down background tasks...");
    state.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}

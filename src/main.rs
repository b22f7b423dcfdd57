// =============================================================================
// Aurora TA — Main Entry Point
// =============================================================================
//
// Serves the analysis engine over HTTP. The active `AnalysisConfig` comes from
// `AURORA_CONFIG` when set (and is persisted back there on `PUT /config`),
// otherwise from built-in defaults.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aurora_ta::analysis_config::AnalysisConfig;
use aurora_ta::api;
use aurora_ta::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Aurora TA — Starting Up                          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    // ── 2. Analysis config ───────────────────────────────────────────────
    let config_path = std::env::var("AURORA_CONFIG").ok().map(PathBuf::from);
    let config = match &config_path {
        Some(path) if path.exists() => AnalysisConfig::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AnalysisConfig::default()
        }),
        _ => AnalysisConfig::default(),
    };
    config.validate().context("analysis config is invalid")?;
    info!(
        timeframes = ?config.default_timeframes,
        min_bars = config.min_bars,
        "Analysis config ready"
    );

    let state = Arc::new(AppState::new(config, config_path));

    // ── 3. Start the API server ──────────────────────────────────────────
    let bind_addr = std::env::var("AURORA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, api::rest::router(state))
        .await
        .context("API server failed")?;
    Ok(())
}

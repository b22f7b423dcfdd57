// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Analysis is CPU-bound and runs on the
// blocking pool via `spawn_blocking`; handlers clone the active config out of
// `AppState` first. Every analysis request carries a uuid request id in its
// tracing span.
//
// A rejected request (malformed bars, invalid parameters) answers
// `422 {"error": ...}`. Unavailable timeframes are not errors; they are part
// of the report.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis_config::AnalysisConfig;
use crate::app_state::{AppState, StatusSnapshot};
use crate::error::AnalysisError;
use crate::market_data::{Bar, InMemorySource, SeriesMeta, SeriesStore, Timeframe};
use crate::multi_timeframe::MultiTimeframeCoordinator;
use crate::replay::{walk_forward, ReplayPoint};
use crate::report::AnalysisReport;
use crate::scanner::{scan, ScanEntry, ScanResult};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/config", get(get_config).put(put_config))
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/scan", post(scan_symbols))
        .route("/api/v1/replay", post(replay))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn internal(err: tokio::task::JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("analysis task failed: {err}"),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: StatusSnapshot,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        stats: state.snapshot(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Serialize)]
struct ConfigResponse {
    version: u64,
    config: AnalysisConfig,
}

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ConfigResponse {
        version: state.snapshot().config_version,
        config: state.config(),
    })
}

async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<AnalysisConfig>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let version = state.replace_config(config.clone()).map_err(|e| {
        warn!(error = %e, "config update rejected");
        ApiError::from(e)
    })?;
    Ok(Json(ConfigResponse { version, config }))
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    symbol: String,
    #[serde(default)]
    timezone: Option<String>,
    series: BTreeMap<Timeframe, Vec<Bar>>,
    /// Empty means the configured default timeframes.
    #[serde(default)]
    timeframes: Vec<Timeframe>,
}

impl AnalyzeRequest {
    fn source(&self) -> InMemorySource {
        let mut source = InMemorySource::new(self.symbol.clone());
        if let Some(tz) = &self.timezone {
            source = source.with_timezone(tz.clone());
        }
        for (tf, bars) in &self.series {
            source.insert(*tf, bars.clone());
        }
        source
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let request_no = state.record_request();
    let span = info_span!("analyze", request_id = %Uuid::new_v4(), request_no, symbol = %request.symbol);
    let config = state.config();

    let worker_span = span.clone();
    let report = tokio::task::spawn_blocking(move || {
        let _entered = worker_span.enter();
        let coordinator = MultiTimeframeCoordinator::new(&config)?;
        coordinator.analyze(&request.symbol, &request.timeframes, &request.source())
    })
    .instrument(span.clone())
    .await
    .map_err(ApiError::internal)?;

    let _entered = span.enter();
    match report {
        Ok(report) => {
            info!(recommendation = %report.signal.recommendation, "analysis served");
            Ok(Json(report))
        }
        Err(err) => {
            warn!(error = %err, "analysis rejected");
            Err(err.into())
        }
    }
}

// =============================================================================
// Scan
// =============================================================================

#[derive(Debug, Deserialize)]
struct ScanRequest {
    entries: Vec<ScanEntry>,
}

#[derive(Serialize)]
struct ScanResponse {
    results: Vec<ScanResult>,
}

async fn scan_symbols(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let request_no = state.record_request();
    let span = info_span!("scan", request_id = %Uuid::new_v4(), request_no, entries = request.entries.len());
    let config = state.config();

    let worker_span = span.clone();
    let results = tokio::task::spawn_blocking(move || {
        let _entered = worker_span.enter();
        scan(&request.entries, &config)
    })
    .instrument(span)
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(ScanResponse { results }))
}

// =============================================================================
// Replay
// =============================================================================

#[derive(Debug, Deserialize)]
struct ReplayRequest {
    symbol: String,
    interval: Timeframe,
    #[serde(default)]
    timezone: Option<String>,
    bars: Vec<Bar>,
    #[serde(default)]
    warmup: usize,
    #[serde(default = "default_step")]
    step: usize,
}

fn default_step() -> usize {
    1
}

#[derive(Serialize)]
struct ReplayResponse {
    symbol: String,
    points: Vec<ReplayPoint>,
}

async fn replay(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReplayRequest>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let request_no = state.record_request();
    let span = info_span!("replay", request_id = %Uuid::new_v4(), request_no, symbol = %request.symbol);
    let config = state.config();

    let worker_span = span.clone();
    let points = tokio::task::spawn_blocking(move || {
        let _entered = worker_span.enter();
        let mut meta = SeriesMeta::new(request.symbol.clone(), request.interval);
        if let Some(tz) = &request.timezone {
            meta = meta.with_timezone(tz.clone());
        }
        let store = SeriesStore::with_min_bars(meta, request.bars, 1)?;
        walk_forward(&store, &config, request.warmup, request.step).map(|points| (request.symbol, points))
    })
    .instrument(span)
    .await
    .map_err(ApiError::internal)?;

    let (symbol, points) = points?;
    Ok(Json(ReplayResponse { symbol, points }))
}

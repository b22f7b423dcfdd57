// =============================================================================
// Application State — shared by the HTTP handlers
// =============================================================================
//
// The analysis core is stateless; the service only shares:
//   - the active `AnalysisConfig` (parking_lot::RwLock, replaced wholesale)
//   - atomic counters for requests served and config revisions
//
// Handlers clone the config out of the lock before analysing so no lock is
// held across the blocking analysis task.
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis_config::AnalysisConfig;
use crate::error::Result;

pub struct AppState {
    config: RwLock<AnalysisConfig>,
    /// Where `PUT /config` persists the config; `None` keeps it in memory.
    config_path: Option<PathBuf>,
    config_version: AtomicU64,
    requests_served: AtomicU64,
    start_time: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub config_version: u64,
    pub requests_served: u64,
    pub uptime_secs: u64,
}

impl AppState {
    pub fn new(config: AnalysisConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config: RwLock::new(config),
            config_path,
            config_version: AtomicU64::new(1),
            requests_served: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> AnalysisConfig {
        self.config.read().clone()
    }

    /// Validate and install a new configuration, then persist it
    /// (best-effort). Returns the new config version.
    pub fn replace_config(&self, config: AnalysisConfig) -> Result<u64> {
        config.validate()?;
        *self.config.write() = config.clone();
        let version = self.config_version.fetch_add(1, Ordering::SeqCst) + 1;
        info!(version, "analysis config replaced");

        if let Some(path) = &self.config_path {
            if let Err(e) = config.save(path) {
                warn!(error = %e, path = %path.display(), "failed to persist analysis config");
            }
        }
        Ok(version)
    }

    /// Count a served request; returns its sequence number.
    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            config_version: self.config_version.load(Ordering::SeqCst),
            requests_served: self.requests_served.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

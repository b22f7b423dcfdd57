// =============================================================================
// Point-in-time Replay
// =============================================================================
//
// Walks a series forward, running the single-timeframe pipeline on each
// growing prefix. The verdict at bar `i` is computed from bars `0..=i` only,
// so replay output never looks ahead.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis_config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::market_data::SeriesStore;
use crate::pipeline::Pipeline;
use crate::types::Recommendation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayPoint {
    pub index: usize,
    pub timestamp: i64,
    pub score: f64,
    pub recommendation: Recommendation,
    pub insufficient_data: bool,
}

/// Verdicts at bars `warmup - 1, warmup - 1 + step, ...` up to the last bar.
pub fn walk_forward(store: &SeriesStore, config: &AnalysisConfig, warmup: usize, step: usize) -> Result<Vec<ReplayPoint>> {
    if step == 0 {
        return Err(AnalysisError::invalid("step", "must be greater than zero"));
    }
    config.validate()?;
    let first = warmup.max(config.min_bars).max(1);
    if store.len() < first {
        return Err(AnalysisError::InsufficientData {
            required: first,
            got: store.len(),
        });
    }

    let pipeline = Pipeline::new(config);
    let ends: Vec<usize> = (first..=store.len()).step_by(step).collect();
    let points = ends
        .par_iter()
        .map(|&end| {
            let prefix = store.slice(0..end)?;
            let analysis = pipeline.run(&prefix);
            Ok(ReplayPoint {
                index: end - 1,
                timestamp: analysis.last_timestamp,
                score: analysis.signal.score,
                recommendation: analysis.signal.recommendation,
                insufficient_data: analysis.signal.insufficient_data,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(series = %store.meta(), points = points.len(), step, "walk-forward replay complete");
    Ok(points)
}

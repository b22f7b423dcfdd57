// =============================================================================
// Scanner — rank many symbols by composite score
// =============================================================================

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis_config::AnalysisConfig;
use crate::error::Result;
use crate::market_data::{Bar, SeriesMeta, SeriesStore, Timeframe};
use crate::pipeline::Pipeline;
use crate::regime::MarketRegime;
use crate::types::Recommendation;

/// One symbol's bars for the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEntry {
    pub symbol: String,
    pub interval: Timeframe,
    #[serde(default)]
    pub timezone: Option<String>,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub interval: Timeframe,
    pub score: Option<f64>,
    pub recommendation: Option<Recommendation>,
    pub regime: Option<MarketRegime>,
    pub last_close: Option<f64>,
    /// Why the symbol could not be analysed.
    pub error: Option<String>,
}

/// Analyse every entry in parallel. Results are ordered by descending score;
/// rejected entries follow, in input order. An invalid config rejects the
/// whole scan.
pub fn scan(entries: &[ScanEntry], config: &AnalysisConfig) -> Result<Vec<ScanResult>> {
    config.validate()?;
    let pipeline = Pipeline::new(config);
    let mut results: Vec<ScanResult> = entries.par_iter().map(|entry| scan_one(entry, &pipeline)).collect();

    results.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    info!(
        entries = entries.len(),
        rejected = results.iter().filter(|r| r.error.is_some()).count(),
        "scan complete"
    );
    Ok(results)
}

fn scan_one(entry: &ScanEntry, pipeline: &Pipeline) -> ScanResult {
    let mut meta = SeriesMeta::new(entry.symbol.clone(), entry.interval);
    if let Some(tz) = &entry.timezone {
        meta = meta.with_timezone(tz.clone());
    }
    let rejected = |error: String| ScanResult {
        symbol: entry.symbol.clone(),
        interval: entry.interval,
        score: None,
        recommendation: None,
        regime: None,
        last_close: None,
        error: Some(error),
    };

    match SeriesStore::with_min_bars(meta, entry.bars.clone(), pipeline.config().min_bars) {
        Ok(store) => {
            let analysis = pipeline.run(&store);
            ScanResult {
                symbol: entry.symbol.clone(),
                interval: entry.interval,
                score: Some(analysis.signal.score),
                recommendation: Some(analysis.signal.recommendation),
                regime: analysis.regime.map(|r| r.regime),
                last_close: Some(analysis.last_close),
                error: None,
            }
        }
        Err(err) => rejected(err.to_string()),
    }
}

// =============================================================================
// Multi-Timeframe Coordinator
// =============================================================================
//
// For each requested timeframe:
//   1. source bars for exactly that timeframe, if the source has them
//   2. otherwise resample the finest source timeframe that evenly divides it
//   3. otherwise the timeframe is unavailable
//
// Every source series is validated up front: a malformed bar anywhere rejects
// the whole request. A timeframe that ends up with fewer than `min_bars` bars
// is unavailable, not an error. Timeframes run in parallel on rayon; nothing
// crosses between them until the cross-timeframe signal is combined.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis_config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::market_data::{parse_timezone, BarSource, SeriesMeta, SeriesStore, Timeframe};
use crate::pipeline::Pipeline;
use crate::report::{Alignment, AnalysisReport, TimeframeResult};

#[derive(Debug, Clone)]
pub struct MultiTimeframeCoordinator {
    pipeline: Pipeline,
}

impl MultiTimeframeCoordinator {
    /// Rejects an invalid configuration before any analysis runs.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pipeline: Pipeline::new(config),
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Analyse `symbol` on `timeframes` (the configured defaults when empty).
    pub fn analyze(&self, symbol: &str, timeframes: &[Timeframe], source: &dyn BarSource) -> Result<AnalysisReport> {
        let config = self.pipeline.config();
        let requested: BTreeSet<Timeframe> = if timeframes.is_empty() {
            config.default_timeframes.iter().copied().collect()
        } else {
            timeframes.iter().copied().collect()
        };

        let timezone = source.timezone(symbol);
        parse_timezone(&timezone)?;
        let stores = load_source(symbol, &timezone, source)?;

        info!(
            symbol,
            requested = requested.len(),
            source_timeframes = stores.len(),
            "multi-timeframe analysis started"
        );

        let results: BTreeMap<Timeframe, TimeframeResult> = requested
            .par_iter()
            .map(|&tf| {
                let result = match resolve(&stores, tf, config.min_bars) {
                    Ok(store) => TimeframeResult::Ready(Box::new(self.pipeline.run(&store))),
                    Err(err) => {
                        warn!(symbol, timeframe = %tf, error = %err, "timeframe unavailable");
                        TimeframeResult::Unavailable { reason: err.to_string() }
                    }
                };
                (tf, result)
            })
            .collect();

        let ready: Vec<_> = results
            .iter()
            .filter_map(|(tf, r)| r.analysis().map(|a| (*tf, &a.signal)))
            .collect();
        let alignment = Alignment::from_directions(
            ready.iter().filter(|(_, v)| !v.insufficient_data).map(|(_, v)| v.direction),
        );
        let signal = self.pipeline.signals().combine(ready.iter().copied());

        let report = AnalysisReport {
            symbol: symbol.to_string(),
            timeframes: results,
            alignment,
            signal,
        };
        info!(symbol, summary = %report.summary(), "multi-timeframe analysis complete");
        Ok(report)
    }
}

/// Validate every non-empty series the source holds for `symbol`.
fn load_source(symbol: &str, timezone: &str, source: &dyn BarSource) -> Result<BTreeMap<Timeframe, SeriesStore>> {
    let mut stores = BTreeMap::new();
    for tf in source.available(symbol) {
        let Some(bars) = source.bars(symbol, tf) else {
            continue;
        };
        if bars.is_empty() {
            continue;
        }
        let meta = SeriesMeta::new(symbol, tf).with_timezone(timezone);
        stores.insert(tf, SeriesStore::with_min_bars(meta, bars, 1)?);
    }
    Ok(stores)
}

/// The store for `target`, direct or resampled, with at least `min_bars` bars.
fn resolve(stores: &BTreeMap<Timeframe, SeriesStore>, target: Timeframe, min_bars: usize) -> Result<SeriesStore> {
    let store = match stores.get(&target) {
        Some(store) => store.clone(),
        None => {
            let (source_tf, source) = stores
                .iter()
                .find(|(tf, _)| tf.divides(target))
                .ok_or_else(|| AnalysisError::timeframe(target, "no source bars and nothing finer to resample"))?;
            debug!(target = %target, source = %source_tf, "resampling");
            source.resample(target)?
        }
    };
    if store.len() < min_bars {
        return Err(AnalysisError::timeframe(
            target,
            format!("{} bar(s), need at least {min_bars}", store.len()),
        ));
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Bar, InMemorySource};

    const HOUR: i64 = 3_600_000;

    fn hourly(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|i| {
                let x = i as f64;
                let close = 100.0 + x * 0.05 + (x * 0.25).sin() * 2.0;
                let open = close - (x * 0.9).cos() * 0.5;
                Bar::new(i as i64 * HOUR, open, open.max(close) + 0.3, open.min(close) - 0.3, close, 1_000.0)
            })
            .collect()
    }

    fn coordinator() -> MultiTimeframeCoordinator {
        MultiTimeframeCoordinator::new(&AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn resamples_missing_coarser_timeframe() {
        let source = InMemorySource::new("BTC").with_series(Timeframe::H1, hourly(24 * 40));
        let report = coordinator()
            .analyze("BTC", &[Timeframe::H1, Timeframe::H4, Timeframe::D1], &source)
            .unwrap();
        assert_eq!(report.timeframes.len(), 3);
        assert_eq!(report.get(Timeframe::H4).unwrap().bars, 24 * 40 / 4);
        assert_eq!(report.get(Timeframe::D1).unwrap().bars, 40);
        assert!(!report.signal.insufficient_data);
    }

    #[test]
    fn finer_than_source_is_unavailable() {
        let source = InMemorySource::new("BTC").with_series(Timeframe::H1, hourly(100));
        let report = coordinator().analyze("BTC", &[Timeframe::M15, Timeframe::H1], &source).unwrap();
        assert!(!report.timeframes[&Timeframe::M15].is_ready());
        assert!(report.timeframes[&Timeframe::H1].is_ready());
        assert_eq!(report.unavailable().count(), 1);
    }

    #[test]
    fn malformed_bar_rejects_request() {
        let mut bars = hourly(50);
        bars[10].low = bars[10].high + 1.0;
        let source = InMemorySource::new("BTC").with_series(Timeframe::H1, bars);
        let err = coordinator().analyze("BTC", &[Timeframe::H1], &source).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedBar { index: 10, .. }));
    }

    #[test]
    fn too_few_bars_after_resampling_is_unavailable() {
        let source = InMemorySource::new("BTC").with_series(Timeframe::H1, hourly(20));
        let report = coordinator().analyze("BTC", &[Timeframe::D1], &source).unwrap();
        match &report.timeframes[&Timeframe::D1] {
            TimeframeResult::Unavailable { reason } => assert!(reason.contains("need at least")),
            other => panic!("expected unavailable, got {other:?}"),
        }
        assert!(report.signal.insufficient_data);
        assert_eq!(report.alignment, Alignment::Undetermined);
    }

    #[test]
    fn empty_request_uses_default_timeframes() {
        let source = InMemorySource::new("BTC").with_series(Timeframe::H1, hourly(24 * 10));
        let report = coordinator().analyze("BTC", &[], &source).unwrap();
        assert_eq!(report.timeframes.keys().copied().collect::<Vec<_>>(), vec![Timeframe::D1]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.indicators.rsi_period = 0;
        assert!(matches!(
            MultiTimeframeCoordinator::new(&config),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }
}

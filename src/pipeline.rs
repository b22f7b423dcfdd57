// =============================================================================
// Single-Timeframe Pipeline
// =============================================================================
//
//   SeriesStore ─► IndicatorEngine (parallel over the registry)
//              ─► PatternDetector ║ StructureAnalyzer   (rayon::join)
//              ─► regime label, SignalAggregator verdict
//
// Stateless: one `Pipeline` can serve any number of stores concurrently.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis_config::AnalysisConfig;
use crate::indicators::{IndicatorEngine, IndicatorTable};
use crate::market_data::{SeriesStore, Timeframe};
use crate::patterns::{PatternDetector, PatternEvent};
use crate::regime::{detect_regime, RegimeState};
use crate::signals::{SignalAggregator, SignalVerdict};
use crate::structure::{StructureAnalysis, StructureAnalyzer};

/// Everything computed for one timeframe of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    pub bars: usize,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
    pub last_close: f64,
    pub indicators: IndicatorTable,
    pub patterns: Vec<PatternEvent>,
    pub structure: StructureAnalysis,
    pub regime: Option<RegimeState>,
    pub signal: SignalVerdict,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
    engine: IndicatorEngine,
    patterns: PatternDetector,
    structure: StructureAnalyzer,
    signals: SignalAggregator,
}

impl Pipeline {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            engine: IndicatorEngine::from_config(config),
            patterns: PatternDetector::from_config(config),
            structure: StructureAnalyzer::from_config(config),
            signals: SignalAggregator::from_config(config),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn signals(&self) -> &SignalAggregator {
        &self.signals
    }

    pub fn run(&self, store: &SeriesStore) -> TimeframeAnalysis {
        let indicators = self.engine.compute(store);
        let (patterns, structure) = rayon::join(|| self.patterns.detect(store), || self.structure.analyze(store));
        let regime = detect_regime(store, &indicators, &self.config.indicators);
        let signal = self.signals.aggregate(store, &indicators, &patterns, &structure);

        debug!(
            series = %store.meta(),
            bars = store.len(),
            patterns = patterns.len(),
            zones = structure.zones.len(),
            score = format!("{:.3}", signal.score),
            "timeframe analysed"
        );

        TimeframeAnalysis {
            timeframe: store.interval(),
            bars: store.len(),
            first_timestamp: store.first().timestamp,
            last_timestamp: store.last().timestamp,
            last_close: store.last().close,
            indicators,
            patterns,
            structure,
            regime,
            signal,
        }
    }
}

/// Run the single-timeframe pipeline once.
pub fn analyze_series(store: &SeriesStore, config: &AnalysisConfig) -> TimeframeAnalysis {
    Pipeline::new(config).run(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Bar, SeriesMeta};

    fn store(len: usize) -> SeriesStore {
        let bars = (0..len)
            .map(|i| {
                let x = i as f64;
                let close = 100.0 + (x * 0.3).sin() * 4.0 + x * 0.05;
                let open = close - (x * 0.7).cos();
                Bar::new(
                    i as i64 * 900_000,
                    open,
                    open.max(close) + 0.4,
                    open.min(close) - 0.4,
                    close,
                    800.0 + (x * 1.1).sin() * 200.0,
                )
            })
            .collect();
        SeriesStore::new(SeriesMeta::new("PIPE", Timeframe::M15), bars).unwrap()
    }

    #[test]
    fn full_pipeline_on_oscillating_series() {
        let s = store(300);
        let analysis = analyze_series(&s, &AnalysisConfig::default());
        assert_eq!(analysis.timeframe, Timeframe::M15);
        assert_eq!(analysis.bars, 300);
        assert!(analysis.indicators.get("rsi_14").unwrap().is_ready());
        assert!(analysis.regime.is_some());
        assert!(!analysis.structure.zones.is_empty());
        assert!(!analysis.signal.insufficient_data);
        assert!((-1.0..=1.0).contains(&analysis.signal.score));
    }

    #[test]
    fn three_bars_still_produce_an_analysis() {
        let s = store(3);
        let analysis = analyze_series(&s, &AnalysisConfig::default());
        let rsi = analysis.indicators.get("rsi_14").unwrap();
        assert!(rsi.values.iter().all(Option::is_none));
        assert!(analysis.regime.is_none());
        assert!(analysis.signal.insufficient_data);
        assert_eq!(analysis.signal.recommendation, crate::types::Recommendation::Neutral);
    }

    #[test]
    fn pipeline_is_deterministic() {
        let s = store(150);
        let pipeline = Pipeline::new(&AnalysisConfig::default());
        assert_eq!(pipeline.run(&s), pipeline.run(&s));
    }
}

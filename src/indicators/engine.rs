use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis_config::AnalysisConfig;
use crate::indicators::registry::{registry, Indicator};
use crate::indicators::series::{Family, IndicatorSeries};
use crate::market_data::SeriesStore;

/// Flat table of computed series keyed by output name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorTable {
    pub series: BTreeMap<String, IndicatorSeries>,
}

impl IndicatorTable {
    pub fn get(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.get(name)
    }

    /// Value of `name` at bar `index`.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name)?.get(index)
    }

    /// Latest value of `name`.
    pub fn last(&self, name: &str) -> Option<f64> {
        self.series.get(name)?.last()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn family(&self, family: Family) -> impl Iterator<Item = &IndicatorSeries> {
        self.series.values().filter(move |s| s.family == family)
    }

    /// Names of series that could not be computed for lack of bars.
    pub fn insufficient(&self) -> Vec<&str> {
        self.series
            .values()
            .filter(|s| !s.is_ready())
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// Evaluates the indicator registry over a store.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    indicators: Vec<Indicator>,
}

impl IndicatorEngine {
    pub fn new(indicators: Vec<Indicator>) -> Self {
        Self { indicators }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(registry(&config.indicators, config.structure.swing_window))
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Compute every registered indicator in parallel. Output order does not
    /// depend on scheduling.
    pub fn compute(&self, store: &SeriesStore) -> IndicatorTable {
        let series: BTreeMap<String, IndicatorSeries> = self
            .indicators
            .par_iter()
            .map(|ind| {
                let s = ind.compute(store);
                (s.name.clone(), s)
            })
            .collect();

        let table = IndicatorTable { series };
        debug!(
            series = %store.meta(),
            computed = table.len(),
            insufficient = table.insufficient().len(),
            "indicator table computed"
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Bar, SeriesMeta, Timeframe};

    fn store(len: usize) -> SeriesStore {
        let bars = (0..len)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(i as i64 * 86_400_000, c - 0.5, c + 1.0, c - 1.0, c, 500.0)
            })
            .collect();
        SeriesStore::new(SeriesMeta::new("ENG", Timeframe::D1), bars).unwrap()
    }

    #[test]
    fn table_contains_whole_registry() {
        let cfg = AnalysisConfig::default();
        let engine = IndicatorEngine::from_config(&cfg);
        let table = engine.compute(&store(250));
        assert_eq!(table.len(), engine.indicators().len());
        assert!(table.insufficient().is_empty());
        assert!(table.last("sma_200").is_some());
    }

    #[test]
    fn parallel_result_is_deterministic() {
        let engine = IndicatorEngine::from_config(&AnalysisConfig::default());
        let s = store(120);
        assert_eq!(engine.compute(&s), engine.compute(&s));
    }

    #[test]
    fn three_bars_leave_rsi_unavailable() {
        let engine = IndicatorEngine::from_config(&AnalysisConfig::default());
        let table = engine.compute(&store(3));
        let rsi = table.get("rsi_14").unwrap();
        assert_eq!(rsi.len(), 3);
        assert!(rsi.values.iter().all(Option::is_none));
        assert!(table.insufficient().contains(&"rsi_14"));
        // Cumulative series exist from the first bar.
        assert!(table.value("obv", 0).is_some());
    }
}

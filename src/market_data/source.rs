use std::collections::BTreeMap;

use crate::market_data::bar::Bar;
use crate::market_data::timeframe::Timeframe;

/// Supplier of already-retrieved bars, one series per timeframe.
///
/// Retrieval (network, cache, files) happens outside the analysis core; an
/// implementation only hands over what it already holds.
pub trait BarSource: Send + Sync {
    /// Bars for `symbol` at `timeframe`, oldest first, or `None` when the
    /// source has nothing for that timeframe.
    fn bars(&self, symbol: &str, timeframe: Timeframe) -> Option<Vec<Bar>>;

    /// Timeframes the source holds for `symbol`, finest first.
    fn available(&self, symbol: &str) -> Vec<Timeframe>;

    /// Source timezone for bucket alignment.
    fn timezone(&self, _symbol: &str) -> String {
        "UTC".to_string()
    }
}

/// Bars held in memory for a single symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    symbol: String,
    timezone: String,
    series: BTreeMap<Timeframe, Vec<Bar>>,
}

impl InMemorySource {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timezone: "UTC".to_string(),
            series: BTreeMap::new(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_series(mut self, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.insert(timeframe, bars);
        self
    }

    pub fn insert(&mut self, timeframe: Timeframe, bars: Vec<Bar>) {
        self.series.insert(timeframe, bars);
    }
}

impl BarSource for InMemorySource {
    fn bars(&self, symbol: &str, timeframe: Timeframe) -> Option<Vec<Bar>> {
        if symbol != self.symbol {
            return None;
        }
        self.series.get(&timeframe).cloned()
    }

    fn available(&self, symbol: &str) -> Vec<Timeframe> {
        if symbol != self.symbol {
            return Vec::new();
        }
        // BTreeMap iterates in `Ord` order, which is finest first.
        self.series.keys().copied().collect()
    }

    fn timezone(&self, _symbol: &str) -> String {
        self.timezone.clone()
    }
}

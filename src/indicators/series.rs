use serde::{Deserialize, Serialize};

/// Indicator family, used for grouping in the report and for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Trend,
    Momentum,
    Volatility,
    Volume,
    Statistical,
}

/// Whether a series could be computed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SeriesStatus {
    Ready,
    /// The store is shorter than the indicator's minimum; every value is
    /// unavailable.
    InsufficientData { required: usize, available: usize },
}

/// Named numeric sequence aligned 1:1 with the bars of the analysed series.
///
/// `None` marks "not available": inside the warm-up window, after a
/// division by zero, or wherever an input was itself unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub family: Family,
    /// Index of the first bar the formula can produce a value for.
    pub warmup: usize,
    #[serde(flatten)]
    pub status: SeriesStatus,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Wrap computed values. Non-finite values are normalised to `None` and
    /// anything inside the warm-up window is masked.
    pub fn new(name: impl Into<String>, family: Family, warmup: usize, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| if i < warmup { None } else { v.filter(|x| x.is_finite()) })
            .collect();
        Self {
            name: name.into(),
            family,
            warmup,
            status: SeriesStatus::Ready,
            values,
        }
    }

    /// An all-unavailable series for a store shorter than `required` bars.
    pub fn insufficient(
        name: impl Into<String>,
        family: Family,
        warmup: usize,
        required: usize,
        len: usize,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            warmup,
            status: SeriesStatus::InsufficientData {
                required,
                available: len,
            },
            values: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.status == SeriesStatus::Ready
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Most recent value, if the last bar has one.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    /// Value `bars_back` bars before the last one.
    pub fn back(&self, bars_back: usize) -> Option<f64> {
        let idx = self.values.len().checked_sub(1 + bars_back)?;
        self.get(idx)
    }

    /// Number of bars carrying a value.
    pub fn available_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

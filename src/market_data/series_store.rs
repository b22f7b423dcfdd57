use std::ops::Range;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AnalysisError, Result};
use crate::market_data::bar::Bar;
use crate::market_data::timeframe::{parse_timezone, Timeframe};

/// Default minimum number of bars a store accepts.
pub const DEFAULT_MIN_BARS: usize = 2;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Identity of a bar series: which symbol, at which interval, and the
/// timezone the source exchange reports in (used for bucket alignment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub symbol: String,
    pub interval: Timeframe,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl SeriesMeta {
    pub fn new(symbol: impl Into<String>, interval: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            timezone: default_timezone(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

impl std::fmt::Display for SeriesMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

// ---------------------------------------------------------------------------
// SeriesStore -- validated, immutable OHLCV container
// ---------------------------------------------------------------------------

/// Validated, time-ordered OHLCV series. Immutable once constructed; every
/// derived view (`slice`, `lookback`, `resample`) is a new store.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    meta: SeriesMeta,
    offset: FixedOffset,
    bars: Vec<Bar>,
}

impl SeriesStore {
    /// Build a store with the default minimum of [`DEFAULT_MIN_BARS`] bars.
    pub fn new(meta: SeriesMeta, bars: Vec<Bar>) -> Result<Self> {
        Self::with_min_bars(meta, bars, DEFAULT_MIN_BARS)
    }

    /// Build a store, rejecting fewer than `min_bars` bars.
    ///
    /// Malformed input is checked before length so that a short but broken
    /// series reports the violation rather than the shortage.
    pub fn with_min_bars(meta: SeriesMeta, bars: Vec<Bar>, min_bars: usize) -> Result<Self> {
        let offset = parse_timezone(&meta.timezone)?;
        validate(&bars)?;

        if bars.len() < min_bars.max(1) {
            debug!(
                series = %meta,
                bars = bars.len(),
                min_bars,
                "series rejected: insufficient bars"
            );
            return Err(AnalysisError::InsufficientData {
                required: min_bars.max(1),
                got: bars.len(),
            });
        }

        trace!(series = %meta, bars = bars.len(), "series store built");
        Ok(Self { meta, offset, bars })
    }

    pub fn meta(&self) -> &SeriesMeta {
        &self.meta
    }

    pub fn symbol(&self) -> &str {
        &self.meta.symbol
    }

    pub fn interval(&self) -> Timeframe {
        self.meta.interval
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// A constructed store always holds at least one bar.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn total_volume(&self) -> f64 {
        self.bars.iter().map(|b| b.volume).sum()
    }

    /// New store over the bars in `range` (index range, end exclusive).
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        let end = range.end.min(self.bars.len());
        let start = range.start.min(end);
        Self::with_min_bars(self.meta.clone(), self.bars[start..end].to_vec(), 1)
    }

    /// New store over the most recent `count` bars (oldest-first order).
    pub fn lookback(&self, count: usize) -> Result<Self> {
        let start = self.bars.len().saturating_sub(count);
        self.slice(start..self.bars.len())
    }

    /// Aggregate into a coarser timeframe: open = first, high = max,
    /// low = min, close = last, volume = sum. Buckets are aligned in the
    /// series' source timezone and stamped with their start instant.
    pub fn resample(&self, target: Timeframe) -> Result<Self> {
        let source = self.meta.interval;
        if target == source {
            return Ok(self.clone());
        }
        if !source.divides(target) {
            return Err(AnalysisError::timeframe(
                target,
                format!("cannot derive {target} bars from {source} bars"),
            ));
        }

        let mut resampled: Vec<Bar> = Vec::new();
        let mut current: Option<Bar> = None;

        for (index, bar) in self.bars.iter().enumerate() {
            let bucket = target.bucket_start(bar.timestamp, self.offset).ok_or_else(|| {
                AnalysisError::malformed(
                    index,
                    format!("timestamp {} cannot be aligned to {target} buckets", bar.timestamp),
                )
            })?;
            match current {
                Some(ref mut agg) if agg.timestamp == bucket => {
                    agg.high = agg.high.max(bar.high);
                    agg.low = agg.low.min(bar.low);
                    agg.close = bar.close;
                    agg.volume += bar.volume;
                }
                Some(agg) => {
                    resampled.push(agg);
                    current = Some(Bar { timestamp: bucket, ..*bar });
                }
                None => {
                    current = Some(Bar { timestamp: bucket, ..*bar });
                }
            }
        }
        if let Some(agg) = current {
            resampled.push(agg);
        }

        debug!(
            series = %self.meta,
            target = %target,
            source_bars = self.bars.len(),
            resampled_bars = resampled.len(),
            "series resampled"
        );

        let meta = SeriesMeta {
            interval: target,
            ..self.meta.clone()
        };
        Self::with_min_bars(meta, resampled, 1)
    }
}

/// Check ordering and per-bar invariants; reports the first offending bar.
fn validate(bars: &[Bar]) -> Result<()> {
    for (index, bar) in bars.iter().enumerate() {
        bar.check()
            .map_err(|reason| AnalysisError::malformed(index, reason))?;
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(AnalysisError::malformed(
                index,
                format!(
                    "timestamp {} not after previous {}",
                    bar.timestamp,
                    bars[index - 1].timestamp
                ),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;
    /// 2024-01-01 00:00 UTC (a Monday).
    const T0: i64 = 1_704_067_200_000;

    fn hourly(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.7).sin() * 5.0;
                Bar::new(T0 + i as i64 * HOUR, base, base + 2.0, base - 1.5, base + 0.5, 10.0 + i as f64)
            })
            .collect()
    }

    fn meta(tf: Timeframe) -> SeriesMeta {
        SeriesMeta::new("BTCUSDT", tf)
    }

    #[test]
    fn rejects_too_few_bars() {
        let err = SeriesStore::new(meta(Timeframe::H1), hourly(1)).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 2, got: 1 });

        let err = SeriesStore::with_min_bars(meta(Timeframe::H1), hourly(10), 20).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 20, got: 10 });
    }

    #[test]
    fn rejects_unordered_timestamps() {
        let mut bars = hourly(5);
        bars[3].timestamp = bars[2].timestamp;
        match SeriesStore::new(meta(Timeframe::H1), bars).unwrap_err() {
            AnalysisError::MalformedBar { index, .. } => assert_eq!(index, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_broken_ohlc() {
        let mut bars = hourly(5);
        bars[1].high = bars[1].low - 1.0;
        assert!(matches!(
            SeriesStore::new(meta(Timeframe::H1), bars),
            Err(AnalysisError::MalformedBar { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let m = meta(Timeframe::H1).with_timezone("Mars/Olympus");
        assert!(matches!(
            SeriesStore::new(m, hourly(5)),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn lookback_and_slice() {
        let store = SeriesStore::new(meta(Timeframe::H1), hourly(10)).unwrap();
        let tail = store.lookback(3).unwrap();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.first().timestamp, store.bars()[7].timestamp);

        let mid = store.slice(2..5).unwrap();
        assert_eq!(mid.closes(), store.closes()[2..5].to_vec());

        // Oversized lookback clamps to the whole series.
        assert_eq!(store.lookback(100).unwrap().len(), 10);
        assert!(store.slice(4..4).is_err());
    }

    #[test]
    fn resample_hourly_to_four_hour() {
        let store = SeriesStore::new(meta(Timeframe::H1), hourly(10)).unwrap();
        let h4 = store.resample(Timeframe::H4).unwrap();
        assert_eq!(h4.interval(), Timeframe::H4);
        assert_eq!(h4.len(), 3); // 4 + 4 + 2

        let src = store.bars();
        let first = h4.bars()[0];
        assert_eq!(first.timestamp, T0);
        assert_eq!(first.open, src[0].open);
        assert_eq!(first.close, src[3].close);
        let max_high = src[..4].iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let min_low = src[..4].iter().map(|b| b.low).fold(f64::MAX, f64::min);
        assert_eq!(first.high, max_high);
        assert_eq!(first.low, min_low);
        let vol: f64 = src[..4].iter().map(|b| b.volume).sum();
        assert!((first.volume - vol).abs() < 1e-9);

        // Aggregated bars satisfy the OHLC envelope.
        for bar in h4.bars() {
            assert!(bar.high >= bar.open.max(bar.close));
            assert!(bar.low <= bar.open.min(bar.close));
        }
        // Volume is conserved.
        assert!((h4.total_volume() - store.total_volume()).abs() < 1e-9);
    }

    #[test]
    fn resample_to_finer_is_a_timeframe_error() {
        let store = SeriesStore::new(meta(Timeframe::H1), hourly(10)).unwrap();
        assert!(matches!(
            store.resample(Timeframe::M15),
            Err(AnalysisError::TimeframeData { .. })
        ));
    }

    #[test]
    fn resample_daily_to_weekly() {
        let day = 24 * HOUR;
        let bars: Vec<Bar> = (0..15)
            .map(|i| Bar::new(T0 + i * day, 10.0, 11.0, 9.0, 10.5, 1.0))
            .collect();
        let store = SeriesStore::new(meta(Timeframe::D1), bars).unwrap();
        let weekly = store.resample(Timeframe::W1).unwrap();
        assert_eq!(weekly.len(), 3); // 7 + 7 + 1
        assert_eq!(weekly.bars()[1].timestamp, T0 + 7 * day);
        assert_eq!(weekly.bars()[0].volume, 7.0);
    }

    #[test]
    fn resample_rejects_timestamps_past_the_alignment_range() {
        let edge = i64::MAX - 1_000;
        let bars = vec![
            Bar::new(edge - 2 * HOUR, 10.0, 11.0, 9.0, 10.5, 1.0),
            Bar::new(edge - HOUR, 10.5, 11.5, 10.0, 11.0, 1.0),
        ];
        let store =
            SeriesStore::new(meta(Timeframe::H1).with_timezone("+09:00"), bars).unwrap();
        match store.resample(Timeframe::D1).unwrap_err() {
            AnalysisError::MalformedBar { index, .. } => assert_eq!(index, 0),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

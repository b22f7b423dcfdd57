// =============================================================================
// Pattern Detector — candlestick and chart patterns as declarative templates
// =============================================================================
//
// Two generic matchers walk the series:
//
//   candlestick — `CandleTemplate`s over the last 1..=3 bars at every index
//   chart       — `ChartTemplate`s over the alternating pivot sequence, plus
//                 a bar-window template for flags
//
// Templates are data built from `PatternParams`; the matchers know nothing
// about individual pattern kinds.
//
// Confidence of an emitted event:
//   mean(constraint scores, each in [0.5, 1])
//     × breakout factor (1.0 confirmed, 0.5 unconfirmed when allowed)
//     + volume bonus (up to 0.1 when the confirming bar's volume beats its
//       trailing mean), capped at 1.0
// =============================================================================

pub mod candlestick;
pub mod chart;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis_config::{AnalysisConfig, PatternParams};
use crate::market_data::{Bar, SeriesStore};
use crate::types::Direction;

pub use candlestick::{candle_templates, CandleTemplate};
pub use chart::{chart_templates, pivot_sequence, ChartTemplate};

/// Maximum confidence added for above-average volume on the confirming bar.
const MAX_VOLUME_BONUS: f64 = 0.1;

/// Breakout factor for reversal setups that have not closed through their
/// level yet.
pub const UNCONFIRMED_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    // Candlestick
    Doji,
    DragonflyDoji,
    GravestoneDoji,
    Hammer,
    InvertedHammer,
    HangingMan,
    ShootingStar,
    BullishMarubozu,
    BearishMarubozu,
    BullishEngulfing,
    BearishEngulfing,
    BullishHarami,
    BearishHarami,
    PiercingLine,
    DarkCloudCover,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    // Chart
    HeadAndShoulders,
    InverseHeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    RisingWedge,
    FallingWedge,
    BullFlag,
    BearFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClass {
    Candlestick,
    Chart,
}

impl PatternKind {
    pub fn class(self) -> PatternClass {
        if self < PatternKind::HeadAndShoulders {
            PatternClass::Candlestick
        } else {
            PatternClass::Chart
        }
    }
}

/// One detected occurrence. Indices refer to bars of the analysed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEvent {
    pub kind: PatternKind,
    pub start_index: usize,
    pub end_index: usize,
    pub direction: Direction,
    pub confidence: f64,
}

impl PatternEvent {
    /// Bars between the event's end and the last bar of a series of `len`.
    pub fn age(&self, len: usize) -> usize {
        len.saturating_sub(1).saturating_sub(self.end_index)
    }
}

// =============================================================================
// Scoring helpers shared by both matchers
// =============================================================================

/// Score for `value <= max`: 1.0 at zero, 0.5 at the bound, `None` beyond.
pub(crate) fn score_at_most(value: f64, max: f64) -> Option<f64> {
    if !value.is_finite() || value > max {
        return None;
    }
    if max <= 0.0 {
        return Some(1.0);
    }
    Some(0.5 + 0.5 * (1.0 - value.max(0.0) / max))
}

/// Score for `value >= min`: 0.5 at the bound, 1.0 at twice the bound.
pub(crate) fn score_at_least(value: f64, min: f64) -> Option<f64> {
    if !value.is_finite() || value < min {
        return None;
    }
    if min <= 0.0 {
        return Some(1.0);
    }
    Some(0.5 + 0.5 * ((value - min) / min).min(1.0))
}

/// Volume bonus for bar `index`: its volume against the mean of the
/// preceding `window` bars.
pub(crate) fn volume_bonus(bars: &[Bar], index: usize, window: usize) -> f64 {
    if window == 0 || index < window || index >= bars.len() {
        return 0.0;
    }
    let mean = bars[index - window..index].iter().map(|b| b.volume).sum::<f64>() / window as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let ratio = bars[index].volume / mean;
    if ratio > 1.0 {
        (MAX_VOLUME_BONUS * (ratio - 1.0)).min(MAX_VOLUME_BONUS)
    } else {
        0.0
    }
}

/// Combine constraint scores, breakout factor and volume bonus.
pub(crate) fn confidence(scores: &[f64], breakout_factor: f64, bonus: f64) -> f64 {
    if scores.is_empty() {
        return (breakout_factor + bonus).clamp(0.0, 1.0);
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean * breakout_factor + bonus).clamp(0.0, 1.0)
}

// =============================================================================
// PatternDetector
// =============================================================================

#[derive(Debug, Clone)]
pub struct PatternDetector {
    params: PatternParams,
    pivot_window: usize,
    candles: Vec<CandleTemplate>,
    charts: Vec<ChartTemplate>,
}

impl PatternDetector {
    pub fn new(params: &PatternParams, pivot_window: usize) -> Self {
        Self {
            candles: candle_templates(params),
            charts: chart_templates(params),
            params: params.clone(),
            pivot_window,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(&config.patterns, config.structure.swing_window)
    }

    /// Every match of every template, sorted by (end_index, kind).
    pub fn detect(&self, store: &SeriesStore) -> Vec<PatternEvent> {
        let bars = store.bars();
        let mut events = candlestick::match_all(&self.candles, bars, &self.params);

        let pivots = pivot_sequence(bars, self.pivot_window);
        events.extend(chart::match_all(&self.charts, &pivots, bars, self.pivot_window, &self.params));
        events.extend(chart::match_flags(bars, &self.params));

        events.sort_by(|a, b| a.end_index.cmp(&b.end_index).then(a.kind.cmp(&b.kind)));
        debug!(
            series = %store.meta(),
            pivots = pivots.len(),
            events = events.len(),
            "patterns detected"
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{SeriesMeta, Timeframe};

    /// Piecewise-linear closes through `knots` (bar index, price); each bar
    /// opens at the previous close and carries half a point of wick.
    pub(crate) fn path(knots: &[(usize, f64)], volume: f64) -> Vec<Bar> {
        let mut closes = Vec::new();
        for pair in knots.windows(2) {
            let ((i0, p0), (i1, p1)) = (pair[0], pair[1]);
            for i in i0..i1 {
                let t = (i - i0) as f64 / (i1 - i0) as f64;
                closes.push(p0 + (p1 - p0) * t);
            }
        }
        if let Some(&(_, last)) = knots.last() {
            closes.push(last);
        }
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = if i == 0 { c } else { closes[i - 1] };
                let high = open.max(c) + 0.5;
                let low = open.min(c) - 0.5;
                Bar::new(i as i64 * 86_400_000, open, high, low, c, volume)
            })
            .collect()
    }

    #[test]
    fn planted_double_top_is_detected() {
        let bars = path(&[(0, 100.0), (15, 120.0), (25, 108.0), (35, 120.0), (59, 95.0)], 1_000.0);
        assert_eq!(bars.len(), 60);
        let store = SeriesStore::new(SeriesMeta::new("DT", Timeframe::D1), bars).unwrap();

        let detector = PatternDetector::from_config(&AnalysisConfig::default());
        let events = detector.detect(&store);
        let top = events
            .iter()
            .find(|e| e.kind == PatternKind::DoubleTop)
            .expect("double top should be detected");
        assert_eq!(top.direction, Direction::Bearish);
        assert!(top.confidence > 0.0 && top.confidence <= 1.0);
        assert_eq!(top.start_index, 15);
        assert!(top.end_index > 35);
    }

    #[test]
    fn huge_spans_do_not_overflow() {
        let mut params = AnalysisConfig::default().patterns;
        params.max_pattern_bars = usize::MAX;
        params.flag_max_bars = usize::MAX;
        params.volume_window = usize::MAX;
        let detector = PatternDetector::new(&params, 5);

        let top = path(&[(0, 100.0), (15, 120.0), (25, 108.0), (35, 120.0), (59, 95.0)], 1_000.0);
        let store = SeriesStore::new(SeriesMeta::new("DT", Timeframe::D1), top).unwrap();
        assert!(detector.detect(&store).iter().any(|e| e.kind == PatternKind::DoubleTop));

        let flag = path(&[(0, 100.0), (10, 130.0), (16, 126.0), (22, 140.0)], 1_000.0);
        let store = SeriesStore::new(SeriesMeta::new("FL", Timeframe::D1), flag).unwrap();
        let events = detector.detect(&store);
        assert!(events.iter().all(|e| e.end_index < 23));
    }

    #[test]
    fn events_are_sorted_and_bounded() {
        let bars = path(
            &[(0, 50.0), (10, 60.0), (18, 52.0), (28, 64.0), (36, 55.0), (46, 61.0), (60, 48.0)],
            500.0,
        );
        let store = SeriesStore::new(SeriesMeta::new("S", Timeframe::D1), bars).unwrap();
        let events = PatternDetector::from_config(&AnalysisConfig::default()).detect(&store);
        for pair in events.windows(2) {
            assert!((pair[0].end_index, pair[0].kind) <= (pair[1].end_index, pair[1].kind));
        }
        for e in &events {
            assert!(e.confidence > 0.0 && e.confidence <= 1.0);
            assert!(e.start_index <= e.end_index && e.end_index < 61);
        }
    }

    #[test]
    fn scoring_helpers() {
        assert_eq!(score_at_most(0.0, 0.1), Some(1.0));
        assert_eq!(score_at_most(0.1, 0.1), Some(0.5));
        assert_eq!(score_at_most(0.2, 0.1), None);
        assert_eq!(score_at_least(2.0, 2.0), Some(0.5));
        assert_eq!(score_at_least(4.0, 2.0), Some(1.0));
        assert!((confidence(&[1.0, 0.5], 0.5, 0.1) - 0.475).abs() < 1e-12);
    }

    #[test]
    fn volume_bonus_is_capped() {
        let mut bars = path(&[(0, 10.0), (25, 12.0)], 100.0);
        bars[25].volume = 1_000.0;
        assert!((volume_bonus(&bars, 25, 20) - MAX_VOLUME_BONUS).abs() < 1e-12);
        assert_eq!(volume_bonus(&bars, 24, 20), 0.0);
    }

    #[test]
    fn kind_classes() {
        assert_eq!(PatternKind::ThreeBlackCrows.class(), PatternClass::Candlestick);
        assert_eq!(PatternKind::DoubleTop.class(), PatternClass::Chart);
    }
}

// =============================================================================
// Candlestick templates and matcher
// =============================================================================
//
// A template is a list of per-bar shapes (colour plus ratio bounds), a list
// of inter-bar relations and an optional prior-trend context. The matcher
// aligns the template's last shape with every bar of the series and scores
// each satisfied bound; any violated bound rejects the match.
//
// Ratios are measured against the bar's range (or body, for the hammer
// family's dominant shadow). A zero-range bar never matches a ratio bound.
// =============================================================================

use crate::analysis_config::PatternParams;
use crate::market_data::Bar;
use crate::patterns::{confidence, score_at_least, score_at_most, volume_bonus, PatternEvent, PatternKind};
use crate::types::Direction;

/// Prior-trend change (percent) that earns a full context score.
const FULL_TREND_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Bull,
    Bear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    BodyToRange,
    UpperToRange,
    LowerToRange,
    UpperToBody,
    LowerToBody,
}

impl Measure {
    /// `None` on a zero denominator. A zero-body candle therefore never
    /// satisfies a shadow-to-body bound: dojis belong to the doji templates,
    /// not the hammer family.
    fn of(self, bar: &Bar) -> Option<f64> {
        let (num, den) = match self {
            Measure::BodyToRange => (bar.body(), bar.range()),
            Measure::UpperToRange => (bar.upper_shadow(), bar.range()),
            Measure::LowerToRange => (bar.lower_shadow(), bar.range()),
            Measure::UpperToBody => (bar.upper_shadow(), bar.body()),
            Measure::LowerToBody => (bar.lower_shadow(), bar.body()),
        };
        if den > 0.0 {
            Some(num / den)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    AtMost(f64),
    AtLeast(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub color: Option<Color>,
    pub bounds: Vec<(Measure, Bound)>,
}

impl Shape {
    fn any() -> Self {
        Self {
            color: None,
            bounds: Vec::new(),
        }
    }

    fn colored(color: Color) -> Self {
        Self {
            color: Some(color),
            bounds: Vec::new(),
        }
    }

    fn with(mut self, measure: Measure, bound: Bound) -> Self {
        self.bounds.push((measure, bound));
        self
    }
}

/// Relations between bars, by position inside the template window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    /// Body of `outer` covers the body of `inner` and is larger.
    Engulfs { outer: usize, inner: usize },
    /// Body of `inner` lies within the body of `outer`.
    InsideBody { inner: usize, outer: usize },
    /// Close of `bar` is beyond the body midpoint of `of` (above when `up`).
    ClosePastMidpoint { bar: usize, of: usize, up: bool },
    /// Close of `bar` lies strictly inside the body of `of`.
    CloseInsideBody { bar: usize, of: usize },
    /// Open of `bar` is beyond the close of `of` (below when `below`).
    OpensBeyondClose { bar: usize, of: usize, below: bool },
    /// Whole body of `bar` is beyond the body of `of` (below when `below`).
    BodyGap { bar: usize, of: usize, below: bool },
    /// Every close beyond the previous one, every open inside the previous body.
    Progressive { up: bool },
}

impl Relation {
    fn holds(self, w: &[Bar]) -> bool {
        match self {
            Relation::Engulfs { outer, inner } => {
                let (o, i) = (&w[outer], &w[inner]);
                o.body_top() >= i.body_top() && o.body_bottom() <= i.body_bottom() && o.body() > i.body()
            }
            Relation::InsideBody { inner, outer } => {
                let (i, o) = (&w[inner], &w[outer]);
                i.body_top() <= o.body_top() && i.body_bottom() >= o.body_bottom() && i.body() < o.body()
            }
            Relation::ClosePastMidpoint { bar, of, up } => {
                let mid = w[of].body_mid();
                if up {
                    w[bar].close > mid
                } else {
                    w[bar].close < mid
                }
            }
            Relation::CloseInsideBody { bar, of } => {
                let c = w[bar].close;
                c > w[of].body_bottom() && c < w[of].body_top()
            }
            Relation::OpensBeyondClose { bar, of, below } => {
                if below {
                    w[bar].open < w[of].close
                } else {
                    w[bar].open > w[of].close
                }
            }
            Relation::BodyGap { bar, of, below } => {
                if below {
                    w[bar].body_top() <= w[of].body_bottom()
                } else {
                    w[bar].body_bottom() >= w[of].body_top()
                }
            }
            Relation::Progressive { up } => w.windows(2).all(|p| {
                let (prev, cur) = (&p[0], &p[1]);
                let beyond = if up {
                    cur.close > prev.close
                } else {
                    cur.close < prev.close
                };
                beyond && cur.open >= prev.body_bottom() && cur.open <= prev.body_top()
            }),
        }
    }
}

/// Required direction of the move leading into the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendContext {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandleTemplate {
    pub kind: PatternKind,
    pub direction: Direction,
    pub shapes: Vec<Shape>,
    pub relations: Vec<Relation>,
    pub context: Option<TrendContext>,
}

impl CandleTemplate {
    fn new(kind: PatternKind, direction: Direction, shapes: Vec<Shape>) -> Self {
        Self {
            kind,
            direction,
            shapes,
            relations: Vec::new(),
            context: None,
        }
    }

    fn relate(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    fn after(mut self, context: TrendContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Scores of every constraint when the template matches the bars ending
    /// at `end`, `None` otherwise.
    fn evaluate(&self, bars: &[Bar], end: usize, lookback: usize) -> Option<Vec<f64>> {
        let start = (end + 1).checked_sub(self.len())?;
        let window = &bars[start..=end];
        let mut scores = Vec::new();

        for (bar, shape) in window.iter().zip(&self.shapes) {
            match shape.color {
                Some(Color::Bull) if !bar.is_bullish() => return None,
                Some(Color::Bear) if !bar.is_bearish() => return None,
                _ => {}
            }
            for (measure, bound) in &shape.bounds {
                let value = measure.of(bar)?;
                let score = match *bound {
                    Bound::AtMost(max) => score_at_most(value, max)?,
                    Bound::AtLeast(min) => score_at_least(value, min)?,
                };
                scores.push(score);
            }
        }

        for relation in &self.relations {
            if !relation.holds(window) {
                return None;
            }
            scores.push(1.0);
        }

        if let Some(context) = self.context {
            scores.push(context_score(bars, start, lookback, context)?);
        }
        Some(scores)
    }
}

/// Score the trend of closes over `lookback` bars before `start`.
fn context_score(bars: &[Bar], start: usize, lookback: usize, context: TrendContext) -> Option<f64> {
    let last = start.checked_sub(1)?;
    let first = last.checked_sub(lookback.max(1))?;
    let reference = bars[first].close;
    if reference == 0.0 {
        return None;
    }
    let change_pct = (bars[last].close - reference) / reference * 100.0;
    let signed = match context {
        TrendContext::Up => change_pct,
        TrendContext::Down => -change_pct,
    };
    if signed <= 0.0 {
        return None;
    }
    Some(0.5 + 0.5 * (signed / FULL_TREND_PCT).min(1.0))
}

/// The candlestick template table for the given tolerances.
pub fn candle_templates(p: &PatternParams) -> Vec<CandleTemplate> {
    use Bound::*;
    use Color::*;
    use Direction::*;
    use Measure::*;
    use PatternKind as K;

    let doji = || Shape::any().with(BodyToRange, AtMost(p.doji_body_ratio));
    let long = |c: Color| Shape::colored(c).with(BodyToRange, AtLeast(p.long_body_ratio));
    let small = || Shape::any().with(BodyToRange, AtMost(p.small_body_ratio));
    let lower_hammer = || {
        small()
            .with(LowerToBody, AtLeast(p.long_shadow_ratio))
            .with(UpperToRange, AtMost(p.short_shadow_ratio))
    };
    let upper_hammer = || {
        small()
            .with(UpperToBody, AtLeast(p.long_shadow_ratio))
            .with(LowerToRange, AtMost(p.short_shadow_ratio))
    };
    let marubozu = |c: Color| {
        long(c)
            .with(UpperToRange, AtMost(p.marubozu_shadow_ratio))
            .with(LowerToRange, AtMost(p.marubozu_shadow_ratio))
    };

    vec![
        // ---- single bar ------------------------------------------------
        CandleTemplate::new(K::Doji, Neutral, vec![doji()]),
        CandleTemplate::new(
            K::DragonflyDoji,
            Bullish,
            vec![doji().with(UpperToRange, AtMost(p.short_shadow_ratio))],
        ),
        CandleTemplate::new(
            K::GravestoneDoji,
            Bearish,
            vec![doji().with(LowerToRange, AtMost(p.short_shadow_ratio))],
        ),
        CandleTemplate::new(K::Hammer, Bullish, vec![lower_hammer()]).after(TrendContext::Down),
        CandleTemplate::new(K::HangingMan, Bearish, vec![lower_hammer()]).after(TrendContext::Up),
        CandleTemplate::new(K::InvertedHammer, Bullish, vec![upper_hammer()]).after(TrendContext::Down),
        CandleTemplate::new(K::ShootingStar, Bearish, vec![upper_hammer()]).after(TrendContext::Up),
        CandleTemplate::new(K::BullishMarubozu, Bullish, vec![marubozu(Bull)]),
        CandleTemplate::new(K::BearishMarubozu, Bearish, vec![marubozu(Bear)]),
        // ---- two bars --------------------------------------------------
        CandleTemplate::new(K::BullishEngulfing, Bullish, vec![Shape::colored(Bear), Shape::colored(Bull)])
            .relate(Relation::Engulfs { outer: 1, inner: 0 })
            .after(TrendContext::Down),
        CandleTemplate::new(K::BearishEngulfing, Bearish, vec![Shape::colored(Bull), Shape::colored(Bear)])
            .relate(Relation::Engulfs { outer: 1, inner: 0 })
            .after(TrendContext::Up),
        CandleTemplate::new(K::BullishHarami, Bullish, vec![long(Bear), Shape::colored(Bull)])
            .relate(Relation::InsideBody { inner: 1, outer: 0 })
            .after(TrendContext::Down),
        CandleTemplate::new(K::BearishHarami, Bearish, vec![long(Bull), Shape::colored(Bear)])
            .relate(Relation::InsideBody { inner: 1, outer: 0 })
            .after(TrendContext::Up),
        CandleTemplate::new(K::PiercingLine, Bullish, vec![long(Bear), Shape::colored(Bull)])
            .relate(Relation::OpensBeyondClose { bar: 1, of: 0, below: true })
            .relate(Relation::ClosePastMidpoint { bar: 1, of: 0, up: true })
            .relate(Relation::CloseInsideBody { bar: 1, of: 0 })
            .after(TrendContext::Down),
        CandleTemplate::new(K::DarkCloudCover, Bearish, vec![long(Bull), Shape::colored(Bear)])
            .relate(Relation::OpensBeyondClose { bar: 1, of: 0, below: false })
            .relate(Relation::ClosePastMidpoint { bar: 1, of: 0, up: false })
            .relate(Relation::CloseInsideBody { bar: 1, of: 0 })
            .after(TrendContext::Up),
        // ---- three bars ------------------------------------------------
        CandleTemplate::new(K::MorningStar, Bullish, vec![long(Bear), small(), Shape::colored(Bull)])
            .relate(Relation::BodyGap { bar: 1, of: 0, below: true })
            .relate(Relation::ClosePastMidpoint { bar: 2, of: 0, up: true })
            .after(TrendContext::Down),
        CandleTemplate::new(K::EveningStar, Bearish, vec![long(Bull), small(), Shape::colored(Bear)])
            .relate(Relation::BodyGap { bar: 1, of: 0, below: false })
            .relate(Relation::ClosePastMidpoint { bar: 2, of: 0, up: false })
            .after(TrendContext::Up),
        CandleTemplate::new(K::ThreeWhiteSoldiers, Bullish, vec![long(Bull), long(Bull), long(Bull)])
            .relate(Relation::Progressive { up: true }),
        CandleTemplate::new(K::ThreeBlackCrows, Bearish, vec![long(Bear), long(Bear), long(Bear)])
            .relate(Relation::Progressive { up: false }),
    ]
}

/// Run every template at every bar.
pub fn match_all(templates: &[CandleTemplate], bars: &[Bar], params: &PatternParams) -> Vec<PatternEvent> {
    let mut events = Vec::new();
    for end in 0..bars.len() {
        for template in templates {
            let Some(scores) = template.evaluate(bars, end, params.trend_lookback) else {
                continue;
            };
            let bonus = volume_bonus(bars, end, params.volume_window);
            events.push(PatternEvent {
                kind: template.kind,
                start_index: end + 1 - template.len(),
                end_index: end,
                direction: template.direction,
                confidence: confidence(&scores, 1.0, bonus),
            });
        }
    }
    events
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(0, open, high, low, close, 100.0)
    }

    /// Five falling bars followed by `tail`.
    fn after_decline(tail: &[Bar]) -> Vec<Bar> {
        let mut bars: Vec<Bar> = (0..6)
            .map(|i| {
                let c = 110.0 - 2.0 * i as f64;
                bar(c + 1.5, c + 2.0, c - 0.5, c)
            })
            .collect();
        bars.extend_from_slice(tail);
        bars
    }

    fn after_rally(tail: &[Bar]) -> Vec<Bar> {
        let mut bars: Vec<Bar> = (0..6)
            .map(|i| {
                let c = 90.0 + 2.0 * i as f64;
                bar(c - 1.5, c + 0.5, c - 2.0, c)
            })
            .collect();
        bars.extend_from_slice(tail);
        bars
    }

    fn kinds_at_end(bars: &[Bar]) -> Vec<PatternKind> {
        let params = PatternParams::default();
        match_all(&candle_templates(&params), bars, &params)
            .into_iter()
            .filter(|e| e.end_index == bars.len() - 1)
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn doji_family() {
        let kinds = kinds_at_end(&[bar(10.0, 11.0, 9.0, 10.02)]);
        assert!(kinds.contains(&PatternKind::Doji));
        assert!(!kinds.contains(&PatternKind::DragonflyDoji));

        let dragonfly = kinds_at_end(&[bar(10.0, 10.02, 8.0, 10.01)]);
        assert!(dragonfly.contains(&PatternKind::DragonflyDoji));
        let gravestone = kinds_at_end(&[bar(10.0, 12.0, 9.99, 10.01)]);
        assert!(gravestone.contains(&PatternKind::GravestoneDoji));
    }

    #[test]
    fn hammer_needs_prior_decline() {
        let hammer = bar(99.0, 100.05, 96.0, 100.0);
        assert!(kinds_at_end(&after_decline(&[hammer])).contains(&PatternKind::Hammer));
        let kinds = kinds_at_end(&after_rally(&[hammer]));
        assert!(!kinds.contains(&PatternKind::Hammer));
        assert!(kinds.contains(&PatternKind::HangingMan));
    }

    #[test]
    fn zero_body_tail_is_a_dragonfly_not_a_hammer() {
        let flat_top = bar(100.0, 100.0, 96.0, 100.0);
        let kinds = kinds_at_end(&after_decline(&[flat_top]));
        assert!(kinds.contains(&PatternKind::DragonflyDoji));
        assert!(!kinds.contains(&PatternKind::Hammer));
        assert_eq!(Measure::LowerToBody.of(&flat_top), None);
    }

    #[test]
    fn shooting_star_after_rally() {
        let star = bar(101.0, 104.0, 99.95, 100.0);
        assert!(kinds_at_end(&after_rally(&[star])).contains(&PatternKind::ShootingStar));
    }

    #[test]
    fn marubozu() {
        let kinds = kinds_at_end(&[bar(10.0, 12.0, 10.0, 12.0)]);
        assert!(kinds.contains(&PatternKind::BullishMarubozu));
        assert!(!kinds.contains(&PatternKind::BearishMarubozu));
    }

    #[test]
    fn bullish_engulfing() {
        let bars = after_decline(&[bar(100.0, 100.2, 98.8, 99.0), bar(98.5, 101.2, 98.4, 101.0)]);
        let kinds = kinds_at_end(&bars);
        assert!(kinds.contains(&PatternKind::BullishEngulfing));
        assert!(!kinds.contains(&PatternKind::BearishEngulfing));
    }

    #[test]
    fn bearish_harami() {
        let bars = after_rally(&[bar(100.0, 105.2, 99.8, 105.0), bar(103.0, 103.5, 101.5, 102.0)]);
        assert!(kinds_at_end(&bars).contains(&PatternKind::BearishHarami));
    }

    #[test]
    fn piercing_line_and_dark_cloud() {
        let piercing = after_decline(&[bar(100.0, 100.2, 95.8, 96.0), bar(95.5, 99.0, 95.4, 98.5)]);
        assert!(kinds_at_end(&piercing).contains(&PatternKind::PiercingLine));

        let cloud = after_rally(&[bar(100.0, 104.2, 99.8, 104.0), bar(104.5, 104.6, 101.0, 101.5)]);
        assert!(kinds_at_end(&cloud).contains(&PatternKind::DarkCloudCover));
    }

    #[test]
    fn morning_star() {
        let bars = after_decline(&[
            bar(100.0, 100.2, 95.8, 96.0),
            bar(95.5, 95.9, 94.5, 95.2),
            bar(95.6, 99.2, 95.5, 99.0),
        ]);
        assert!(kinds_at_end(&bars).contains(&PatternKind::MorningStar));
    }

    #[test]
    fn three_black_crows() {
        let bars = [
            bar(110.0, 110.2, 106.8, 107.0),
            bar(108.0, 108.1, 104.8, 105.0),
            bar(106.0, 106.1, 102.8, 103.0),
        ];
        assert!(kinds_at_end(&bars).contains(&PatternKind::ThreeBlackCrows));
    }

    #[test]
    fn zero_range_bar_matches_nothing() {
        assert!(kinds_at_end(&[bar(10.0, 10.0, 10.0, 10.0)]).is_empty());
    }
}

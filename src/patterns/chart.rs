// =============================================================================
// Chart templates — pivot-sequence matcher and flag window matcher
// =============================================================================
//
// Pivots come from `find_extrema` and are compressed into a strictly
// alternating high/low sequence (of two consecutive same-kind pivots the more
// extreme survives). A `ChartTemplate` names the pivot kinds it expects,
// geometric constraints between pivot positions, and an optional breakout:
// a close beyond the mean price of some pivots, after the last pivot.
//
// An event ends at its breakout bar, or at the confirmation bar of its last
// pivot when no breakout is part of the template (or it is still pending and
// unconfirmed events are allowed).
// =============================================================================

use crate::analysis_config::PatternParams;
use crate::indicators::statistical::{find_extrema, Extremum, ExtremumKind};
use crate::market_data::Bar;
use crate::patterns::{
    confidence, score_at_least, score_at_most, volume_bonus, PatternEvent, PatternKind,
    UNCONFIRMED_FACTOR,
};
use crate::types::Direction;

/// Alternating pivot sequence of the bars.
pub fn pivot_sequence(bars: &[Bar], window: usize) -> Vec<Extremum> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let mut out: Vec<Extremum> = Vec::new();
    for e in find_extrema(&highs, &lows, window) {
        match out.last_mut() {
            Some(prev) if prev.kind == e.kind => {
                let more_extreme = match e.kind {
                    ExtremumKind::High => e.price > prev.price,
                    ExtremumKind::Low => e.price < prev.price,
                };
                if more_extreme {
                    *prev = e;
                }
            }
            _ => out.push(e),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeClass {
    Flat,
    Rising,
    Falling,
}

/// Geometric constraint between pivots, by position in the matched window.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Prices of `a` and `b` within `tolerance_pct` of their mean.
    Equal { a: usize, b: usize, tolerance_pct: f64 },
    /// `a` at least `min_pct` above `b`.
    Above { a: usize, b: usize, min_pct: f64 },
    /// `a` at least `min_pct` below `b`.
    Below { a: usize, b: usize, min_pct: f64 },
    /// Line through two pivots classified by its per-bar slope in percent.
    Slope { from: usize, to: usize, class: SlopeClass, flat_pct: f64 },
    /// Gap between the upper line (two pivots) and the lower line (two
    /// pivots) narrows from the first to the last pivot of the window.
    Converging { upper: (usize, usize), lower: (usize, usize) },
}

impl Constraint {
    fn score(&self, p: &[Extremum]) -> Option<f64> {
        match *self {
            Constraint::Equal { a, b, tolerance_pct } => {
                let mean = (p[a].price + p[b].price) / 2.0;
                if mean <= 0.0 {
                    return None;
                }
                let diff_pct = (p[a].price - p[b].price).abs() / mean * 100.0;
                score_at_most(diff_pct, tolerance_pct)
            }
            Constraint::Above { a, b, min_pct } => {
                let pct = pct_change(p[b].price, p[a].price)?;
                score_at_least(pct, min_pct)
            }
            Constraint::Below { a, b, min_pct } => {
                let pct = pct_change(p[b].price, p[a].price)?;
                score_at_least(-pct, min_pct)
            }
            Constraint::Slope { from, to, class, flat_pct } => {
                let slope = slope_pct(&p[from], &p[to])?;
                match class {
                    SlopeClass::Flat => score_at_most(slope.abs(), flat_pct),
                    SlopeClass::Rising if slope > flat_pct => score_at_least(slope, flat_pct),
                    SlopeClass::Falling if slope < -flat_pct => score_at_least(-slope, flat_pct),
                    _ => None,
                }
            }
            Constraint::Converging { upper, lower } => {
                let first = p.first()?.index as f64;
                let last = p.last()?.index as f64;
                let at = |line: (usize, usize), x: f64| -> Option<f64> {
                    let (a, b) = (&p[line.0], &p[line.1]);
                    let dx = b.index as f64 - a.index as f64;
                    if dx == 0.0 {
                        return None;
                    }
                    Some(a.price + (b.price - a.price) / dx * (x - a.index as f64))
                };
                let start_gap = at(upper, first)? - at(lower, first)?;
                let end_gap = at(upper, last)? - at(lower, last)?;
                if start_gap <= 0.0 || end_gap < 0.0 || end_gap >= start_gap {
                    return None;
                }
                Some(0.5 + 0.5 * (1.0 - end_gap / start_gap))
            }
        }
    }
}

fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        None
    } else {
        Some((to - from) / from * 100.0)
    }
}

/// Per-bar slope of the line between two pivots, in percent of their mean.
fn slope_pct(a: &Extremum, b: &Extremum) -> Option<f64> {
    let dx = b.index as f64 - a.index as f64;
    let mean = (a.price + b.price) / 2.0;
    if dx == 0.0 || mean <= 0.0 {
        return None;
    }
    Some((b.price - a.price) / dx / mean * 100.0)
}

/// Close beyond the mean price of `level` pivots (upwards when `up`).
#[derive(Debug, Clone, PartialEq)]
pub struct Breakout {
    pub level: Vec<usize>,
    pub up: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartTemplate {
    pub kind: PatternKind,
    pub direction: Direction,
    pub sequence: Vec<ExtremumKind>,
    pub constraints: Vec<Constraint>,
    pub breakout: Option<Breakout>,
}

/// Pivot kinds alternating from `first`.
fn alternating(first: ExtremumKind, len: usize) -> Vec<ExtremumKind> {
    (0..len)
        .map(|i| match (first, i % 2) {
            (k, 0) => k,
            (ExtremumKind::High, _) => ExtremumKind::Low,
            (ExtremumKind::Low, _) => ExtremumKind::High,
        })
        .collect()
}

/// The chart template table for the given tolerances.
pub fn chart_templates(p: &PatternParams) -> Vec<ChartTemplate> {
    use Constraint::*;
    use ExtremumKind::{High, Low};
    use PatternKind as K;

    let tol = p.price_tolerance_pct;
    let depth = p.min_depth_pct;
    let head = p.head_prominence_pct;
    let flat = p.flat_slope_pct;

    let mut out = vec![
        ChartTemplate {
            kind: K::DoubleTop,
            direction: Direction::Bearish,
            sequence: alternating(High, 3),
            constraints: vec![
                Equal { a: 0, b: 2, tolerance_pct: tol },
                Above { a: 0, b: 1, min_pct: depth },
                Above { a: 2, b: 1, min_pct: depth },
            ],
            breakout: Some(Breakout { level: vec![1], up: false }),
        },
        ChartTemplate {
            kind: K::DoubleBottom,
            direction: Direction::Bullish,
            sequence: alternating(Low, 3),
            constraints: vec![
                Equal { a: 0, b: 2, tolerance_pct: tol },
                Below { a: 0, b: 1, min_pct: depth },
                Below { a: 2, b: 1, min_pct: depth },
            ],
            breakout: Some(Breakout { level: vec![1], up: true }),
        },
        ChartTemplate {
            kind: K::HeadAndShoulders,
            direction: Direction::Bearish,
            sequence: alternating(High, 5),
            constraints: vec![
                Above { a: 2, b: 0, min_pct: head },
                Above { a: 2, b: 4, min_pct: head },
                Equal { a: 0, b: 4, tolerance_pct: tol },
                Equal { a: 1, b: 3, tolerance_pct: tol },
            ],
            breakout: Some(Breakout { level: vec![1, 3], up: false }),
        },
        ChartTemplate {
            kind: K::InverseHeadAndShoulders,
            direction: Direction::Bullish,
            sequence: alternating(Low, 5),
            constraints: vec![
                Below { a: 2, b: 0, min_pct: head },
                Below { a: 2, b: 4, min_pct: head },
                Equal { a: 0, b: 4, tolerance_pct: tol },
                Equal { a: 1, b: 3, tolerance_pct: tol },
            ],
            breakout: Some(Breakout { level: vec![1, 3], up: true }),
        },
    ];

    // Four-pivot converging shapes, in both phases (starting at a high or a
    // low), so the highs and lows sit at different positions.
    for first in [High, Low] {
        let (h0, h1, l0, l1) = match first {
            High => (0, 2, 1, 3),
            Low => (1, 3, 0, 2),
        };
        let upper = |class| Slope { from: h0, to: h1, class, flat_pct: flat };
        let lower = |class| Slope { from: l0, to: l1, class, flat_pct: flat };
        let converging = Converging {
            upper: (h0, h1),
            lower: (l0, l1),
        };
        let shapes = [
            (
                K::AscendingTriangle,
                Direction::Bullish,
                SlopeClass::Flat,
                SlopeClass::Rising,
                Some(Breakout { level: vec![h0, h1], up: true }),
            ),
            (
                K::DescendingTriangle,
                Direction::Bearish,
                SlopeClass::Falling,
                SlopeClass::Flat,
                Some(Breakout { level: vec![l0, l1], up: false }),
            ),
            (
                K::SymmetricalTriangle,
                Direction::Neutral,
                SlopeClass::Falling,
                SlopeClass::Rising,
                None,
            ),
            (
                K::RisingWedge,
                Direction::Bearish,
                SlopeClass::Rising,
                SlopeClass::Rising,
                Some(Breakout { level: vec![l1], up: false }),
            ),
            (
                K::FallingWedge,
                Direction::Bullish,
                SlopeClass::Falling,
                SlopeClass::Falling,
                Some(Breakout { level: vec![h1], up: true }),
            ),
        ];
        for (kind, direction, top, bottom, breakout) in shapes {
            out.push(ChartTemplate {
                kind,
                direction,
                sequence: alternating(first, 4),
                constraints: vec![upper(top), lower(bottom), converging.clone()],
                breakout,
            });
        }
    }
    out
}

/// First bar after `after` (and no later than `until`) closing beyond `level`.
fn find_breakout(bars: &[Bar], after: usize, until: usize, level: f64, up: bool) -> Option<usize> {
    let end = until.min(bars.len().saturating_sub(1));
    (after + 1..=end).find(|&i| if up { bars[i].close > level } else { bars[i].close < level })
}

/// Run every chart template over every aligned pivot window.
pub fn match_all(
    templates: &[ChartTemplate],
    pivots: &[Extremum],
    bars: &[Bar],
    window: usize,
    params: &PatternParams,
) -> Vec<PatternEvent> {
    let mut events = Vec::new();
    if bars.is_empty() {
        return events;
    }
    let last_bar = bars.len() - 1;

    for template in templates {
        let n = template.sequence.len();
        if pivots.len() < n {
            continue;
        }
        for start in 0..=pivots.len() - n {
            let w = &pivots[start..start + n];
            if w.iter().zip(&template.sequence).any(|(p, k)| p.kind != *k) {
                continue;
            }
            let (first, last) = (w[0].index, w[n - 1].index);
            if last - first > params.max_pattern_bars {
                continue;
            }
            let Some(scores) = template
                .constraints
                .iter()
                .map(|c| c.score(w))
                .collect::<Option<Vec<f64>>>()
            else {
                continue;
            };

            let confirmed_at = last.saturating_add(window).min(last_bar);
            let (end, factor) = match &template.breakout {
                None => (confirmed_at, 1.0),
                Some(b) => {
                    let level = b.level.iter().map(|&i| w[i].price).sum::<f64>() / b.level.len() as f64;
                    let until = first.saturating_add(params.max_pattern_bars);
                    match find_breakout(bars, last, until, level, b.up) {
                        Some(i) => (i.max(confirmed_at), 1.0),
                        None if params.require_breakout => continue,
                        None => (confirmed_at, UNCONFIRMED_FACTOR),
                    }
                }
            };
            let bonus = volume_bonus(bars, end, params.volume_window);
            events.push(PatternEvent {
                kind: template.kind,
                start_index: first,
                end_index: end,
                direction: template.direction,
                confidence: confidence(&scores, factor, bonus),
            });
        }
    }
    events
}

// =============================================================================
// Flags — bar-window template
// =============================================================================

/// Pole then tight counter-trend consolidation, for both directions.
pub fn match_flags(bars: &[Bar], p: &PatternParams) -> Vec<PatternEvent> {
    let mut events = Vec::new();
    for up in [true, false] {
        for pole_end in p.flag_pole_bars..bars.len() {
            if let Some(event) = flag_at(bars, pole_end, up, p) {
                events.push(event);
            }
        }
    }
    events
}

fn flag_at(bars: &[Bar], pole_end: usize, up: bool, p: &PatternParams) -> Option<PatternEvent> {
    const MIN_FLAG_BARS: usize = 3;

    let pole_start = pole_end.checked_sub(p.flag_pole_bars)?;
    let (base, top) = (bars[pole_start].close, bars[pole_end].close);
    let sign = if up { 1.0 } else { -1.0 };
    let move_pct = sign * pct_change(base, top)?;
    let pole_score = score_at_least(move_pct, p.flag_pole_min_pct)?;
    let pole = (top - base).abs();

    // Extend the consolidation while it holds below the pole top (above the
    // pole bottom for bear flags) and within the retracement limit.
    let mut flag_end = pole_end;
    let mut worst_retrace = 0.0_f64;
    for i in pole_end + 1..bars.len().min(pole_end.saturating_add(1).saturating_add(p.flag_max_bars)) {
        let b = &bars[i];
        let beyond_top = if up { b.close > top } else { b.close < top };
        let extreme = if up { b.low } else { b.high };
        let retrace = sign * (top - extreme) / pole * 100.0;
        if beyond_top || retrace > p.flag_max_retrace_pct {
            break;
        }
        worst_retrace = worst_retrace.max(retrace);
        flag_end = i;
    }
    if flag_end - pole_end < MIN_FLAG_BARS {
        return None;
    }

    // Counter-trend drift of the consolidation closes.
    let flag_bars = &bars[pole_end + 1..=flag_end];
    let drift = flag_bars.last()?.close - flag_bars.first()?.close;
    if sign * drift > 0.0 {
        return None;
    }
    let retrace_score = score_at_most(worst_retrace.max(0.0), p.flag_max_retrace_pct)?;

    let channel = if up {
        flag_bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max)
    } else {
        flag_bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min)
    };
    let (end, factor) = match find_breakout(bars, flag_end, flag_end.saturating_add(p.flag_max_bars), channel, up) {
        Some(i) => (i, 1.0),
        None if p.require_breakout => return None,
        None => (flag_end, UNCONFIRMED_FACTOR),
    };

    Some(PatternEvent {
        kind: if up { PatternKind::BullFlag } else { PatternKind::BearFlag },
        start_index: pole_start,
        end_index: end,
        direction: if up { Direction::Bullish } else { Direction::Bearish },
        confidence: confidence(&[pole_score, retrace_score], factor, volume_bonus(bars, end, p.volume_window)),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::tests::path;

    fn kinds(events: &[PatternEvent]) -> Vec<PatternKind> {
        events.iter().map(|e| e.kind).collect()
    }

    fn detect(bars: &[Bar], params: &PatternParams) -> Vec<PatternEvent> {
        match_all(&chart_templates(params), &pivot_sequence(bars, 5), bars, 5, params)
    }

    #[test]
    fn pivots_alternate() {
        let bars = path(&[(0, 100.0), (12, 110.0), (24, 100.0), (36, 112.0), (48, 98.0), (60, 105.0)], 1.0);
        let pivots = pivot_sequence(&bars, 5);
        assert!(pivots.len() >= 3);
        for pair in pivots.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind);
            assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn double_bottom_with_breakout() {
        let bars = path(&[(0, 120.0), (15, 100.0), (25, 112.0), (35, 100.0), (59, 125.0)], 1.0);
        let events = detect(&bars, &PatternParams::default());
        let bottom = events.iter().find(|e| e.kind == PatternKind::DoubleBottom).unwrap();
        assert_eq!(bottom.direction, Direction::Bullish);
        assert!(bars[bottom.end_index].close > 112.0);
    }

    #[test]
    fn unconfirmed_reversal_needs_permission() {
        // Second top, then only a shallow pullback: no close under the trough.
        let bars = path(&[(0, 100.0), (15, 120.0), (25, 108.0), (35, 120.0), (48, 112.0)], 1.0);
        let strict = PatternParams::default();
        assert!(!kinds(&detect(&bars, &strict)).contains(&PatternKind::DoubleTop));

        let lenient = PatternParams {
            require_breakout: false,
            ..PatternParams::default()
        };
        let events = detect(&bars, &lenient);
        let top = events.iter().find(|e| e.kind == PatternKind::DoubleTop).unwrap();
        assert!(top.confidence <= UNCONFIRMED_FACTOR + 0.1);
    }

    #[test]
    fn head_and_shoulders() {
        let bars = path(
            &[(0, 90.0), (10, 110.0), (18, 100.0), (28, 120.0), (38, 100.0), (46, 110.0), (70, 85.0)],
            1.0,
        );
        let events = detect(&bars, &PatternParams::default());
        let hs = events.iter().find(|e| e.kind == PatternKind::HeadAndShoulders).unwrap();
        assert_eq!(hs.direction, Direction::Bearish);
        assert_eq!(hs.start_index, 10);
    }

    #[test]
    fn ascending_triangle() {
        let bars = path(
            &[(0, 95.0), (10, 110.0), (20, 100.0), (30, 110.0), (40, 104.0), (50, 118.0)],
            1.0,
        );
        let events = detect(&bars, &PatternParams::default());
        assert!(kinds(&events).contains(&PatternKind::AscendingTriangle));
        assert!(!kinds(&events).contains(&PatternKind::DescendingTriangle));
    }

    #[test]
    fn bull_flag() {
        // 10-bar pole of +20%, five-bar drift lower, then a breakout.
        let bars = path(&[(0, 100.0), (10, 100.0), (20, 120.0), (25, 117.0), (30, 126.0)], 1.0);
        let events = match_flags(&bars, &PatternParams::default());
        let flag = events.iter().find(|e| e.kind == PatternKind::BullFlag).unwrap();
        assert_eq!(flag.direction, Direction::Bullish);
        assert!(flag.end_index > 20);
    }
}

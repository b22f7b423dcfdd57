// =============================================================================
// Swings and Break of Structure
// =============================================================================
//
// Walking forward bar by bar, a swing joins the "known" set at its
// confirmation bar (index + window). A close above the latest unbroken known
// swing high is a bullish BOS; a close below the latest unbroken known swing
// low a bearish one. Every known level the close clears is consumed, so no
// level is broken twice; one event is recorded per bar and direction,
// referencing the most recent level broken.
//
// The structure state starts at NoTrend and follows the last BOS direction.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::statistical::{Extremum, ExtremumKind};
use crate::market_data::Bar;
use crate::structure::{StructureZone, ZoneKind};
use crate::types::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureState {
    NoTrend,
    Bullish,
    Bearish,
}

impl StructureState {
    pub fn direction(self) -> Direction {
        match self {
            Self::NoTrend => Direction::Neutral,
            Self::Bullish => Direction::Bullish,
            Self::Bearish => Direction::Bearish,
        }
    }
}

impl Default for StructureState {
    fn default() -> Self {
        Self::NoTrend
    }
}

/// A close through a known swing level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BosEvent {
    pub index: usize,
    pub direction: Direction,
    pub level: f64,
    pub swing_index: usize,
}

/// Result of the forward walk.
#[derive(Debug, Clone, PartialEq)]
pub struct BosWalk {
    pub events: Vec<BosEvent>,
    pub state: StructureState,
    /// Bar that broke each swing, parallel to the input extrema.
    pub broken_at: Vec<Option<usize>>,
}

pub fn break_of_structure(bars: &[Bar], extrema: &[Extremum], window: usize) -> BosWalk {
    let mut events = Vec::new();
    let mut state = StructureState::NoTrend;
    let mut broken_at: Vec<Option<usize>> = vec![None; extrema.len()];

    // Positions into `extrema` of known, unbroken levels (in index order).
    let mut open_highs: Vec<usize> = Vec::new();
    let mut open_lows: Vec<usize> = Vec::new();
    let mut next = 0usize;

    for (t, bar) in bars.iter().enumerate() {
        while next < extrema.len() && extrema[next].confirmed_at(window) <= t {
            match extrema[next].kind {
                ExtremumKind::High => open_highs.push(next),
                ExtremumKind::Low => open_lows.push(next),
            }
            next += 1;
        }

        if let Some(event) = consume(&mut open_highs, extrema, &mut broken_at, t, |level| bar.close > level) {
            events.push(BosEvent {
                direction: Direction::Bullish,
                ..event
            });
            state = StructureState::Bullish;
        }
        if let Some(event) = consume(&mut open_lows, extrema, &mut broken_at, t, |level| bar.close < level) {
            events.push(BosEvent {
                direction: Direction::Bearish,
                ..event
            });
            state = StructureState::Bearish;
        }
    }

    BosWalk {
        events,
        state,
        broken_at,
    }
}

/// Consume every open level `beyond` accepts; returns an event for the most
/// recent one if the latest open level was among them.
fn consume<F>(
    open: &mut Vec<usize>,
    extrema: &[Extremum],
    broken_at: &mut [Option<usize>],
    t: usize,
    beyond: F,
) -> Option<BosEvent>
where
    F: Fn(f64) -> bool,
{
    let latest = *open.last()?;
    if !beyond(extrema[latest].price) {
        return None;
    }
    open.retain(|&pos| {
        if beyond(extrema[pos].price) {
            broken_at[pos] = Some(t);
            false
        } else {
            true
        }
    });
    Some(BosEvent {
        index: t,
        direction: Direction::Neutral,
        level: extrema[latest].price,
        swing_index: extrema[latest].index,
    })
}

/// One zone per swing; a broken swing is inactive from its breaking bar.
pub fn swing_zones(extrema: &[Extremum], broken_at: &[Option<usize>]) -> Vec<StructureZone> {
    extrema
        .iter()
        .zip(broken_at)
        .map(|(e, broken)| {
            let (kind, direction) = match e.kind {
                ExtremumKind::High => (ZoneKind::SwingHigh, Direction::Bearish),
                ExtremumKind::Low => (ZoneKind::SwingLow, Direction::Bullish),
            };
            StructureZone {
                kind,
                direction,
                price_low: e.price,
                price_high: e.price,
                formation_index: e.index,
                active: broken.is_none(),
                invalidated_index: *broken,
            }
        })
        .collect()
}

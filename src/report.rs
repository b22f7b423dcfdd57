// =============================================================================
// Analysis Report — the immutable result of one (symbol, timeframes) request
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::market_data::Timeframe;
use crate::pipeline::TimeframeAnalysis;
use crate::signals::CompositeSignal;
use crate::types::Direction;

/// Outcome for one requested timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeframeResult {
    Ready(Box<TimeframeAnalysis>),
    Unavailable { reason: String },
}

impl TimeframeResult {
    pub fn analysis(&self) -> Option<&TimeframeAnalysis> {
        match self {
            Self::Ready(analysis) => Some(analysis),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Agreement between the per-timeframe verdicts. Disagreement is surfaced,
/// not resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Every directional verdict points the same way.
    Aligned,
    /// At least one bullish and one bearish verdict.
    Conflicting,
    /// No timeframe produced a directional verdict.
    Undetermined,
}

impl Alignment {
    pub fn from_directions<I: IntoIterator<Item = Direction>>(directions: I) -> Self {
        let (mut bull, mut bear) = (false, false);
        for d in directions {
            match d {
                Direction::Bullish => bull = true,
                Direction::Bearish => bear = true,
                Direction::Neutral => {}
            }
        }
        match (bull, bear) {
            (true, true) => Self::Conflicting,
            (false, false) => Self::Undetermined,
            _ => Self::Aligned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub timeframes: BTreeMap<Timeframe, TimeframeResult>,
    pub alignment: Alignment,
    pub signal: CompositeSignal,
}

impl AnalysisReport {
    pub fn ready(&self) -> impl Iterator<Item = (Timeframe, &TimeframeAnalysis)> {
        self.timeframes.iter().filter_map(|(tf, r)| r.analysis().map(|a| (*tf, a)))
    }

    pub fn unavailable(&self) -> impl Iterator<Item = (Timeframe, &str)> {
        self.timeframes.iter().filter_map(|(tf, r)| match r {
            TimeframeResult::Unavailable { reason } => Some((*tf, reason.as_str())),
            TimeframeResult::Ready(_) => None,
        })
    }

    pub fn get(&self, timeframe: Timeframe) -> Option<&TimeframeAnalysis> {
        self.timeframes.get(&timeframe)?.analysis()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let frames: Vec<String> = self
            .timeframes
            .iter()
            .map(|(tf, r)| match r.analysis() {
                Some(a) => format!("{tf}={:+.2}", a.signal.score),
                None => format!("{tf}=n/a"),
            })
            .collect();
        format!(
            "{} {} ({:+.3}) {:?} [{}]",
            self.symbol,
            self.signal.recommendation,
            self.signal.score,
            self.alignment,
            frames.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Recommendation;

    #[test]
    fn alignment_rules() {
        use Direction::*;
        assert_eq!(Alignment::from_directions([Bullish, Neutral, Bullish]), Alignment::Aligned);
        assert_eq!(Alignment::from_directions([Bearish, Bullish]), Alignment::Conflicting);
        assert_eq!(Alignment::from_directions([Neutral]), Alignment::Undetermined);
        assert_eq!(Alignment::from_directions(Vec::new()), Alignment::Undetermined);
    }

    #[test]
    fn unavailable_timeframe_serialises_with_status() {
        let mut timeframes = BTreeMap::new();
        timeframes.insert(
            Timeframe::H4,
            TimeframeResult::Unavailable {
                reason: "no source bars".into(),
            },
        );
        let report = AnalysisReport {
            symbol: "X".into(),
            timeframes,
            alignment: Alignment::Undetermined,
            signal: CompositeSignal {
                score: 0.0,
                recommendation: Recommendation::Neutral,
                direction: Direction::Neutral,
                timeframes: Vec::new(),
                insufficient_data: true,
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["timeframes"]["4h"]["status"], "unavailable");
        assert_eq!(json["alignment"], "undetermined");
        assert_eq!(report.unavailable().count(), 1);
        assert!(report.summary().starts_with("X NEUTRAL"));

        let back: AnalysisReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}

// =============================================================================
// Signal Aggregator
// =============================================================================
//
// Reduces one timeframe's analysis to a verdict:
// - indicator classification (classify.rs)
// - recent pattern events, netted with half-life decay
// - structure state, decayed by bars since the last BOS
// - weighted composite score and recommendation band (weighted_score.rs)
//
// and combines per-timeframe verdicts into one cross-timeframe verdict.
// The aggregator never fails: with no indicator input available the verdict
// is neutral and flagged `insufficient_data`, whatever patterns or structure
// say.

pub mod classify;
pub mod signal_decay;
pub mod weighted_score;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::analysis_config::{AnalysisConfig, IndicatorParams, SignalParams};
use crate::indicators::IndicatorTable;
use crate::market_data::{SeriesStore, Timeframe};
use crate::patterns::PatternEvent;
use crate::structure::{StructureAnalysis, StructureState};
use crate::types::{Direction, Recommendation};

pub use classify::{classify_indicators, INDICATOR_INPUTS};
pub use signal_decay::{decay_factor, net_decayed};
pub use weighted_score::{band, ScoringResult, SignalContribution, SignalInput, WeightedScorer};

/// Per-timeframe verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalVerdict {
    pub score: f64,
    pub recommendation: Recommendation,
    pub direction: Direction,
    /// Largest |contribution| first.
    pub contributions: Vec<SignalContribution>,
    /// Inputs that had nothing to read on this timeframe.
    pub unavailable: Vec<String>,
    pub insufficient_data: bool,
}

impl SignalVerdict {
    pub fn insufficient(unavailable: Vec<String>) -> Self {
        Self {
            score: 0.0,
            recommendation: Recommendation::Neutral,
            direction: Direction::Neutral,
            contributions: Vec::new(),
            unavailable,
            insufficient_data: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeContribution {
    pub timeframe: Timeframe,
    pub weight: f64,
    pub score: f64,
}

/// Verdict across timeframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub score: f64,
    pub recommendation: Recommendation,
    pub direction: Direction,
    pub timeframes: Vec<TimeframeContribution>,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone)]
pub struct SignalAggregator {
    params: SignalParams,
    indicators: IndicatorParams,
    scorer: WeightedScorer,
}

impl SignalAggregator {
    pub fn new(params: &SignalParams, indicators: &IndicatorParams) -> Self {
        Self {
            scorer: WeightedScorer::new(params.weights.clone(), params.bands.clone()),
            params: params.clone(),
            indicators: indicators.clone(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(&config.signals, &config.indicators)
    }

    pub fn aggregate(
        &self,
        store: &SeriesStore,
        table: &IndicatorTable,
        patterns: &[PatternEvent],
        structure: &StructureAnalysis,
    ) -> SignalVerdict {
        let (mut inputs, mut unavailable) =
            classify_indicators(store, table, &self.indicators, &self.params.thresholds);

        // Patterns and structure only adjust an indicator-backed verdict.
        if inputs.is_empty() {
            debug!(series = %store.meta(), "no indicator inputs available");
            unavailable.extend(["patterns".to_string(), "structure".to_string()]);
            return SignalVerdict::insufficient(unavailable);
        }

        match self.pattern_input(patterns, store.len()) {
            Some(input) => inputs.push(input),
            None => unavailable.push("patterns".to_string()),
        }
        match self.structure_input(structure, store.len()) {
            Some(input) => inputs.push(input),
            None => unavailable.push("structure".to_string()),
        }

        let scored = self.scorer.score(&inputs);
        for c in &scored.contributions {
            trace!(name = %c.name, weight = c.weight, confidence = c.confidence, direction = %c.direction, "contribution");
        }
        debug!(
            series = %store.meta(),
            score = format!("{:.3}", scored.total_score),
            recommendation = %scored.recommendation,
            inputs = inputs.len(),
            unavailable = unavailable.len(),
            "signal aggregated"
        );

        SignalVerdict {
            score: scored.total_score,
            direction: scored.recommendation.direction(),
            recommendation: scored.recommendation,
            contributions: scored.contributions,
            unavailable,
            insufficient_data: false,
        }
    }

    /// Net of pattern events that ended within the lookback.
    fn pattern_input(&self, patterns: &[PatternEvent], len: usize) -> Option<SignalInput> {
        let lookback = self.params.pattern_lookback_bars;
        let recent: Vec<&PatternEvent> = patterns.iter().filter(|e| e.age(len) <= lookback).collect();
        let (direction, confidence) = net_decayed(
            recent.iter().map(|e| (e.direction, e.confidence, e.age(len))),
            self.params.pattern_half_life_bars,
        )?;
        Some(SignalInput::new(
            "patterns",
            direction,
            confidence,
            format!("{} recent pattern(s)", recent.len()),
        ))
    }

    /// Structure state, fading with bars since the BOS that set it.
    fn structure_input(&self, structure: &StructureAnalysis, len: usize) -> Option<SignalInput> {
        if structure.state == StructureState::NoTrend {
            return None;
        }
        let bos = structure.last_bos_index?;
        let age = len.saturating_sub(1).saturating_sub(bos);
        let confidence = decay_factor(age, self.params.structure_half_life_bars);
        Some(SignalInput::new(
            "structure",
            structure.state.direction(),
            confidence,
            format!("{:?} structure, last BOS {age} bar(s) ago", structure.state),
        ))
    }

    /// Weighted mean of per-timeframe scores; timeframes without data are
    /// skipped.
    pub fn combine<'a, I>(&self, verdicts: I) -> CompositeSignal
    where
        I: IntoIterator<Item = (Timeframe, &'a SignalVerdict)>,
    {
        let timeframes: Vec<TimeframeContribution> = verdicts
            .into_iter()
            .filter(|(_, v)| !v.insufficient_data)
            .map(|(timeframe, v)| TimeframeContribution {
                timeframe,
                weight: self.params.timeframe_weights.get(timeframe),
                score: v.score,
            })
            .collect();

        let weight_sum: f64 = timeframes.iter().map(|t| t.weight).sum();
        if timeframes.is_empty() || weight_sum <= 0.0 {
            return CompositeSignal {
                score: 0.0,
                recommendation: Recommendation::Neutral,
                direction: Direction::Neutral,
                insufficient_data: timeframes.is_empty(),
                timeframes,
            };
        }

        let score = (timeframes.iter().map(|t| t.weight * t.score).sum::<f64>() / weight_sum).clamp(-1.0, 1.0);
        let recommendation = band(score, &self.params.bands);
        CompositeSignal {
            score,
            recommendation,
            direction: recommendation.direction(),
            timeframes,
            insufficient_data: false,
        }
    }
}

// =============================================================================
// Weighted Ensemble Scorer — composite score and recommendation band
// =============================================================================
//
//   score = Σ(weight × confidence × direction) / Σ(weight)
//
// over the inputs that are available. Confidence is in [0, 1] and direction
// in {-1, 0, +1}, so the score stays in [-1, 1]. Inputs whose name has no
// weight in the table take part with weight 0.

use serde::{Deserialize, Serialize};

use crate::analysis_config::{SignalBands, SignalWeights};
use crate::types::{Direction, Recommendation};

/// One classified input to the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalInput {
    pub name: String,
    pub direction: Direction,
    pub confidence: f64,
    /// Human-readable reason, e.g. "rsi 74.2 above 70".
    pub reason: String,
}

impl SignalInput {
    pub fn new(name: impl Into<String>, direction: Direction, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}

/// The contribution of a single input to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub name: String,
    pub weight: f64,
    pub confidence: f64,
    pub direction: Direction,
    /// weight × confidence × direction, before normalisation.
    pub contribution: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub total_score: f64,
    pub recommendation: Recommendation,
    /// Sorted by descending |contribution|.
    pub contributions: Vec<SignalContribution>,
}

#[derive(Debug, Clone)]
pub struct WeightedScorer {
    weights: SignalWeights,
    bands: SignalBands,
}

impl WeightedScorer {
    pub fn new(weights: SignalWeights, bands: SignalBands) -> Self {
        Self { weights, bands }
    }

    pub fn score(&self, inputs: &[SignalInput]) -> ScoringResult {
        let mut contributions: Vec<SignalContribution> = inputs
            .iter()
            .map(|input| {
                let weight = self.weights.get(&input.name);
                SignalContribution {
                    name: input.name.clone(),
                    weight,
                    confidence: input.confidence,
                    direction: input.direction,
                    contribution: weight * input.confidence * input.direction.sign(),
                    reason: input.reason.clone(),
                }
            })
            .collect();

        let weight_sum: f64 = contributions.iter().map(|c| c.weight).sum();
        let total_score = if weight_sum > 0.0 {
            (contributions.iter().map(|c| c.contribution).sum::<f64>() / weight_sum).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        contributions.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));

        ScoringResult {
            total_score,
            recommendation: band(total_score, &self.bands),
            contributions,
        }
    }
}

impl Default for WeightedScorer {
    fn default() -> Self {
        Self::new(SignalWeights::default(), SignalBands::default())
    }
}

/// Map a composite score onto the recommendation bands.
pub fn band(score: f64, bands: &SignalBands) -> Recommendation {
    if score >= bands.strong_buy {
        Recommendation::StrongBuy
    } else if score >= bands.buy {
        Recommendation::Buy
    } else if score <= bands.strong_sell {
        Recommendation::StrongSell
    } else if score <= bands.sell {
        Recommendation::Sell
    } else {
        Recommendation::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, direction: Direction, confidence: f64) -> SignalInput {
        SignalInput::new(name, direction, confidence, "")
    }

    #[test]
    fn score_is_normalised_by_weight() {
        let scorer = WeightedScorer::default();
        // ma_alignment 0.25 bullish full, rsi 0.10 bearish full
        let result = scorer.score(&[
            input("ma_alignment", Direction::Bullish, 1.0),
            input("rsi", Direction::Bearish, 1.0),
        ]);
        assert!((result.total_score - 0.15 / 0.35).abs() < 1e-12);
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.contributions[0].name, "ma_alignment");
    }

    #[test]
    fn unanimous_inputs_hit_the_extreme() {
        let scorer = WeightedScorer::default();
        let result = scorer.score(&[
            input("macd", Direction::Bearish, 1.0),
            input("adx", Direction::Bearish, 1.0),
        ]);
        assert!((result.total_score + 1.0).abs() < 1e-12);
        assert_eq!(result.recommendation, Recommendation::StrongSell);
    }

    #[test]
    fn unknown_names_weigh_nothing() {
        let scorer = WeightedScorer::default();
        let result = scorer.score(&[input("mystery", Direction::Bullish, 1.0)]);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.recommendation, Recommendation::Neutral);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let bands = SignalBands::default();
        assert_eq!(band(0.6, &bands), Recommendation::StrongBuy);
        assert_eq!(band(0.2, &bands), Recommendation::Buy);
        assert_eq!(band(0.19, &bands), Recommendation::Neutral);
        assert_eq!(band(-0.2, &bands), Recommendation::Sell);
        assert_eq!(band(-0.6, &bands), Recommendation::StrongSell);
    }
}

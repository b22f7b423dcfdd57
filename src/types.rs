// =============================================================================
// Shared types used across the Aurora analysis engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Directional bias of a signal, pattern or structure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// +1.0 for bullish, -1.0 for bearish, 0.0 for neutral.
    pub fn sign(self) -> f64 {
        match self {
            Self::Bullish => 1.0,
            Self::Bearish => -1.0,
            Self::Neutral => 0.0,
        }
    }

    /// Classify a signed value; magnitudes at or below `dead_band` are neutral.
    pub fn from_value(value: f64, dead_band: f64) -> Self {
        if value > dead_band {
            Self::Bullish
        } else if value < -dead_band {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Bullish => Self::Bearish,
            Self::Bearish => Self::Bullish,
            Self::Neutral => Self::Neutral,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Discrete recommendation derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Recommendation {
    pub fn direction(self) -> Direction {
        match self {
            Self::StrongBuy | Self::Buy => Direction::Bullish,
            Self::StrongSell | Self::Sell => Direction::Bearish,
            Self::Neutral => Direction::Neutral,
        }
    }
}

impl Default for Recommendation {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "STRONG_BUY"),
            Self::Buy => write!(f, "BUY"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Sell => write!(f, "SELL"),
            Self::StrongSell => write!(f, "STRONG_SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_from_value_respects_dead_band() {
        assert_eq!(Direction::from_value(0.3, 0.1), Direction::Bullish);
        assert_eq!(Direction::from_value(-0.3, 0.1), Direction::Bearish);
        assert_eq!(Direction::from_value(0.05, 0.1), Direction::Neutral);
        assert_eq!(Direction::from_value(0.0, 0.0), Direction::Neutral);
    }

    #[test]
    fn recommendation_serialises_snake_case() {
        let json = serde_json::to_string(&Recommendation::StrongBuy).unwrap();
        assert_eq!(json, "\"strong_buy\"");
        assert_eq!(Recommendation::Sell.direction(), Direction::Bearish);
    }
}

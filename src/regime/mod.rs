// =============================================================================
// Regime Detection Module
// =============================================================================
//
// Market regime label from:
// - ADX (trend strength)
// - Bollinger Band Width (volatility expansion/contraction)
// - Hurst exponent (persistence vs mean-reversion)
// - Shannon entropy of candle direction (randomness)

pub mod detector;
pub mod entropy;
pub mod hurst;

pub use detector::{detect_regime, MarketRegime, RegimeState};
pub use entropy::candle_entropy;
pub use hurst::calculate_hurst_exponent;

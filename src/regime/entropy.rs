// =============================================================================
// Candle-Direction Entropy
// =============================================================================
//
// Each candle is UP (close > open) or DOWN (close <= open). The binary Shannon
// entropy of that split over the last `window` bars measures how random the
// tape is:
//
//   H = -p_up * log2(p_up) - p_down * log2(p_down)
//
// H = 1.0 is a perfect 50/50 split; H = 0.0 is one-directional.

use tracing::trace;

use crate::market_data::Bar;

pub const DEFAULT_WINDOW: usize = 50;

/// Entropy over the last `window` bars; `None` when fewer bars exist.
pub fn candle_entropy(bars: &[Bar], window: usize) -> Option<f64> {
    if window == 0 || bars.len() < window {
        return None;
    }
    let recent = &bars[bars.len() - window..];
    let up = recent.iter().filter(|b| b.is_bullish()).count();
    let p_up = up as f64 / window as f64;
    let entropy = binary_entropy(p_up);
    trace!(p_up = format!("{:.4}", p_up), entropy = format!("{:.4}", entropy), window, "candle entropy");
    Some(entropy)
}

#[inline]
fn binary_entropy(p: f64) -> f64 {
    let term = |x: f64| if x > 0.0 { -x * x.log2() } else { 0.0 };
    term(p) + term(1.0 - p)
}

// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// TR needs a previous close, so the first TR is at bar 1 and the first ATR
// at bar `period`.
// =============================================================================

use crate::indicators::moving_average::wilder_opt;
use crate::market_data::Bar;

/// True range per bar; bar 0 has no previous close and is `None`.
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    for i in 1..bars.len() {
        out[i] = Some(bars[i].true_range(bars[i - 1].close));
    }
    out
}

/// ATR series aligned with `bars`.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    wilder_opt(&true_range(bars), period)
}

/// ATR as a percentage of the bar's close.
///
/// Useful for comparing volatility across assets with different price scales.
pub fn calculate_atr_pct(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    calculate_atr(bars, period)
        .into_iter()
        .zip(bars)
        .map(|(atr, bar)| {
            let atr = atr?;
            if bar.close == 0.0 {
                None
            } else {
                Some(atr / bar.close * 100.0)
            }
        })
        .collect()
}

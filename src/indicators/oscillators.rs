// =============================================================================
// Bounded Oscillators — Stochastic, CCI, Williams %R, Money Flow Index
// =============================================================================
//
// All four use simple rolling windows:
//
//   %K  = 100 * (close - LL_n) / (HH_n - LL_n)          first value at n - 1
//   %D  = SMA_d(%K)                                     first value at n + d - 2
//   %R  = -100 * (HH_n - close) / (HH_n - LL_n)         first value at n - 1
//   CCI = (TP - SMA_n(TP)) / (0.015 * MeanDev_n(TP))    first value at n - 1
//   MFI = 100 - 100 / (1 + posFlow_n / negFlow_n)       first value at n
//
// with TP = (H + L + C) / 3. A flat window (HH == LL, zero mean deviation,
// no money flow either way) has no value.
// =============================================================================

use crate::indicators::moving_average::{lift, rolling, sma_opt};
use crate::market_data::Bar;

/// Lambert's constant, scales CCI so ~70-80% of readings fall within ±100.
const CCI_CONSTANT: f64 = 0.015;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Highest high / lowest low of the window ending at `end`.
fn window_extremes(bars: &[Bar], end: usize, period: usize) -> (f64, f64) {
    bars[end + 1 - period..=end]
        .iter()
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(hh, ll), b| {
            (hh.max(b.high), ll.min(b.low))
        })
}

fn range_position<F>(bars: &[Bar], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64, f64) -> f64,
{
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }
    for end in (period - 1)..bars.len() {
        let (hh, ll) = window_extremes(bars, end, period);
        if hh > ll {
            out[end] = Some(f(bars[end].close, hh, ll)).filter(|x| x.is_finite());
        }
    }
    out
}

pub fn calculate_stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticSeries {
    let k = range_position(bars, k_period, |close, hh, ll| 100.0 * (close - ll) / (hh - ll));
    let d = sma_opt(&k, d_period);
    StochasticSeries { k, d }
}

pub fn calculate_williams_r(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    range_position(bars, period, |close, hh, ll| -100.0 * (hh - close) / (hh - ll))
}

pub fn calculate_cci(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
    rolling(&lift(&typical), period, |window| {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let mean_dev = window.iter().map(|x| (x - mean).abs()).sum::<f64>() / n;
        if mean_dev == 0.0 {
            return None;
        }
        let last = *window.last()?;
        Some((last - mean) / (CCI_CONSTANT * mean_dev))
    })
}

pub fn calculate_mfi(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
    // Signed raw money flow into bar i (i >= 1); zero when TP is unchanged.
    let flows: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            if i == 0 {
                return (0.0, 0.0);
            }
            let raw = typical[i] * bars[i].volume;
            if typical[i] > typical[i - 1] {
                (raw, 0.0)
            } else if typical[i] < typical[i - 1] {
                (0.0, raw)
            } else {
                (0.0, 0.0)
            }
        })
        .collect();

    for end in period..n {
        let (pos, neg) = flows[end + 1 - period..=end]
            .iter()
            .fold((0.0, 0.0), |(p, q), (a, b)| (p + a, q + b));
        // No flow either way (0/0) leaves the bar unavailable.
        let mfi = match (pos == 0.0, neg == 0.0) {
            (true, true) => None,
            (_, true) => Some(100.0),
            _ => Some(100.0 - 100.0 / (1.0 + pos / neg)),
        };
        out[end] = mfi.filter(|x| x.is_finite()).map(|x| x.clamp(0.0, 100.0));
    }
    out
}

// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   line      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal_period) of the line
//   histogram = line - signal
//
// Both EMAs are SMA-seeded, so the line starts at bar `slow - 1` and the
// signal/histogram at bar `slow + signal - 2` (25 and 33 for 12/26/9).
// =============================================================================

use crate::indicators::moving_average::{ema, ema_opt};

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = ema_opt(&line, signal_period);
    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_warmups() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.2).sin()).collect();
        let m = calculate_macd(&closes, 12, 26, 9);
        assert!(m.line[..25].iter().all(Option::is_none));
        assert!(m.line[25].is_some());
        assert!(m.signal[..33].iter().all(Option::is_none));
        assert!(m.signal[33].is_some());
        assert!(m.histogram[33].is_some());
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (1..=80).map(|x| x as f64).collect();
        let m = calculate_macd(&closes, 12, 26, 9);
        assert!(m.line.last().copied().flatten().unwrap() > 0.0);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..70).map(|i| 50.0 + (i as f64 * 0.3).cos() * 4.0).collect();
        let m = calculate_macd(&closes, 12, 26, 9);
        let i = 50;
        let expected = m.line[i].unwrap() - m.signal[i].unwrap();
        assert!((m.histogram[i].unwrap() - expected).abs() < 1e-12);
    }
}

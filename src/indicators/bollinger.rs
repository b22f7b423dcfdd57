// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), with σ the population standard deviation of
// the same window. Derived series:
//   BBW = (upper - lower) / middle * 100
//   %B  = (close - lower) / (upper - lower)
//
// BBW is the primary metric used by the regime detector; %B feeds the
// signal classifier (> 1 stretched above the band, < 0 below).
// =============================================================================

use crate::indicators::moving_average::{lift, rolling};

/// Aligned Bollinger outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub width: Vec<Option<f64>>,
    pub percent_b: Vec<Option<f64>>,
}

/// Population mean and standard deviation of a window.
pub(crate) fn mean_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// `width` is unavailable where the middle band is zero; `percent_b` where
/// the bands collapse onto each other (zero deviation).
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let lifted = lift(closes);
    let middle = rolling(&lifted, period, |w| Some(mean_std(w).0));
    let deviation = rolling(&lifted, period, |w| Some(mean_std(w).1));

    let n = closes.len();
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut width = vec![None; n];
    let mut percent_b = vec![None; n];

    for i in 0..n {
        let (Some(mid), Some(sd)) = (middle[i], deviation[i]) else {
            continue;
        };
        let up = mid + num_std * sd;
        let lo = mid - num_std * sd;
        upper[i] = Some(up);
        lower[i] = Some(lo);

        if mid != 0.0 {
            width[i] = Some((up - lo) / mid * 100.0).filter(|x| x.is_finite());
        }
        if up != lo {
            percent_b[i] = Some((closes[i] - lo) / (up - lo)).filter(|x| x.is_finite());
        }
    }

    BollingerSeries {
        upper,
        middle,
        lower,
        width,
        percent_b,
    }
}

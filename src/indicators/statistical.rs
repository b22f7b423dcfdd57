// =============================================================================
// Statistical Indicators — stddev, linear regression, z-score, local extrema
// =============================================================================
//
// Rolling windows of `n` closes, x = 0..n-1 inside the window:
//   stddev = population standard deviation
//   slope  = least-squares slope (price units per bar)
//   R²     = 1 - SS_res / SS_tot            (unavailable for a flat window)
//   z      = (close - mean) / stddev        (unavailable for zero deviation)
//
// Local extrema with window w: bar i is a swing high when its high is strictly
// greater than each of the previous w highs and >= each of the next w highs,
// so on a plateau the earliest bar wins. Lows are symmetric. A swing is only
// known w bars later; the marker series flag the confirmation bar i + w.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::bollinger::mean_std;
use crate::indicators::moving_average::{lift, rolling};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    High,
    Low,
}

/// A confirmed local extremum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub index: usize,
    pub price: f64,
    pub kind: ExtremumKind,
}

impl Extremum {
    /// First bar at which this extremum is known.
    pub fn confirmed_at(&self, window: usize) -> usize {
        self.index + window
    }
}

pub fn calculate_stddev(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(&lift(closes), period, |w| Some(mean_std(w).1))
}

/// Least-squares fit of a window against x = 0..n-1: (slope, R²).
fn regression(window: &[f64]) -> (f64, Option<f64>) {
    let n = window.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = window.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in window.iter().enumerate() {
        let dx = x as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };

    let ss_tot: f64 = window.iter().map(|y| (y - y_mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return (slope, None);
    }
    let intercept = y_mean - slope * x_mean;
    let ss_res: f64 = window
        .iter()
        .enumerate()
        .map(|(x, y)| (y - (intercept + slope * x as f64)).powi(2))
        .sum();
    (slope, Some((1.0 - ss_res / ss_tot).clamp(0.0, 1.0)))
}

pub fn calculate_linreg_slope(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; closes.len()];
    }
    rolling(&lift(closes), period, |w| Some(regression(w).0))
}

pub fn calculate_linreg_r2(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; closes.len()];
    }
    rolling(&lift(closes), period, |w| regression(w).1)
}

pub fn calculate_zscore(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(&lift(closes), period, |w| {
        let (mean, sd) = mean_std(w);
        if sd == 0.0 {
            return None;
        }
        Some((*w.last()? - mean) / sd)
    })
}

/// Confirmed swing highs and lows, ordered by index (a high before a low on
/// the same bar).
pub fn find_extrema(highs: &[f64], lows: &[f64], window: usize) -> Vec<Extremum> {
    let n = highs.len().min(lows.len());
    let mut out = Vec::new();
    if window == 0 || n < 2 * window + 1 {
        return out;
    }

    for i in window..n - window {
        let before = i - window..i;
        let after = i + 1..=i + window;

        let h = highs[i];
        if highs[before.clone()].iter().all(|&p| h > p) && highs[after.clone()].iter().all(|&p| h >= p) {
            out.push(Extremum {
                index: i,
                price: h,
                kind: ExtremumKind::High,
            });
        }

        let l = lows[i];
        if lows[before].iter().all(|&p| l < p) && lows[after].iter().all(|&p| l <= p) {
            out.push(Extremum {
                index: i,
                price: l,
                kind: ExtremumKind::Low,
            });
        }
    }
    out
}

/// 1.0 / 0.0 marker series flagging the confirmation bar of each swing of
/// `kind`. Bars before `2 * window` carry no value.
pub fn swing_markers(extrema: &[Extremum], kind: ExtremumKind, window: usize, len: usize) -> Vec<Option<f64>> {
    let mut out: Vec<Option<f64>> = (0..len)
        .map(|i| if i >= 2 * window { Some(0.0) } else { None })
        .collect();
    for e in extrema.iter().filter(|e| e.kind == kind) {
        if let Some(slot) = out.get_mut(e.confirmed_at(window)) {
            *slot = Some(1.0);
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- regression / zscore ---------------------------------------------

    #[test]
    fn linear_series_has_unit_r2() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + 2.0 * i as f64).collect();
        let slope = calculate_linreg_slope(&closes, 20);
        let r2 = calculate_linreg_r2(&closes, 20);
        assert_eq!(slope.iter().position(Option::is_some), Some(19));
        assert!((slope[29].unwrap() - 2.0).abs() < 1e-10);
        assert!((r2[29].unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn flat_window_has_no_r2_or_zscore() {
        let closes = vec![5.0; 25];
        assert_eq!(calculate_linreg_r2(&closes, 20)[24], None);
        assert_eq!(calculate_zscore(&closes, 20)[24], None);
        assert!((calculate_linreg_slope(&closes, 20)[24].unwrap()).abs() < 1e-12);
    }

    #[test]
    fn zscore_of_linear_window_is_below_two() {
        let closes: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let z = calculate_zscore(&closes, 20)[19].unwrap();
        assert!(z > 1.5 && z < 2.0, "got {z}");
    }

    #[test]
    fn stddev_known_value() {
        let sd = calculate_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        assert!((sd[7].unwrap() - 2.0).abs() < 1e-12);
    }

    // ---- extrema ---------------------------------------------------------

    #[test]
    fn finds_single_peak_and_trough() {
        let highs = vec![1.0, 2.0, 5.0, 2.0, 1.0, 0.5, 1.0];
        let lows = vec![0.5, 1.5, 4.0, 1.5, 0.5, 0.1, 0.5];
        let ext = find_extrema(&highs, &lows, 2);
        assert_eq!(ext.len(), 1);
        assert_eq!(ext[0].index, 2);
        assert_eq!(ext[0].kind, ExtremumKind::High);
        // The trough at 5 is within two bars of the end and not yet confirmed.
    }

    #[test]
    fn plateau_prefers_earlier_bar() {
        let highs = vec![1.0, 2.0, 3.0, 3.0, 2.0, 1.0, 0.5];
        let lows = vec![0.0; 7];
        let ext: Vec<_> = find_extrema(&highs, &lows, 2)
            .into_iter()
            .filter(|e| e.kind == ExtremumKind::High)
            .collect();
        assert_eq!(ext.len(), 1);
        assert_eq!(ext[0].index, 2);
    }

    #[test]
    fn markers_sit_on_confirmation_bar() {
        let highs = vec![1.0, 2.0, 5.0, 2.0, 1.0, 0.5, 1.0];
        let lows = vec![0.5, 1.5, 4.0, 1.5, 0.5, 0.1, 0.5];
        let ext = find_extrema(&highs, &lows, 2);
        let marks = swing_markers(&ext, ExtremumKind::High, 2, highs.len());
        assert_eq!(marks[..4], [None, None, None, None]);
        assert_eq!(marks[4], Some(1.0));
        assert_eq!(marks[5], Some(0.0));
    }
}

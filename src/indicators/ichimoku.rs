// =============================================================================
// Ichimoku Kinko Hyo
// =============================================================================
//
// Donchian-style midpoints of the rolling high/low window:
//   tenkan   = (max high + min low) / 2 over `tenkan` bars
//   kijun    = same over `kijun` bars
//   senkou_a = (tenkan + kijun) / 2, plotted `displacement` bars ahead
//   senkou_b = midpoint over `senkou_b` bars, plotted `displacement` bars ahead
//
// Displacement is applied by shifting: the span value at bar i was computed
// at bar i - displacement, so it never uses future data. The chikou span is
// the close plotted backwards and would need look-ahead; it is omitted.
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuSeries {
    pub tenkan: Vec<Option<f64>>,
    pub kijun: Vec<Option<f64>>,
    pub senkou_a: Vec<Option<f64>>,
    pub senkou_b: Vec<Option<f64>>,
}

impl IchimokuSeries {
    /// Cloud top/bottom at bar `i`, when both spans exist.
    pub fn cloud_at(&self, i: usize) -> Option<(f64, f64)> {
        let a = self.senkou_a.get(i).copied().flatten()?;
        let b = self.senkou_b.get(i).copied().flatten()?;
        Some((a.max(b), a.min(b)))
    }
}

/// Rolling (max high + min low) / 2.
pub fn midpoint(highs: &[f64], lows: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = highs.len().min(lows.len());
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }
    for end in (period - 1)..n {
        let start = end + 1 - period;
        let hi = highs[start..=end].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = lows[start..=end].iter().copied().fold(f64::INFINITY, f64::min);
        out[end] = Some((hi + lo) / 2.0).filter(|x| x.is_finite());
    }
    out
}

/// Shift a series forward by `by` bars, keeping its length.
fn displace(values: &[Option<f64>], by: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i >= by { values[i - by] } else { None })
        .collect()
}

pub fn calculate_ichimoku(
    highs: &[f64],
    lows: &[f64],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    displacement: usize,
) -> IchimokuSeries {
    let tenkan = midpoint(highs, lows, tenkan_period);
    let kijun = midpoint(highs, lows, kijun_period);

    let span_a: Vec<Option<f64>> = tenkan
        .iter()
        .zip(&kijun)
        .map(|(t, k)| Some(((*t)? + (*k)?) / 2.0))
        .collect();
    let span_b = midpoint(highs, lows, senkou_b_period);

    IchimokuSeries {
        senkou_a: displace(&span_a, displacement),
        senkou_b: displace(&span_b, displacement),
        tenkan,
        kijun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend(n: usize) -> (Vec<f64>, Vec<f64>) {
        let highs = (0..n).map(|i| 101.0 + i as f64).collect();
        let lows = (0..n).map(|i| 99.0 + i as f64).collect();
        (highs, lows)
    }

    #[test]
    fn default_warmups() {
        let (h, l) = trend(100);
        let ich = calculate_ichimoku(&h, &l, 9, 26, 52, 26);
        assert_eq!(ich.tenkan.iter().position(Option::is_some), Some(8));
        assert_eq!(ich.kijun.iter().position(Option::is_some), Some(25));
        assert_eq!(ich.senkou_a.iter().position(Option::is_some), Some(51));
        assert_eq!(ich.senkou_b.iter().position(Option::is_some), Some(77));
    }

    #[test]
    fn tenkan_is_window_midpoint() {
        let (h, l) = trend(20);
        let ich = calculate_ichimoku(&h, &l, 9, 26, 52, 26);
        // Window 0..=8: max high 109, min low 99.
        assert!((ich.tenkan[8].unwrap() - 104.0).abs() < 1e-12);
    }

    #[test]
    fn spans_are_shifted_forward() {
        let (h, l) = trend(100);
        let ich = calculate_ichimoku(&h, &l, 9, 26, 52, 26);
        let raw_b = midpoint(&h, &l, 52);
        assert_eq!(ich.senkou_b[90], raw_b[64]);
        let (top, bottom) = ich.cloud_at(90).unwrap();
        assert!(top >= bottom);
    }
}

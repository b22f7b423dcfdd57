// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
//   gain_k, loss_k   positive / negative part of close_k - close_{k-1}
//   seed             plain mean of the first `period` gains and losses
//   smoothing        avg = (avg * (period - 1) + x) / period   (α = 1 / n)
//   RSI              100 - 100 / (1 + avg_gain / avg_loss)
//
// Output is aligned with the closes: bars `0..period` are `None` and the first
// value lands on bar `period`. A window with neither gains nor losses (0/0) is
// `None` at that bar; the smoothing carries on so later movement reports
// again. A non-finite close ends the series.
// =============================================================================

/// Compute the RSI series aligned with `closes`.
///
/// # Edge cases
/// - `period == 0` or `closes.len() < period + 1` => all `None`
/// - Average loss zero with some gain => 100.0
/// - Both averages zero (no movement) => `None` for that bar
/// - A non-finite intermediate stops the series; later bars stay `None`.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    if !closes[..=period].iter().all(|c| c.is_finite()) {
        return out;
    }

    let period_f = period as f64;
    let split = |delta: f64| (delta.max(0.0), (-delta).max(0.0));

    let (mut avg_gain, mut avg_loss) = closes[..=period]
        .windows(2)
        .map(|w| split(w[1] - w[0]))
        .fold((0.0, 0.0), |(g, l), (up, down)| (g + up, l + down));
    avg_gain /= period_f;
    avg_loss /= period_f;

    for bar in period..closes.len() {
        if bar > period {
            let delta = closes[bar] - closes[bar - 1];
            if !delta.is_finite() {
                break;
            }
            let (gain, loss) = split(delta);
            avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
            avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        }
        if !(avg_gain.is_finite() && avg_loss.is_finite()) {
            break;
        }
        out[bar] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

/// RSI in [0, 100] from finite averages; `None` when both are zero.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => None,
        (_, true) => Some(100.0),
        _ => Some((100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_aligned_with_warmup_nones() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.8).sin() * 2.0).collect();
        for period in [2, 5, 14] {
            let rsi = calculate_rsi(&closes, period);
            assert_eq!(rsi.len(), closes.len());
            assert!(rsi[..period].iter().all(Option::is_none), "period {period}");
            assert!(rsi[period..].iter().all(Option::is_some), "period {period}");
        }
    }

    #[test]
    fn too_short_or_zero_period_is_all_none() {
        assert!(calculate_rsi(&[], 14).is_empty());
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
        let rsi = calculate_rsi(&[1.0, 2.0, 3.0], 14);
        assert_eq!(rsi, vec![None; 3]);
    }

    #[test]
    fn one_sided_moves_hit_the_bounds() {
        let up: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(calculate_rsi(&up, 5)[19], Some(100.0));

        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert_eq!(calculate_rsi(&down, 5)[19], Some(0.0));
    }

    #[test]
    fn flat_stretch_is_unavailable_not_neutral() {
        let rsi = calculate_rsi(&[100.0; 30], 14);
        assert!(rsi.iter().all(Option::is_none));

        // Movement after the flat run is reported again.
        let mut closes = vec![100.0; 20];
        closes.extend([101.0, 100.5, 102.0]);
        let rsi = calculate_rsi(&closes, 5);
        assert!(rsi[5..20].iter().all(Option::is_none));
        assert!(rsi[20..].iter().all(Option::is_some));
        assert_eq!(rsi[20], Some(100.0));
    }

    #[test]
    fn non_finite_close_ends_the_series() {
        let mut closes: Vec<f64> = (0..30).map(|i| 10.0 + (i as f64 * 0.5).cos()).collect();
        closes[18] = f64::NAN;
        let rsi = calculate_rsi(&closes, 5);
        assert!(rsi[5..18].iter().all(Option::is_some));
        assert!(rsi[18..].iter().all(Option::is_none));
    }

    #[test]
    fn smoothing_matches_a_hand_computed_step() {
        // deltas +1, -1, +2 with period 2: seed gain 0.5, loss 0.5 (RSI 50);
        // next step gain (0.5 + 2) / 2 = 1.25, loss 0.25 -> RS 5
        let rsi = calculate_rsi(&[10.0, 11.0, 10.0, 12.0], 2);
        assert_eq!(rsi[..2], [None, None]);
        assert!((rsi[2].unwrap() - 50.0).abs() < 1e-12);
        assert!((rsi[3].unwrap() - (100.0 - 100.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn noisy_series_stays_bounded() {
        let closes: Vec<f64> = (0..500)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0 + (i as f64 * 1.91).cos() * 3.0)
            .collect();
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }
}

// =============================================================================
// Average Directional Index (ADX) with +DI / -DI
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.
//
// Calculation pipeline:
//   1. Compute +DM (positive directional movement) and -DM per bar.
//   2. Compute True Range (TR) per bar.
//   3. Apply Wilder's smoothing (period) to +DM, -DM, and TR.
//   4. Derive +DI = smoothed(+DM) / smoothed(TR) * 100
//            -DI = smoothed(-DM) / smoothed(TR) * 100
//   5. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   6. ADX = Wilder's smoothed average of DX over `period` bars.
//
// Bar 0 has no predecessor, so the first DI lands on bar `period` and the
// first ADX on bar `2 * period - 1`.
//
// Interpretation:
//   ADX > 25  => trending market
//   ADX < 20  => ranging / choppy market
// =============================================================================

use crate::indicators::atr::true_range;
use crate::indicators::moving_average::wilder_opt;
use crate::market_data::Bar;

/// The three aligned outputs of the directional movement system.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalSeries {
    pub adx: Vec<Option<f64>>,
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
}

/// Compute ADX, +DI and -DI aligned with `bars`.
///
/// A bar where the smoothed true range is zero has no DI (and no DX); the
/// ADX smoother restarts after it.
pub fn calculate_adx(bars: &[Bar], period: usize) -> DirectionalSeries {
    let n = bars.len();

    // ------------------------------------------------------------------
    // Step 1 & 2: Raw +DM, -DM, and True Range for each consecutive pair
    // ------------------------------------------------------------------
    let mut plus_dm = vec![None; n];
    let mut minus_dm = vec![None; n];
    for i in 1..n {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;

        let pdm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let mdm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        plus_dm[i] = Some(pdm);
        minus_dm[i] = Some(mdm);
    }

    // ------------------------------------------------------------------
    // Step 3: Wilder's smoothing of +DM, -DM, TR
    // ------------------------------------------------------------------
    let smooth_plus = wilder_opt(&plus_dm, period);
    let smooth_minus = wilder_opt(&minus_dm, period);
    let smooth_tr = wilder_opt(&true_range(bars), period);

    // ------------------------------------------------------------------
    // Step 4 & 5: DI and DX per bar
    // ------------------------------------------------------------------
    let mut plus_di = vec![None; n];
    let mut minus_di = vec![None; n];
    let mut dx = vec![None; n];
    for i in 0..n {
        let (Some(p), Some(m), Some(tr)) = (smooth_plus[i], smooth_minus[i], smooth_tr[i]) else {
            continue;
        };
        if let Some((pdi, mdi, d)) = compute_dx(p, m, tr) {
            plus_di[i] = Some(pdi);
            minus_di[i] = Some(mdi);
            dx[i] = Some(d);
        }
    }

    // ------------------------------------------------------------------
    // Step 6: ADX = Wilder's smoothed average of DX
    // ------------------------------------------------------------------
    let adx = wilder_opt(&dx, period)
        .into_iter()
        .map(|v| v.map(|x| x.clamp(0.0, 100.0)))
        .collect();

    DirectionalSeries {
        adx,
        plus_di,
        minus_di,
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Compute (+DI, -DI, DX) from smoothed +DM, -DM, and TR values.
///
/// Returns `None` if the divisor is zero or the result is non-finite.
fn compute_dx(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> Option<(f64, f64, f64)> {
    if smooth_tr == 0.0 {
        return None;
    }

    let plus_di = (smooth_plus_dm / smooth_tr) * 100.0;
    let minus_di = (smooth_minus_dm / smooth_tr) * 100.0;

    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        // Both +DI and -DI are zero: no directional movement.
        return Some((plus_di, minus_di, 0.0));
    }

    let dx = ((plus_di - minus_di).abs() / di_sum) * 100.0;

    if dx.is_finite() && plus_di.is_finite() && minus_di.is_finite() {
        Some((plus_di, minus_di, dx))
    } else {
        None
    }
}

// =============================================================================
// Hurst Exponent — Rescaled Range (R/S) Analysis
// =============================================================================
//
//   H > 0.55  =>  persistent (trending)
//   H ~ 0.50  =>  random walk
//   H < 0.45  =>  anti-persistent (mean-reverting)
//
// For each chunk size n in {8, 16, 32, 64} the closes are cut into
// non-overlapping chunks; each chunk contributes R/S = (range of cumulative
// deviation from its mean) / (population std-dev). H is the OLS slope of
// ln(mean R/S) against ln(n), clamped to [0, 1].

use tracing::trace;

/// Minimum number of closes required.
pub const MIN_CLOSES: usize = 64;

const CHUNK_SIZES: [usize; 4] = [8, 16, 32, 64];

/// Hurst exponent of `closes`, or `None` for short or degenerate input
/// (every chunk flat).
pub fn calculate_hurst_exponent(closes: &[f64]) -> Option<f64> {
    if closes.len() < MIN_CLOSES {
        trace!(len = closes.len(), min = MIN_CLOSES, "hurst: insufficient data");
        return None;
    }

    let points: Vec<(f64, f64)> = CHUNK_SIZES
        .iter()
        .filter_map(|&size| mean_rescaled_range(closes, size).map(|rs| ((size as f64).ln(), rs.ln())))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), &(x, y)| {
        (num + (x - x_mean) * (y - y_mean), den + (x - x_mean).powi(2))
    });
    if den < f64::EPSILON {
        return None;
    }

    let hurst = (num / den).clamp(0.0, 1.0);
    trace!(hurst = format!("{:.4}", hurst), points = points.len(), "hurst computed");
    Some(hurst)
}

/// Mean R/S over the non-flat chunks of `size`.
fn mean_rescaled_range(closes: &[f64], size: usize) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for chunk in closes.chunks_exact(size) {
        let mean = chunk.iter().sum::<f64>() / size as f64;
        let sd = (chunk.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / size as f64).sqrt();
        if sd < f64::EPSILON {
            continue;
        }
        let mut running = 0.0;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &x in chunk {
            running += x - mean;
            lo = lo.min(running);
            hi = hi.max(running);
        }
        sum += (hi - lo) / sd;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

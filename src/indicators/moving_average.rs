// =============================================================================
// Moving Averages — SMA, EMA, WMA and the shared recursive smoothers
// =============================================================================
//
// Every function returns a vector aligned with its input: element `i` is the
// value at bar `i`, `None` while the formula has insufficient history.
//
// SMA_t  = mean(x_{t-n+1..=t})
// WMA_t  = Σ w_k x_{t-n+k} / Σ w_k,   w_k = k  (k = 1..n, newest heaviest)
// EMA_t  = x_t * α + EMA_{t-1} * (1 - α),   α = 2 / (n + 1)
// Wilder = same recursion with α = 1 / n
//
// Both recursive smoothers are seeded with the SMA of the first `n` defined
// values. An undefined input breaks the recursion: the output is `None` at
// that bar and the smoother re-seeds from the next `n` defined values.
// =============================================================================

/// Lift a plain slice into the optional form used by the smoothers.
pub fn lift(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v).filter(|x| x.is_finite())).collect()
}

/// Simple moving average over a plain slice.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    sma_opt(&lift(values), period)
}

/// Simple moving average; a window containing an undefined value is
/// undefined.
pub fn sma_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    })
}

/// Weighted moving average with linear weights (newest bar weighs `period`).
pub fn wma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let denom = (period * (period + 1)) as f64 / 2.0;
    rolling(&lift(values), period, |window| {
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(k, v)| (k + 1) as f64 * v)
            .sum();
        Some(weighted / denom)
    })
}

/// Exponential moving average over a plain slice.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    ema_opt(&lift(values), period)
}

/// Exponential moving average, α = 2 / (period + 1), SMA-seeded.
pub fn ema_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    recursive(values, period, 2.0 / (period as f64 + 1.0))
}

/// Wilder's smoothing, α = 1 / period, SMA-seeded.
pub fn wilder_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    recursive(values, period, 1.0 / period as f64)
}

/// Apply `f` to every complete window of `period` defined values ending at
/// each bar. Windows containing `None` yield `None`.
pub fn rolling<F>(values: &[Option<f64>], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let mut window: Vec<f64> = Vec::with_capacity(period);
    for end in (period - 1)..values.len() {
        window.clear();
        let complete = values[end + 1 - period..=end].iter().all(|v| match v {
            Some(x) => {
                window.push(*x);
                true
            }
            None => false,
        });
        if complete {
            out[end] = f(&window).filter(|x| x.is_finite());
        }
    }
    out
}

/// Shared SMA-seeded recursive smoother.
fn recursive(values: &[Option<f64>], period: usize, alpha: f64) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let mut seed_sum = 0.0_f64;
    let mut seed_count = 0usize;
    let mut prev: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = *value else {
            // Undefined input: break the recursion and re-seed.
            seed_sum = 0.0;
            seed_count = 0;
            prev = None;
            continue;
        };

        match prev {
            Some(p) => {
                let next = x * alpha + p * (1.0 - alpha);
                if next.is_finite() {
                    out[i] = Some(next);
                    prev = Some(next);
                } else {
                    seed_sum = 0.0;
                    seed_count = 0;
                    prev = None;
                }
            }
            None => {
                seed_sum += x;
                seed_count += 1;
                if seed_count == period {
                    let seed = seed_sum / period as f64;
                    if seed.is_finite() {
                        out[i] = Some(seed);
                        prev = Some(seed);
                    }
                    seed_sum = 0.0;
                    seed_count = 0;
                }
            }
        }
    }
    out
}

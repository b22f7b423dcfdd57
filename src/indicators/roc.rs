// =============================================================================
// Rate of Change (ROC) — Momentum Indicator
// =============================================================================
//
// ROC measures the percentage change in price over a look-back period:
//   ROC = ((close - close_n) / close_n) * 100
//
// Positive ROC indicates upward momentum; negative indicates downward.

/// Calculate the Rate of Change aligned with `closes`.
///
/// The first value is at index `period`. A zero reference close yields
/// `None` for that bar.
pub fn calculate_roc(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return result;
    }

    for i in period..closes.len() {
        let prev = closes[i - period];
        if prev != 0.0 {
            result[i] = Some(((closes[i] - prev) / prev) * 100.0).filter(|x| x.is_finite());
        }
    }
    result
}

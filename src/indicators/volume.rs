// =============================================================================
// Volume Indicators — OBV, VWAP, A/D line, CMF, volume SMA
// =============================================================================
//
// Cumulative (anchored at the first bar of the series):
//   OBV_t  = OBV_{t-1} ± volume_t   (sign of close change, 0 when unchanged)
//   VWAP_t = Σ TP·V / Σ V
//   AD_t   = AD_{t-1} + MFM_t · V_t,  MFM = ((C - L) - (H - C)) / (H - L)
//
// Rolling:
//   CMF_n  = Σ MFM·V / Σ V over the last n bars
//
// A zero-range bar has MFM = 0. VWAP and CMF are unavailable while their
// volume denominator is zero.
// =============================================================================

use crate::indicators::moving_average::sma;
use crate::market_data::Bar;

/// Money-flow multiplier of a single bar, in [-1, 1].
pub fn money_flow_multiplier(bar: &Bar) -> f64 {
    let range = bar.range();
    if range == 0.0 {
        0.0
    } else {
        ((bar.close - bar.low) - (bar.high - bar.close)) / range
    }
}

pub fn calculate_obv(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    let mut obv = 0.0_f64;
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev = bars[i - 1].close;
            if bar.close > prev {
                obv += bar.volume;
            } else if bar.close < prev {
                obv -= bar.volume;
            }
        }
        out.push(Some(obv).filter(|x| x.is_finite()));
    }
    out
}

pub fn calculate_vwap(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut pv = 0.0_f64;
    let mut vol = 0.0_f64;
    bars.iter()
        .map(|bar| {
            pv += bar.typical_price() * bar.volume;
            vol += bar.volume;
            if vol > 0.0 {
                Some(pv / vol).filter(|x| x.is_finite())
            } else {
                None
            }
        })
        .collect()
}

pub fn calculate_ad_line(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut ad = 0.0_f64;
    bars.iter()
        .map(|bar| {
            ad += money_flow_multiplier(bar) * bar.volume;
            Some(ad).filter(|x| x.is_finite())
        })
        .collect()
}

pub fn calculate_cmf(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }
    for end in (period - 1)..bars.len() {
        let window = &bars[end + 1 - period..=end];
        let (flow, vol) = window.iter().fold((0.0, 0.0), |(f, v), b| {
            (f + money_flow_multiplier(b) * b.volume, v + b.volume)
        });
        if vol > 0.0 {
            out[end] = Some(flow / vol).filter(|x| x.is_finite());
        }
    }
    out
}

pub fn calculate_volume_sma(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    sma(&volumes, period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar::new(0, open, high, low, close, volume)
    }

    #[test]
    fn obv_accumulates_by_close_direction() {
        let bars = vec![
            bar(10.0, 11.0, 9.0, 10.0, 100.0),
            bar(10.0, 12.0, 10.0, 11.0, 50.0),
            bar(11.0, 11.0, 9.0, 10.0, 30.0),
            bar(10.0, 10.5, 9.5, 10.0, 70.0),
        ];
        let obv: Vec<f64> = calculate_obv(&bars).into_iter().flatten().collect();
        assert_eq!(obv, vec![0.0, 50.0, 20.0, 20.0]);
    }

    #[test]
    fn vwap_unavailable_until_volume() {
        let bars = vec![
            bar(10.0, 10.0, 10.0, 10.0, 0.0),
            bar(10.0, 13.0, 10.0, 13.0, 10.0),
        ];
        let vwap = calculate_vwap(&bars);
        assert_eq!(vwap[0], None);
        // TP = (13 + 10 + 13) / 3 = 12
        assert!((vwap[1].unwrap() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn close_at_high_is_full_accumulation() {
        let bars = vec![bar(10.0, 12.0, 10.0, 12.0, 5.0); 3];
        let ad: Vec<f64> = calculate_ad_line(&bars).into_iter().flatten().collect();
        assert_eq!(ad, vec![5.0, 10.0, 15.0]);
        let cmf = calculate_cmf(&bars, 3);
        assert!((cmf[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cmf_zero_volume_window_is_unavailable() {
        let bars = vec![bar(10.0, 11.0, 9.0, 10.5, 0.0); 5];
        assert!(calculate_cmf(&bars, 3).iter().all(Option::is_none));
    }
}

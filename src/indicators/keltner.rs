// =============================================================================
// Keltner Channels
// =============================================================================
//
//   middle = EMA(close, ema_period)
//   upper  = middle + multiplier * ATR(atr_period)
//   lower  = middle - multiplier * ATR(atr_period)
//
// The middle line follows the exponential convention, the ATR Wilder's.
// Bands start at max(ema_period - 1, atr_period).
// =============================================================================

use crate::indicators::atr::calculate_atr;
use crate::indicators::moving_average::ema;
use crate::market_data::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct KeltnerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn calculate_keltner(
    bars: &[Bar],
    ema_period: usize,
    atr_period: usize,
    multiplier: f64,
) -> KeltnerSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middle = ema(&closes, ema_period);
    let atr = calculate_atr(bars, atr_period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&atr)
            .map(|(m, a)| Some((*m)? + sign * multiplier * (*a)?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    // The middle line is only reported where the channel exists.
    let middle = middle
        .iter()
        .zip(&upper)
        .map(|(m, u)| u.and(*m))
        .collect();

    KeltnerSeries {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_brackets_the_middle() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.3).sin() * 5.0;
                Bar::new(i, c, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect();
        let k = calculate_keltner(&bars, 20, 10, 2.0);
        assert_eq!(k.upper.iter().position(Option::is_some), Some(19));
        for i in 19..60 {
            let (u, m, l) = (k.upper[i].unwrap(), k.middle[i].unwrap(), k.lower[i].unwrap());
            assert!(u > m && m > l);
        }
    }
}

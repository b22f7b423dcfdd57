// =============================================================================
// Indicator Registry — the fixed, enumerable set of computed series
// =============================================================================
//
// Each `Indicator` value names one output series and carries the parameters
// needed to produce it. Multi-output formulas (MACD, DMI, Ichimoku, the band
// families) use one variant with an output selector so every series has its
// own registry entry and its own warm-up.
//
// Warm-up = index of the first bar the formula can produce. `min_bars()` is
// warm-up + 1; a shorter store yields an all-`None` series tagged
// `InsufficientData`.
// =============================================================================

use crate::analysis_config::IndicatorParams;
use crate::indicators::adx::calculate_adx;
use crate::indicators::atr::{calculate_atr, calculate_atr_pct};
use crate::indicators::bollinger::calculate_bollinger;
use crate::indicators::ichimoku::calculate_ichimoku;
use crate::indicators::keltner::calculate_keltner;
use crate::indicators::macd::calculate_macd;
use crate::indicators::moving_average::{ema, sma, wma};
use crate::indicators::oscillators::{
    calculate_cci, calculate_mfi, calculate_stochastic, calculate_williams_r,
};
use crate::indicators::roc::calculate_roc;
use crate::indicators::rsi::calculate_rsi;
use crate::indicators::series::{Family, IndicatorSeries};
use crate::indicators::statistical::{
    calculate_linreg_r2, calculate_linreg_slope, calculate_stddev, calculate_zscore, find_extrema,
    swing_markers, ExtremumKind,
};
use crate::indicators::volume::{
    calculate_ad_line, calculate_cmf, calculate_obv, calculate_volume_sma, calculate_vwap,
};
use crate::market_data::SeriesStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmiOutput {
    Adx,
    PlusDi,
    MinusDi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IchimokuOutput {
    Tenkan,
    Kijun,
    SenkouA,
    SenkouB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandOutput {
    Upper,
    Middle,
    Lower,
    Width,
    PercentB,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Indicator {
    // Trend
    Sma { period: usize },
    Ema { period: usize },
    Wma { period: usize },
    Macd { fast: usize, slow: usize, signal: usize, output: MacdOutput },
    Dmi { period: usize, output: DmiOutput },
    Ichimoku { tenkan: usize, kijun: usize, senkou_b: usize, displacement: usize, output: IchimokuOutput },
    // Momentum
    Rsi { period: usize },
    StochK { k_period: usize },
    StochD { k_period: usize, d_period: usize },
    Cci { period: usize },
    WilliamsR { period: usize },
    Roc { period: usize },
    Mfi { period: usize },
    // Volatility
    Bollinger { period: usize, num_std: f64, output: BandOutput },
    Atr { period: usize },
    AtrPct { period: usize },
    Keltner { ema_period: usize, atr_period: usize, multiplier: f64, output: BandOutput },
    StdDev { period: usize },
    // Volume
    Obv,
    Vwap,
    AdLine,
    Cmf { period: usize },
    VolumeSma { period: usize },
    // Statistical
    LinRegSlope { period: usize },
    LinRegR2 { period: usize },
    ZScore { period: usize },
    SwingHigh { window: usize },
    SwingLow { window: usize },
}

impl Indicator {
    /// Output name used as the indicator-table key.
    pub fn name(&self) -> String {
        use Indicator::*;
        match *self {
            Sma { period } => format!("sma_{period}"),
            Ema { period } => format!("ema_{period}"),
            Wma { period } => format!("wma_{period}"),
            Macd { output, .. } => match output {
                MacdOutput::Line => "macd_line".into(),
                MacdOutput::Signal => "macd_signal".into(),
                MacdOutput::Histogram => "macd_histogram".into(),
            },
            Dmi { period, output } => match output {
                DmiOutput::Adx => format!("adx_{period}"),
                DmiOutput::PlusDi => format!("plus_di_{period}"),
                DmiOutput::MinusDi => format!("minus_di_{period}"),
            },
            Ichimoku { output, .. } => match output {
                IchimokuOutput::Tenkan => "ichimoku_tenkan".into(),
                IchimokuOutput::Kijun => "ichimoku_kijun".into(),
                IchimokuOutput::SenkouA => "ichimoku_senkou_a".into(),
                IchimokuOutput::SenkouB => "ichimoku_senkou_b".into(),
            },
            Rsi { period } => format!("rsi_{period}"),
            StochK { k_period } => format!("stoch_k_{k_period}"),
            StochD { d_period, .. } => format!("stoch_d_{d_period}"),
            Cci { period } => format!("cci_{period}"),
            WilliamsR { period } => format!("williams_r_{period}"),
            Roc { period } => format!("roc_{period}"),
            Mfi { period } => format!("mfi_{period}"),
            Bollinger { output, .. } => format!("bb_{}", band_suffix(output)),
            Atr { period } => format!("atr_{period}"),
            AtrPct { period } => format!("atr_pct_{period}"),
            Keltner { output, .. } => format!("keltner_{}", band_suffix(output)),
            StdDev { period } => format!("stddev_{period}"),
            Obv => "obv".into(),
            Vwap => "vwap".into(),
            AdLine => "ad_line".into(),
            Cmf { period } => format!("cmf_{period}"),
            VolumeSma { period } => format!("volume_sma_{period}"),
            LinRegSlope { period } => format!("linreg_slope_{period}"),
            LinRegR2 { period } => format!("linreg_r2_{period}"),
            ZScore { period } => format!("zscore_{period}"),
            SwingHigh { window } => format!("swing_high_{window}"),
            SwingLow { window } => format!("swing_low_{window}"),
        }
    }

    pub fn family(&self) -> Family {
        use Indicator::*;
        match self {
            Sma { .. } | Ema { .. } | Wma { .. } | Macd { .. } | Dmi { .. } | Ichimoku { .. } => {
                Family::Trend
            }
            Rsi { .. } | StochK { .. } | StochD { .. } | Cci { .. } | WilliamsR { .. } | Roc { .. }
            | Mfi { .. } => Family::Momentum,
            Bollinger { .. } | Atr { .. } | AtrPct { .. } | Keltner { .. } | StdDev { .. } => {
                Family::Volatility
            }
            Obv | Vwap | AdLine | Cmf { .. } | VolumeSma { .. } => Family::Volume,
            LinRegSlope { .. } | LinRegR2 { .. } | ZScore { .. } | SwingHigh { .. } | SwingLow { .. } => {
                Family::Statistical
            }
        }
    }

    /// Index of the first bar that carries a value on clean input.
    pub fn warmup(&self) -> usize {
        use Indicator::*;
        let lag = |n: usize| n.saturating_sub(1);
        match *self {
            Sma { period } | Ema { period } | Wma { period } => lag(period),
            Macd { slow, signal, output, .. } => match output {
                MacdOutput::Line => lag(slow),
                MacdOutput::Signal | MacdOutput::Histogram => lag(slow) + lag(signal),
            },
            Dmi { period, output } => match output {
                DmiOutput::Adx => (2 * period).saturating_sub(1),
                DmiOutput::PlusDi | DmiOutput::MinusDi => period,
            },
            Ichimoku { tenkan, kijun, senkou_b, displacement, output } => match output {
                IchimokuOutput::Tenkan => lag(tenkan),
                IchimokuOutput::Kijun => lag(kijun),
                IchimokuOutput::SenkouA => lag(tenkan.max(kijun)) + displacement,
                IchimokuOutput::SenkouB => lag(senkou_b) + displacement,
            },
            Rsi { period } | Roc { period } | Mfi { period } => period,
            StochK { k_period } => lag(k_period),
            StochD { k_period, d_period } => lag(k_period) + lag(d_period),
            Cci { period } | WilliamsR { period } => lag(period),
            Bollinger { period, .. } | StdDev { period } => lag(period),
            Atr { period } | AtrPct { period } => period,
            Keltner { ema_period, atr_period, .. } => lag(ema_period).max(atr_period),
            Obv | Vwap | AdLine => 0,
            Cmf { period } | VolumeSma { period } => lag(period),
            LinRegSlope { period } | LinRegR2 { period } | ZScore { period } => lag(period),
            SwingHigh { window } | SwingLow { window } => 2 * window,
        }
    }

    /// Minimum series length for any value to exist.
    pub fn min_bars(&self) -> usize {
        self.warmup() + 1
    }

    /// Compute the aligned series over `store`. Never fails: a short store
    /// produces an all-`None` series with `InsufficientData` status.
    pub fn compute(&self, store: &SeriesStore) -> IndicatorSeries {
        let len = store.len();
        let (name, family, warmup) = (self.name(), self.family(), self.warmup());
        if len < self.min_bars() {
            return IndicatorSeries::insufficient(name, family, warmup, self.min_bars(), len);
        }
        IndicatorSeries::new(name, family, warmup, self.values(store))
    }

    fn values(&self, store: &SeriesStore) -> Vec<Option<f64>> {
        use Indicator::*;
        let bars = store.bars();
        match *self {
            Sma { period } => sma(&store.closes(), period),
            Ema { period } => ema(&store.closes(), period),
            Wma { period } => wma(&store.closes(), period),
            Macd { fast, slow, signal, output } => {
                let m = calculate_macd(&store.closes(), fast, slow, signal);
                match output {
                    MacdOutput::Line => m.line,
                    MacdOutput::Signal => m.signal,
                    MacdOutput::Histogram => m.histogram,
                }
            }
            Dmi { period, output } => {
                let d = calculate_adx(bars, period);
                match output {
                    DmiOutput::Adx => d.adx,
                    DmiOutput::PlusDi => d.plus_di,
                    DmiOutput::MinusDi => d.minus_di,
                }
            }
            Ichimoku { tenkan, kijun, senkou_b, displacement, output } => {
                let ich = calculate_ichimoku(
                    &store.highs(),
                    &store.lows(),
                    tenkan,
                    kijun,
                    senkou_b,
                    displacement,
                );
                match output {
                    IchimokuOutput::Tenkan => ich.tenkan,
                    IchimokuOutput::Kijun => ich.kijun,
                    IchimokuOutput::SenkouA => ich.senkou_a,
                    IchimokuOutput::SenkouB => ich.senkou_b,
                }
            }
            Rsi { period } => calculate_rsi(&store.closes(), period),
            StochK { k_period } => calculate_stochastic(bars, k_period, 1).k,
            StochD { k_period, d_period } => calculate_stochastic(bars, k_period, d_period).d,
            Cci { period } => calculate_cci(bars, period),
            WilliamsR { period } => calculate_williams_r(bars, period),
            Roc { period } => calculate_roc(&store.closes(), period),
            Mfi { period } => calculate_mfi(bars, period),
            Bollinger { period, num_std, output } => {
                let bb = calculate_bollinger(&store.closes(), period, num_std);
                match output {
                    BandOutput::Upper => bb.upper,
                    BandOutput::Middle => bb.middle,
                    BandOutput::Lower => bb.lower,
                    BandOutput::Width => bb.width,
                    BandOutput::PercentB => bb.percent_b,
                }
            }
            Atr { period } => calculate_atr(bars, period),
            AtrPct { period } => calculate_atr_pct(bars, period),
            Keltner { ema_period, atr_period, multiplier, output } => {
                let k = calculate_keltner(bars, ema_period, atr_period, multiplier);
                match output {
                    BandOutput::Upper => k.upper,
                    BandOutput::Lower => k.lower,
                    _ => k.middle,
                }
            }
            StdDev { period } => calculate_stddev(&store.closes(), period),
            Obv => calculate_obv(bars),
            Vwap => calculate_vwap(bars),
            AdLine => calculate_ad_line(bars),
            Cmf { period } => calculate_cmf(bars, period),
            VolumeSma { period } => calculate_volume_sma(bars, period),
            LinRegSlope { period } => calculate_linreg_slope(&store.closes(), period),
            LinRegR2 { period } => calculate_linreg_r2(&store.closes(), period),
            ZScore { period } => calculate_zscore(&store.closes(), period),
            SwingHigh { window } | SwingLow { window } => {
                let kind = if matches!(self, SwingHigh { .. }) {
                    ExtremumKind::High
                } else {
                    ExtremumKind::Low
                };
                let extrema = find_extrema(&store.highs(), &store.lows(), window);
                swing_markers(&extrema, kind, window, store.len())
            }
        }
    }
}

fn band_suffix(output: BandOutput) -> &'static str {
    match output {
        BandOutput::Upper => "upper",
        BandOutput::Middle => "middle",
        BandOutput::Lower => "lower",
        BandOutput::Width => "width",
        BandOutput::PercentB => "percent_b",
    }
}

/// Build the full registry from configuration.
pub fn registry(params: &IndicatorParams, swing_window: usize) -> Vec<Indicator> {
    use Indicator::*;
    let p = params;
    let mut out = Vec::with_capacity(64);

    out.extend(p.sma_periods.iter().map(|&period| Sma { period }));
    out.extend(p.ema_periods.iter().map(|&period| Ema { period }));
    out.extend(p.wma_periods.iter().map(|&period| Wma { period }));
    for output in [MacdOutput::Line, MacdOutput::Signal, MacdOutput::Histogram] {
        out.push(Macd {
            fast: p.macd_fast,
            slow: p.macd_slow,
            signal: p.macd_signal,
            output,
        });
    }
    for output in [DmiOutput::Adx, DmiOutput::PlusDi, DmiOutput::MinusDi] {
        out.push(Dmi {
            period: p.adx_period,
            output,
        });
    }
    for output in [
        IchimokuOutput::Tenkan,
        IchimokuOutput::Kijun,
        IchimokuOutput::SenkouA,
        IchimokuOutput::SenkouB,
    ] {
        out.push(Ichimoku {
            tenkan: p.ichimoku_tenkan,
            kijun: p.ichimoku_kijun,
            senkou_b: p.ichimoku_senkou_b,
            displacement: p.ichimoku_displacement,
            output,
        });
    }

    out.push(Rsi { period: p.rsi_period });
    out.push(StochK {
        k_period: p.stoch_k_period,
    });
    out.push(StochD {
        k_period: p.stoch_k_period,
        d_period: p.stoch_d_period,
    });
    out.push(Cci { period: p.cci_period });
    out.push(WilliamsR {
        period: p.williams_period,
    });
    out.push(Roc { period: p.roc_period });
    out.push(Mfi { period: p.mfi_period });

    for output in [
        BandOutput::Upper,
        BandOutput::Middle,
        BandOutput::Lower,
        BandOutput::Width,
        BandOutput::PercentB,
    ] {
        out.push(Bollinger {
            period: p.bollinger_period,
            num_std: p.bollinger_std,
            output,
        });
    }
    out.push(Atr { period: p.atr_period });
    out.push(AtrPct { period: p.atr_period });
    for output in [BandOutput::Upper, BandOutput::Middle, BandOutput::Lower] {
        out.push(Keltner {
            ema_period: p.keltner_ema_period,
            atr_period: p.keltner_atr_period,
            multiplier: p.keltner_multiplier,
            output,
        });
    }
    out.push(StdDev {
        period: p.stddev_period,
    });

    out.push(Obv);
    out.push(Vwap);
    out.push(AdLine);
    out.push(Cmf { period: p.cmf_period });
    out.push(VolumeSma {
        period: p.volume_sma_period,
    });

    out.push(LinRegSlope {
        period: p.regression_period,
    });
    out.push(LinRegR2 {
        period: p.regression_period,
    });
    out.push(ZScore {
        period: p.zscore_period,
    });
    out.push(SwingHigh {
        window: swing_window,
    });
    out.push(SwingLow {
        window: swing_window,
    });

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Bar, SeriesMeta, Timeframe};
    use std::collections::HashSet;

    fn noisy_store(len: usize) -> SeriesStore {
        let bars = (0..len)
            .map(|i| {
                let x = i as f64;
                let close = 100.0 + x * 0.1 + (x * 0.7).sin() * 3.0;
                let open = close - (x * 1.3).cos();
                let high = open.max(close) + 0.5 + (x * 0.3).sin().abs();
                let low = open.min(close) - 0.5 - (x * 0.5).cos().abs();
                Bar::new(i as i64 * 60_000, open, high, low, close, 1_000.0 + (x * 0.9).sin() * 300.0)
            })
            .collect();
        SeriesStore::new(SeriesMeta::new("TEST", Timeframe::M1), bars).unwrap()
    }

    #[test]
    fn names_are_unique() {
        let reg = registry(&IndicatorParams::default(), 5);
        let names: HashSet<String> = reg.iter().map(Indicator::name).collect();
        assert_eq!(names.len(), reg.len());
        for expected in ["sma_200", "macd_histogram", "adx_14", "ichimoku_senkou_b", "stoch_d_3", "bb_percent_b", "keltner_middle", "swing_low_5"] {
            assert!(names.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn default_warmups() {
        let reg = registry(&IndicatorParams::default(), 5);
        let warmup = |name: &str| reg.iter().find(|i| i.name() == name).map(Indicator::warmup);
        assert_eq!(warmup("macd_line"), Some(25));
        assert_eq!(warmup("macd_signal"), Some(33));
        assert_eq!(warmup("adx_14"), Some(27));
        assert_eq!(warmup("plus_di_14"), Some(14));
        assert_eq!(warmup("ichimoku_senkou_a"), Some(51));
        assert_eq!(warmup("ichimoku_senkou_b"), Some(77));
        assert_eq!(warmup("rsi_14"), Some(14));
        assert_eq!(warmup("stoch_d_3"), Some(15));
        assert_eq!(warmup("keltner_upper"), Some(19));
        assert_eq!(warmup("swing_high_5"), Some(10));
    }

    #[test]
    fn every_indicator_has_exactly_warmup_leading_nones() {
        let store = noisy_store(300);
        for ind in registry(&IndicatorParams::default(), 5) {
            let s = ind.compute(&store);
            assert_eq!(s.len(), 300, "{}", s.name);
            assert!(s.is_ready());
            let w = ind.warmup();
            assert!(s.values[..w].iter().all(Option::is_none), "{} has values before warm-up", s.name);
            assert!(s.values[w..].iter().all(Option::is_some), "{} has gaps after warm-up", s.name);
        }
    }

    #[test]
    fn short_store_is_insufficient_not_an_error() {
        let store = noisy_store(3);
        let rsi = Indicator::Rsi { period: 14 }.compute(&store);
        assert_eq!(rsi.len(), 3);
        assert!(!rsi.is_ready());
        assert!(rsi.values.iter().all(Option::is_none));
    }
}

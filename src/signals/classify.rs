// =============================================================================
// Indicator Classification — latest readings → directional inputs
// =============================================================================
//
// Each classifier reads the last bar of a few indicator series and returns a
// `SignalInput` (direction + confidence), or nothing when a series it needs is
// unavailable. Thresholds come from `SignalThresholds`.
//
// Oscillators past an extreme score 0.5 at the threshold rising to 1.0 at the
// end of their scale; inside the thresholds they read neutral.
//
//   ma_alignment  close / fastest EMA / SMAs ascending, pairwise vote (faster above
//                 slower is bullish); confidence = |net vote|
//   macd          sign of line + sign of histogram
//   adx           +DI vs -DI once ADX >= adx_trend; confidence min(1, ADX/50)
//   ichimoku      close above / below / inside the cloud
//   rsi           > overbought bearish, < oversold bullish
//   stochastic    %K, as rsi
//   williams_r    > -20 bearish, < -80 bullish
//   cci           > +level bullish momentum, < -level bearish
//   roc           sign; confidence min(1, |roc| / 5%)
//   mfi           as rsi
//   bollinger     %B > 1 bearish, < 0 bullish
//   obv           OBV against its value `obv_lookback` bars ago, confidence
//                 |ΔOBV| over the volume traded in between
//   cmf           beyond ±cmf_level
//   linreg        slope sign; confidence R²
//   zscore        > +level bearish, < -level bullish
// =============================================================================

use crate::analysis_config::{IndicatorParams, SignalThresholds};
use crate::indicators::registry::{BandOutput, DmiOutput, IchimokuOutput, Indicator, MacdOutput};
use crate::indicators::IndicatorTable;
use crate::market_data::SeriesStore;
use crate::signals::weighted_score::SignalInput;
use crate::types::Direction;

/// Moving averages of the alignment stack, fastest first: the shortest
/// configured EMA, then every longer configured SMA in ascending period.
fn ma_stack(p: &IndicatorParams) -> Vec<Indicator> {
    let ema = p.ema_periods.iter().copied().min();
    let mut smas: Vec<usize> = p
        .sma_periods
        .iter()
        .copied()
        .filter(|&period| ema.map_or(true, |e| period > e))
        .collect();
    smas.sort_unstable();
    smas.dedup();

    ema.map(|period| Indicator::Ema { period })
        .into_iter()
        .chain(smas.into_iter().map(|period| Indicator::Sma { period }))
        .collect()
}

/// ROC (percent) at which its confidence saturates.
const ROC_FULL_PCT: f64 = 5.0;

/// ADX at which trend confidence saturates.
const ADX_FULL: f64 = 50.0;

/// Every classifier name, in evaluation order.
pub const INDICATOR_INPUTS: [&str; 15] = [
    "ma_alignment",
    "macd",
    "adx",
    "ichimoku",
    "rsi",
    "stochastic",
    "williams_r",
    "cci",
    "roc",
    "mfi",
    "bollinger",
    "obv",
    "cmf",
    "linreg",
    "zscore",
];

/// Readings for the last bar of `store`. Returns the available inputs and the
/// names of classifiers that had nothing to read.
pub fn classify_indicators(
    store: &SeriesStore,
    table: &IndicatorTable,
    params: &IndicatorParams,
    thresholds: &SignalThresholds,
) -> (Vec<SignalInput>, Vec<String>) {
    let ctx = Context {
        store,
        table,
        params,
        t: thresholds,
    };
    let mut inputs = Vec::new();
    let mut unavailable = Vec::new();
    for name in INDICATOR_INPUTS {
        match ctx.classify(name) {
            Some(input) => inputs.push(input),
            None => unavailable.push(name.to_string()),
        }
    }
    (inputs, unavailable)
}

struct Context<'a> {
    store: &'a SeriesStore,
    table: &'a IndicatorTable,
    params: &'a IndicatorParams,
    t: &'a SignalThresholds,
}

impl Context<'_> {
    fn last(&self, indicator: Indicator) -> Option<f64> {
        self.table.last(&indicator.name())
    }

    fn close(&self) -> f64 {
        self.store.last().close
    }

    fn classify(&self, name: &str) -> Option<SignalInput> {
        let p = self.params;
        let t = self.t;
        match name {
            "ma_alignment" => self.ma_alignment(),
            "macd" => self.macd(),
            "adx" => self.adx(),
            "ichimoku" => self.ichimoku(),
            "rsi" => {
                let v = self.last(Indicator::Rsi { period: p.rsi_period })?;
                Some(overbought_oversold(name, v, t.rsi_oversold, t.rsi_overbought, 0.0, 100.0))
            }
            "stochastic" => {
                let v = self.last(Indicator::StochK {
                    k_period: p.stoch_k_period,
                })?;
                Some(overbought_oversold(name, v, t.stoch_oversold, t.stoch_overbought, 0.0, 100.0))
            }
            "williams_r" => {
                let v = self.last(Indicator::WilliamsR {
                    period: p.williams_period,
                })?;
                Some(overbought_oversold(
                    name,
                    v,
                    t.williams_oversold,
                    t.williams_overbought,
                    -100.0,
                    0.0,
                ))
            }
            "cci" => {
                let v = self.last(Indicator::Cci { period: p.cci_period })?;
                let level = t.cci_level;
                let reading = if v > level {
                    SignalInput::new(name, Direction::Bullish, beyond(v, level, 2.0 * level), format!("cci {v:.1} above +{level}"))
                } else if v < -level {
                    SignalInput::new(name, Direction::Bearish, beyond(-v, level, 2.0 * level), format!("cci {v:.1} below -{level}"))
                } else {
                    SignalInput::new(name, Direction::Neutral, 0.0, format!("cci {v:.1} inside ±{level}"))
                };
                Some(reading)
            }
            "roc" => {
                let v = self.last(Indicator::Roc { period: p.roc_period })?;
                let direction = Direction::from_value(v, 0.0);
                Some(SignalInput::new(name, direction, (v.abs() / ROC_FULL_PCT).min(1.0), format!("roc {v:.2}%")))
            }
            "mfi" => {
                let v = self.last(Indicator::Mfi { period: p.mfi_period })?;
                Some(overbought_oversold(name, v, t.mfi_oversold, t.mfi_overbought, 0.0, 100.0))
            }
            "bollinger" => {
                let v = self.last(Indicator::Bollinger {
                    period: p.bollinger_period,
                    num_std: p.bollinger_std,
                    output: BandOutput::PercentB,
                })?;
                Some(overbought_oversold(name, v, 0.0, 1.0, -0.5, 1.5))
            }
            "obv" => self.obv(),
            "cmf" => {
                let v = self.last(Indicator::Cmf { period: p.cmf_period })?;
                let level = t.cmf_level;
                let reading = if v > level {
                    SignalInput::new(name, Direction::Bullish, beyond(v, level, 1.0), format!("cmf {v:.3} above {level}"))
                } else if v < -level {
                    SignalInput::new(name, Direction::Bearish, beyond(-v, level, 1.0), format!("cmf {v:.3} below -{level}"))
                } else {
                    SignalInput::new(name, Direction::Neutral, 0.0, format!("cmf {v:.3} flat"))
                };
                Some(reading)
            }
            "linreg" => {
                let slope = self.last(Indicator::LinRegSlope {
                    period: p.regression_period,
                })?;
                let r2 = self.last(Indicator::LinRegR2 {
                    period: p.regression_period,
                })
                .unwrap_or(0.0);
                Some(SignalInput::new(
                    name,
                    Direction::from_value(slope, 0.0),
                    r2,
                    format!("slope {slope:.4}, r² {r2:.2}"),
                ))
            }
            "zscore" => {
                let v = self.last(Indicator::ZScore {
                    period: p.zscore_period,
                })?;
                let level = t.zscore_level;
                Some(overbought_oversold(name, v, -level, level, -2.0 * level, 2.0 * level))
            }
            _ => None,
        }
    }

    fn ma_alignment(&self) -> Option<SignalInput> {
        let mut stack = vec![self.close()];
        stack.extend(ma_stack(self.params).into_iter().filter_map(|ma| self.last(ma)));
        if stack.len() < 2 {
            return None;
        }
        let mut votes = 0.0;
        let mut pairs = 0.0;
        for i in 0..stack.len() {
            for j in i + 1..stack.len() {
                votes += Direction::from_value(stack[i] - stack[j], 0.0).sign();
                pairs += 1.0;
            }
        }
        let net = votes / pairs;
        Some(SignalInput::new(
            "ma_alignment",
            Direction::from_value(net, 0.0),
            net.abs(),
            format!("{} of {} pairs stacked", votes.abs() as usize, pairs as usize),
        ))
    }

    fn macd(&self) -> Option<SignalInput> {
        let p = self.params;
        let macd = |output| Indicator::Macd {
            fast: p.macd_fast,
            slow: p.macd_slow,
            signal: p.macd_signal,
            output,
        };
        let line = self.last(macd(MacdOutput::Line))?;
        let hist = self.last(macd(MacdOutput::Histogram))?;
        let votes = Direction::from_value(line, 0.0).sign() + Direction::from_value(hist, 0.0).sign();
        Some(SignalInput::new(
            "macd",
            Direction::from_value(votes, 0.0),
            votes.abs() / 2.0,
            format!("line {line:.4}, histogram {hist:.4}"),
        ))
    }

    fn adx(&self) -> Option<SignalInput> {
        let period = self.params.adx_period;
        let adx = self.last(Indicator::Dmi {
            period,
            output: DmiOutput::Adx,
        })?;
        let plus = self.last(Indicator::Dmi {
            period,
            output: DmiOutput::PlusDi,
        })?;
        let minus = self.last(Indicator::Dmi {
            period,
            output: DmiOutput::MinusDi,
        })?;
        let confidence = (adx / ADX_FULL).min(1.0);
        if adx < self.t.adx_trend {
            return Some(SignalInput::new("adx", Direction::Neutral, confidence, format!("adx {adx:.1}: no trend")));
        }
        Some(SignalInput::new(
            "adx",
            Direction::from_value(plus - minus, 0.0),
            confidence,
            format!("adx {adx:.1}, +di {plus:.1} vs -di {minus:.1}"),
        ))
    }

    fn ichimoku(&self) -> Option<SignalInput> {
        let p = self.params;
        let span = |output| Indicator::Ichimoku {
            tenkan: p.ichimoku_tenkan,
            kijun: p.ichimoku_kijun,
            senkou_b: p.ichimoku_senkou_b,
            displacement: p.ichimoku_displacement,
            output,
        };
        let a = self.last(span(IchimokuOutput::SenkouA))?;
        let b = self.last(span(IchimokuOutput::SenkouB))?;
        let (top, bottom) = (a.max(b), a.min(b));
        let close = self.close();
        let reading = if close > top {
            SignalInput::new("ichimoku", Direction::Bullish, 1.0, "close above cloud")
        } else if close < bottom {
            SignalInput::new("ichimoku", Direction::Bearish, 1.0, "close below cloud")
        } else {
            SignalInput::new("ichimoku", Direction::Neutral, 0.0, "close inside cloud")
        };
        Some(reading)
    }

    fn obv(&self) -> Option<SignalInput> {
        let series = self.table.get(&Indicator::Obv.name())?;
        let lookback = self.t.obv_lookback.max(1);
        let now = series.last()?;
        let then = series.back(lookback)?;
        let bars = self.store.bars();
        let traded: f64 = bars[bars.len() - lookback..].iter().map(|b| b.volume).sum();
        let delta = now - then;
        let confidence = if traded > 0.0 { (delta.abs() / traded).min(1.0) } else { 0.0 };
        Some(SignalInput::new(
            "obv",
            Direction::from_value(delta, 0.0),
            confidence,
            format!("obv {delta:+.0} over {lookback} bars"),
        ))
    }
}

/// Confidence for `value` past `level` towards `limit`: 0.5 at the level,
/// 1.0 at the limit.
fn beyond(value: f64, level: f64, limit: f64) -> f64 {
    let span = limit - level;
    if span <= 0.0 {
        return 1.0;
    }
    0.5 + 0.5 * ((value - level) / span).clamp(0.0, 1.0)
}

/// Mean-reversion reading: above `high` is bearish, below `low` bullish.
/// `floor`/`ceil` are the ends of the indicator's scale.
fn overbought_oversold(name: &str, value: f64, low: f64, high: f64, floor: f64, ceil: f64) -> SignalInput {
    if value > high {
        SignalInput::new(name, Direction::Bearish, beyond(value, high, ceil), format!("{name} {value:.2} above {high}"))
    } else if value < low {
        SignalInput::new(name, Direction::Bullish, beyond(-value, -low, -floor), format!("{name} {value:.2} below {low}"))
    } else {
        SignalInput::new(name, Direction::Neutral, 0.0, format!("{name} {value:.2} in range"))
    }
}

// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators in the registry.
// Every function returns a vector aligned 1:1 with its input bars, with
// `None` wherever the value is not available (warm-up, division by zero,
// non-finite intermediate, undefined input).
//
// Smoothing conventions, by family:
//   simple window  — SMA, WMA, Bollinger, stochastic, CCI, Williams %R,
//                    Ichimoku midpoints, CMF, MFI, regression, z-score, stddev
//   exponential    — EMA, MACD line and signal, Keltner middle
//                    (α = 2 / (n + 1), SMA-seeded)
//   Wilder         — RSI, ATR, +DI / -DI, ADX (α = 1 / n, SMA-seeded)
//   cumulative     — OBV, VWAP, A/D line (anchored at the first bar)

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod engine;
pub mod ichimoku;
pub mod keltner;
pub mod macd;
pub mod moving_average;
pub mod oscillators;
pub mod registry;
pub mod roc;
pub mod rsi;
pub mod series;
pub mod statistical;
pub mod volume;

pub use engine::{IndicatorEngine, IndicatorTable};
pub use registry::{registry, Indicator};
pub use series::{Family, IndicatorSeries, SeriesStatus};
pub use statistical::{find_extrema, Extremum, ExtremumKind};

// =============================================================================
// Analysis Configuration — every tunable of the pipeline in one place
// =============================================================================
//
// The core never reads files or the environment: callers build (or load) an
// `AnalysisConfig` and pass it into the pipeline explicitly. `load`/`save` are
// used by the service shell only.
//
// All structs carry serde defaults so a partial JSON document (or `{}`) yields
// the documented defaults for everything it leaves out.
//
// =============================================================================

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnalysisError, Result};
use crate::market_data::{Timeframe, DEFAULT_MIN_BARS};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

/// Upper bound on any window, period or span measured in bars.
pub const MAX_WINDOW_BARS: usize = 100_000;

fn default_min_bars() -> usize {
    DEFAULT_MIN_BARS
}

fn default_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::D1]
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Periods and multipliers of the indicator registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
    pub wma_periods: Vec<usize>,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    pub adx_period: usize,

    pub ichimoku_tenkan: usize,
    pub ichimoku_kijun: usize,
    pub ichimoku_senkou_b: usize,
    /// Forward displacement of the Senkou spans, in bars.
    pub ichimoku_displacement: usize,

    pub rsi_period: usize,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub cci_period: usize,
    pub williams_period: usize,
    pub roc_period: usize,
    pub mfi_period: usize,

    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub atr_period: usize,
    pub keltner_ema_period: usize,
    pub keltner_atr_period: usize,
    pub keltner_multiplier: f64,
    pub stddev_period: usize,

    pub cmf_period: usize,
    pub volume_sma_period: usize,

    pub regression_period: usize,
    pub zscore_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_periods: vec![10, 20, 50, 100, 200],
            ema_periods: vec![9, 12, 21, 26, 50, 100, 200],
            wma_periods: vec![10, 20],
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            ichimoku_tenkan: 9,
            ichimoku_kijun: 26,
            ichimoku_senkou_b: 52,
            ichimoku_displacement: 26,
            rsi_period: 14,
            stoch_k_period: 14,
            stoch_d_period: 3,
            cci_period: 20,
            williams_period: 14,
            roc_period: 12,
            mfi_period: 14,
            bollinger_period: 20,
            bollinger_std: 2.0,
            atr_period: 14,
            keltner_ema_period: 20,
            keltner_atr_period: 10,
            keltner_multiplier: 2.0,
            stddev_period: 20,
            cmf_period: 20,
            volume_sma_period: 20,
            regression_period: 20,
            zscore_period: 20,
        }
    }
}

// =============================================================================
// PatternParams
// =============================================================================

/// Geometry tolerances for candlestick and chart templates.
///
/// Candle ratios are fractions of the bar's high-low range unless stated
/// otherwise; chart tolerances are percentages of price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    /// Maximum body / range for a doji.
    pub doji_body_ratio: f64,
    /// Maximum body / range for hammer-family and star middle candles.
    pub small_body_ratio: f64,
    /// Minimum body / range for a "long" candle.
    pub long_body_ratio: f64,
    /// Minimum dominant shadow / body for hammer-family candles.
    pub long_shadow_ratio: f64,
    /// Maximum opposite shadow / range for hammer-family candles.
    pub short_shadow_ratio: f64,
    /// Maximum shadow / range on either side for a marubozu.
    pub marubozu_shadow_ratio: f64,
    /// Bars examined for the prior-trend context of reversal candles.
    pub trend_lookback: usize,

    /// Two pivot prices within this percentage count as equal.
    pub price_tolerance_pct: f64,
    /// Minimum depth of the trough (or height of the peak) between the two
    /// extremes of a double top/bottom.
    pub min_depth_pct: f64,
    /// Minimum prominence of the head over each shoulder.
    pub head_prominence_pct: f64,
    /// A trendline moving less than this percentage per bar is flat.
    pub flat_slope_pct: f64,
    /// Maximum span of a chart pattern, in bars.
    pub max_pattern_bars: usize,
    /// Reversal patterns are only emitted after a confirming close.
    pub require_breakout: bool,

    pub flag_pole_bars: usize,
    pub flag_pole_min_pct: f64,
    pub flag_max_bars: usize,
    /// Maximum retracement of the pole during the flag, in percent of the pole.
    pub flag_max_retrace_pct: f64,

    /// Window of the average volume used for breakout confirmation.
    pub volume_window: usize,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            doji_body_ratio: 0.1,
            small_body_ratio: 0.35,
            long_body_ratio: 0.6,
            long_shadow_ratio: 2.0,
            short_shadow_ratio: 0.1,
            marubozu_shadow_ratio: 0.05,
            trend_lookback: 5,
            price_tolerance_pct: 3.0,
            min_depth_pct: 3.0,
            head_prominence_pct: 2.0,
            flat_slope_pct: 0.1,
            max_pattern_bars: 150,
            require_breakout: true,
            flag_pole_bars: 10,
            flag_pole_min_pct: 8.0,
            flag_max_bars: 15,
            flag_max_retrace_pct: 50.0,
            volume_window: 20,
        }
    }
}

impl PatternParams {
    fn validate(&self) -> Result<()> {
        let spans = [
            ("max_pattern_bars", self.max_pattern_bars),
            ("flag_pole_bars", self.flag_pole_bars),
            ("flag_max_bars", self.flag_max_bars),
            ("trend_lookback", self.trend_lookback),
            ("volume_window", self.volume_window),
        ];
        if let Some((name, n)) = spans.iter().find(|(_, n)| *n == 0 || *n > MAX_WINDOW_BARS) {
            return Err(AnalysisError::invalid(
                *name,
                format!("{n} is outside 1..={MAX_WINDOW_BARS}"),
            ));
        }

        let ratios = [
            ("doji_body_ratio", self.doji_body_ratio),
            ("small_body_ratio", self.small_body_ratio),
            ("long_body_ratio", self.long_body_ratio),
            ("long_shadow_ratio", self.long_shadow_ratio),
            ("short_shadow_ratio", self.short_shadow_ratio),
            ("marubozu_shadow_ratio", self.marubozu_shadow_ratio),
            ("price_tolerance_pct", self.price_tolerance_pct),
            ("min_depth_pct", self.min_depth_pct),
            ("head_prominence_pct", self.head_prominence_pct),
            ("flat_slope_pct", self.flat_slope_pct),
            ("flag_max_retrace_pct", self.flag_max_retrace_pct),
        ];
        if let Some((name, v)) = ratios.iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
            return Err(AnalysisError::invalid(*name, format!("{v} must be finite and non-negative")));
        }
        if !(self.flag_pole_min_pct.is_finite() && self.flag_pole_min_pct > 0.0) {
            return Err(AnalysisError::invalid("flag_pole_min_pct", "must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// StructureParams
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureParams {
    /// Bars on each side a swing point must dominate.
    pub swing_window: usize,
    /// Swing prices within this percentage form one liquidity cluster.
    pub liquidity_tolerance_pct: f64,
    /// Number of volume-profile bins (before tick-size coarsening).
    pub profile_bins: usize,
    /// Optional price tick; the bin size is never finer than this.
    pub tick_size: Option<f64>,
    /// Fraction of total volume the value area must cover.
    pub value_area_fraction: f64,
}

impl Default for StructureParams {
    fn default() -> Self {
        Self {
            swing_window: 5,
            liquidity_tolerance_pct: 0.5,
            profile_bins: 50,
            tick_size: None,
            value_area_fraction: 0.70,
        }
    }
}

// =============================================================================
// SignalParams
// =============================================================================

/// Composite-score bands. Scores at or beyond a cutoff take that band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalBands {
    pub strong_buy: f64,
    pub buy: f64,
    pub sell: f64,
    pub strong_sell: f64,
}

impl Default for SignalBands {
    fn default() -> Self {
        Self {
            strong_buy: 0.6,
            buy: 0.2,
            sell: -0.2,
            strong_sell: -0.6,
        }
    }
}

/// Thresholds used to classify indicator readings into directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub stoch_overbought: f64,
    pub stoch_oversold: f64,
    pub williams_overbought: f64,
    pub williams_oversold: f64,
    pub cci_level: f64,
    pub mfi_overbought: f64,
    pub mfi_oversold: f64,
    /// ADX below this level means "no trend" and the DI vote is neutral.
    pub adx_trend: f64,
    pub cmf_level: f64,
    pub zscore_level: f64,
    /// OBV is compared against its value this many bars back.
    pub obv_lookback: usize,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            stoch_overbought: 80.0,
            stoch_oversold: 20.0,
            williams_overbought: -20.0,
            williams_oversold: -80.0,
            cci_level: 100.0,
            mfi_overbought: 80.0,
            mfi_oversold: 20.0,
            adx_trend: 20.0,
            cmf_level: 0.05,
            zscore_level: 2.0,
            obv_lookback: 10,
        }
    }
}

/// Weight table for the composite score, keyed by signal name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalWeights {
    pub weights: HashMap<String, f64>,
}

impl SignalWeights {
    /// Weight of a named signal; unknown names weigh nothing.
    pub fn get(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        let mut weights = HashMap::new();
        // Trend
        weights.insert("ma_alignment".to_string(), 0.25);
        weights.insert("macd".to_string(), 0.15);
        weights.insert("adx".to_string(), 0.10);
        weights.insert("ichimoku".to_string(), 0.10);
        // Momentum
        weights.insert("rsi".to_string(), 0.10);
        weights.insert("stochastic".to_string(), 0.05);
        weights.insert("williams_r".to_string(), 0.05);
        weights.insert("cci".to_string(), 0.05);
        weights.insert("roc".to_string(), 0.05);
        weights.insert("mfi".to_string(), 0.05);
        // Volatility
        weights.insert("bollinger".to_string(), 0.05);
        // Volume
        weights.insert("obv".to_string(), 0.05);
        weights.insert("cmf".to_string(), 0.05);
        // Statistical
        weights.insert("linreg".to_string(), 0.05);
        weights.insert("zscore".to_string(), 0.05);
        // Discrete events
        weights.insert("patterns".to_string(), 0.15);
        weights.insert("structure".to_string(), 0.15);
        Self { weights }
    }
}

/// Relative weight of each timeframe in the cross-timeframe score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeframeWeights {
    pub weights: HashMap<Timeframe, f64>,
}

impl TimeframeWeights {
    /// Weight of a timeframe; unlisted timeframes weigh 1.0.
    pub fn get(&self, timeframe: Timeframe) -> f64 {
        self.weights.get(&timeframe).copied().unwrap_or(1.0)
    }
}

impl Default for TimeframeWeights {
    fn default() -> Self {
        let weights = [
            (Timeframe::M1, 0.50),
            (Timeframe::M5, 0.60),
            (Timeframe::M15, 0.75),
            (Timeframe::M30, 0.85),
            (Timeframe::H1, 1.00),
            (Timeframe::H4, 1.25),
            (Timeframe::D1, 1.50),
            (Timeframe::W1, 1.75),
            (Timeframe::Mn1, 2.00),
        ]
        .into_iter()
        .collect();
        Self { weights }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    pub weights: SignalWeights,
    pub bands: SignalBands,
    pub thresholds: SignalThresholds,
    pub timeframe_weights: TimeframeWeights,
    /// Patterns ending more than this many bars ago are ignored.
    pub pattern_lookback_bars: usize,
    /// Half-life (bars) of a pattern's influence.
    pub pattern_half_life_bars: f64,
    /// Half-life (bars) of the structure state's influence after its BOS.
    pub structure_half_life_bars: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            bands: SignalBands::default(),
            thresholds: SignalThresholds::default(),
            timeframe_weights: TimeframeWeights::default(),
            pattern_lookback_bars: 10,
            pattern_half_life_bars: 5.0,
            structure_half_life_bars: 30.0,
        }
    }
}

// =============================================================================
// AnalysisConfig
// =============================================================================

/// Top-level configuration for one analysis request.
///
/// Every field has a serde default so that partial JSON documents still
/// deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum bars a series needs before any analysis is attempted.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,

    /// Timeframes analysed when a request does not name any.
    #[serde(default = "default_timeframes")]
    pub default_timeframes: Vec<Timeframe>,

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub patterns: PatternParams,

    #[serde(default)]
    pub structure: StructureParams,

    #[serde(default)]
    pub signals: SignalParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_bars: default_min_bars(),
            default_timeframes: default_timeframes(),
            indicators: IndicatorParams::default(),
            patterns: PatternParams::default(),
            structure: StructureParams::default(),
            signals: SignalParams::default(),
        }
    }
}

impl AnalysisConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let ind = &self.indicators;
        let periods = [
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("adx_period", ind.adx_period),
            ("ichimoku_tenkan", ind.ichimoku_tenkan),
            ("ichimoku_kijun", ind.ichimoku_kijun),
            ("ichimoku_senkou_b", ind.ichimoku_senkou_b),
            ("rsi_period", ind.rsi_period),
            ("stoch_k_period", ind.stoch_k_period),
            ("stoch_d_period", ind.stoch_d_period),
            ("cci_period", ind.cci_period),
            ("williams_period", ind.williams_period),
            ("roc_period", ind.roc_period),
            ("mfi_period", ind.mfi_period),
            ("bollinger_period", ind.bollinger_period),
            ("atr_period", ind.atr_period),
            ("keltner_ema_period", ind.keltner_ema_period),
            ("keltner_atr_period", ind.keltner_atr_period),
            ("stddev_period", ind.stddev_period),
            ("cmf_period", ind.cmf_period),
            ("volume_sma_period", ind.volume_sma_period),
            ("regression_period", ind.regression_period),
            ("zscore_period", ind.zscore_period),
            ("swing_window", self.structure.swing_window),
            ("profile_bins", self.structure.profile_bins),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(AnalysisError::invalid(*name, "must be greater than zero"));
        }
        if let Some((name, p)) = periods.iter().find(|(_, p)| *p > MAX_WINDOW_BARS) {
            return Err(AnalysisError::invalid(*name, format!("{p} exceeds {MAX_WINDOW_BARS} bars")));
        }
        if ind.ichimoku_displacement > MAX_WINDOW_BARS {
            return Err(AnalysisError::invalid(
                "ichimoku_displacement",
                format!("exceeds {MAX_WINDOW_BARS} bars"),
            ));
        }
        for (name, list) in [
            ("sma_periods", &ind.sma_periods),
            ("ema_periods", &ind.ema_periods),
            ("wma_periods", &ind.wma_periods),
        ] {
            if list.iter().any(|&p| p == 0 || p > MAX_WINDOW_BARS) {
                return Err(AnalysisError::invalid(
                    name,
                    format!("periods must be within 1..={MAX_WINDOW_BARS}"),
                ));
            }
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(AnalysisError::invalid(
                "macd_fast",
                "fast period must be shorter than slow period",
            ));
        }
        if self.min_bars == 0 {
            return Err(AnalysisError::invalid("min_bars", "must be greater than zero"));
        }

        let va = self.structure.value_area_fraction;
        if !(va > 0.0 && va <= 1.0) {
            return Err(AnalysisError::invalid(
                "value_area_fraction",
                format!("{va} is outside (0, 1]"),
            ));
        }
        if let Some(tick) = self.structure.tick_size {
            if !(tick > 0.0 && tick.is_finite()) {
                return Err(AnalysisError::invalid("tick_size", "must be positive"));
            }
        }

        self.patterns.validate()?;

        let liq = self.structure.liquidity_tolerance_pct;
        if !(liq.is_finite() && liq >= 0.0) {
            return Err(AnalysisError::invalid("liquidity_tolerance_pct", "must be non-negative"));
        }

        let sig = &self.signals;
        for (name, hl) in [
            ("pattern_half_life_bars", sig.pattern_half_life_bars),
            ("structure_half_life_bars", sig.structure_half_life_bars),
        ] {
            if !(hl.is_finite() && hl > 0.0) {
                return Err(AnalysisError::invalid(name, format!("{hl} is not a positive half-life")));
            }
        }
        if sig.pattern_lookback_bars > MAX_WINDOW_BARS || sig.thresholds.obv_lookback > MAX_WINDOW_BARS {
            return Err(AnalysisError::invalid(
                "lookback",
                format!("pattern and obv lookbacks must not exceed {MAX_WINDOW_BARS} bars"),
            ));
        }

        let b = &self.signals.bands;
        if !(b.strong_buy >= b.buy && b.buy > b.sell && b.sell >= b.strong_sell) {
            return Err(AnalysisError::invalid(
                "bands",
                "cutoffs must satisfy strong_buy >= buy > sell >= strong_sell",
            ));
        }
        if let Some((name, w)) = self
            .signals
            .weights
            .weights
            .iter()
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(AnalysisError::invalid(
                format!("weights.{name}"),
                format!("{w} is not a non-negative weight"),
            ));
        }
        if self
            .signals
            .timeframe_weights
            .weights
            .values()
            .any(|w| !(w.is_finite() && *w >= 0.0))
        {
            return Err(AnalysisError::invalid(
                "timeframe_weights",
                "weights must be non-negative",
            ));
        }
        Ok(())
    }

    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analysis config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid analysis config in {}", path.display()))?;

        info!(
            path = %path.display(),
            timeframes = ?config.default_timeframes,
            "analysis config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration using an atomic write (write to `.tmp`,
    /// then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> AnyResult<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise analysis config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "analysis config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.min_bars, 2);
        assert_eq!(cfg.indicators.rsi_period, 14);
        assert_eq!(
            (cfg.indicators.macd_fast, cfg.indicators.macd_slow, cfg.indicators.macd_signal),
            (12, 26, 9)
        );
        assert_eq!(cfg.indicators.bollinger_period, 20);
        assert!((cfg.indicators.bollinger_std - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.structure.swing_window, 5);
        assert_eq!(cfg.structure.profile_bins, 50);
        assert!((cfg.structure.value_area_fraction - 0.70).abs() < f64::EPSILON);
        assert!((cfg.signals.bands.strong_buy - 0.6).abs() < f64::EPSILON);
        assert!((cfg.signals.bands.sell + 0.2).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "default_timeframes": ["1h", "1d"],
            "indicators": { "rsi_period": 9 },
            "signals": { "weights": { "rsi": 0.5 } }
        }"#;
        let cfg: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.default_timeframes, vec![Timeframe::H1, Timeframe::D1]);
        assert_eq!(cfg.indicators.rsi_period, 9);
        assert_eq!(cfg.indicators.atr_period, 14);
        // A supplied weight table replaces the defaults wholesale.
        assert_eq!(cfg.signals.weights.get("rsi"), 0.5);
        assert_eq!(cfg.signals.weights.get("macd"), 0.0);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = AnalysisConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, cfg2);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = AnalysisConfig::default();
        cfg.indicators.rsi_period = 0;
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidParameter { .. })));

        let mut cfg = AnalysisConfig::default();
        cfg.structure.value_area_fraction = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.signals.bands.buy = -0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.signals.weights.weights.insert("rsi".into(), -1.0);
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.indicators.macd_fast = 30;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_bounds_pattern_spans_and_half_lives() {
        let rejected = |edit: fn(&mut AnalysisConfig)| {
            let mut cfg = AnalysisConfig::default();
            edit(&mut cfg);
            matches!(cfg.validate(), Err(AnalysisError::InvalidParameter { .. }))
        };
        assert!(rejected(|c| c.patterns.max_pattern_bars = usize::MAX));
        assert!(rejected(|c| c.patterns.flag_max_bars = usize::MAX));
        assert!(rejected(|c| c.patterns.flag_pole_bars = 0));
        assert!(rejected(|c| c.patterns.volume_window = MAX_WINDOW_BARS + 1));
        assert!(rejected(|c| c.patterns.trend_lookback = 0));
        assert!(rejected(|c| c.patterns.flag_pole_min_pct = 0.0));
        assert!(rejected(|c| c.patterns.price_tolerance_pct = f64::NAN));
        assert!(rejected(|c| c.signals.pattern_half_life_bars = 0.0));
        assert!(rejected(|c| c.signals.structure_half_life_bars = -1.0));
        assert!(rejected(|c| c.indicators.rsi_period = usize::MAX));
        assert!(rejected(|c| c.indicators.sma_periods.push(usize::MAX)));
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("aurora-ta-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("analysis_config.json");

        let mut cfg = AnalysisConfig::default();
        cfg.structure.profile_bins = 24;
        cfg.save(&path).unwrap();

        let loaded = AnalysisConfig::load(&path).unwrap();
        assert_eq!(loaded.structure.profile_bins, 24);
        let _ = std::fs::remove_dir_all(&dir);
    }
}

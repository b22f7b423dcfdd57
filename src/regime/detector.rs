// =============================================================================
// Market Regime Detector
// =============================================================================
//
// Labels the latest bar of a series with one of five regimes. Rules are
// evaluated top-to-bottom; first match wins:
//
//   1. DEAD      — entropy >= 0.95            (candle direction is noise)
//   2. VOLATILE  — BBW > 5.0                  (band expansion)
//   3. SQUEEZE   — BBW < 1.5 AND ADX < 20     (compression)
//   4. TRENDING  — ADX > 25 AND Hurst > 0.55  (persistent move)
//   5. RANGING   — ADX < 20 AND Hurst < 0.45  (mean-reverting chop)
//
// No match falls back to RANGING with confidence 0.30. BBW is the Bollinger
// width in percent of the middle band.
//
// The label is report metadata; it does not feed the composite score.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::analysis_config::IndicatorParams;
use crate::indicators::registry::{BandOutput, DmiOutput, Indicator};
use crate::indicators::IndicatorTable;
use crate::market_data::SeriesStore;
use crate::regime::entropy::{candle_entropy, DEFAULT_WINDOW};
use crate::regime::hurst::calculate_hurst_exponent;

const NEUTRAL_HURST: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Trending,
    Ranging,
    Volatile,
    Squeeze,
    Dead,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trending => write!(f, "TRENDING"),
            Self::Ranging => write!(f, "RANGING"),
            Self::Volatile => write!(f, "VOLATILE"),
            Self::Squeeze => write!(f, "SQUEEZE"),
            Self::Dead => write!(f, "DEAD"),
        }
    }
}

/// Regime label plus the metrics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub regime: MarketRegime,
    pub adx: f64,
    pub bbw: f64,
    /// 0.5 when the series is too short for R/S analysis.
    pub hurst: f64,
    /// 0.0 when fewer bars than the entropy window exist.
    pub entropy: f64,
    pub confidence: f64,
}

/// Label the last bar of `store`. `None` until both ADX and Bollinger width
/// are available.
pub fn detect_regime(store: &SeriesStore, table: &IndicatorTable, params: &IndicatorParams) -> Option<RegimeState> {
    let adx_name = Indicator::Dmi {
        period: params.adx_period,
        output: DmiOutput::Adx,
    }
    .name();
    let bbw_name = Indicator::Bollinger {
        period: params.bollinger_period,
        num_std: params.bollinger_std,
        output: BandOutput::Width,
    }
    .name();

    let adx = table.last(&adx_name)?;
    let bbw = table.last(&bbw_name)?;
    let hurst = calculate_hurst_exponent(&store.closes()).unwrap_or(NEUTRAL_HURST);
    let entropy = candle_entropy(store.bars(), DEFAULT_WINDOW).unwrap_or(0.0);

    let (regime, confidence) = classify(adx, bbw, hurst, entropy);
    debug!(
        series = %store.meta(),
        regime = %regime,
        adx = format!("{:.2}", adx),
        bbw = format!("{:.2}", bbw),
        hurst = format!("{:.4}", hurst),
        entropy = format!("{:.4}", entropy),
        confidence = format!("{:.2}", confidence),
        "regime detected"
    );

    Some(RegimeState {
        regime,
        adx,
        bbw,
        hurst,
        entropy,
        confidence,
    })
}

fn classify(adx: f64, bbw: f64, hurst: f64, entropy: f64) -> (MarketRegime, f64) {
    if entropy >= 0.95 {
        return (MarketRegime::Dead, remap(entropy, 0.95, 1.0, 0.70, 1.0));
    }

    if bbw > 5.0 {
        return (MarketRegime::Volatile, remap(bbw, 5.0, 10.0, 0.65, 1.0));
    }

    if bbw < 1.5 && adx < 20.0 {
        let bbw_conf = remap(bbw, 1.5, 0.5, 0.50, 1.0);
        let adx_conf = remap(adx, 20.0, 5.0, 0.50, 1.0);
        return (MarketRegime::Squeeze, (bbw_conf + adx_conf) / 2.0);
    }

    if adx > 25.0 && hurst > 0.55 {
        let adx_conf = remap(adx, 25.0, 50.0, 0.60, 1.0);
        let hurst_conf = remap(hurst, 0.55, 0.80, 0.60, 1.0);
        return (MarketRegime::Trending, (adx_conf + hurst_conf) / 2.0);
    }

    if adx < 20.0 && hurst < 0.45 {
        let adx_conf = remap(adx, 20.0, 5.0, 0.50, 1.0);
        let hurst_conf = remap(hurst, 0.45, 0.20, 0.50, 1.0);
        return (MarketRegime::Ranging, (adx_conf + hurst_conf) / 2.0);
    }

    trace!(
        adx = format!("{:.2}", adx),
        bbw = format!("{:.2}", bbw),
        hurst = format!("{:.4}", hurst),
        "regime: no rule matched, defaulting to ranging"
    );
    (MarketRegime::Ranging, 0.30)
}

/// Linearly map `value` from `[in_lo, in_hi]` onto `[out_lo, out_hi]`,
/// clamped. `in_lo > in_hi` is allowed.
fn remap(value: f64, in_lo: f64, in_hi: f64, out_lo: f64, out_hi: f64) -> f64 {
    let t = if (in_hi - in_lo).abs() < f64::EPSILON {
        0.5
    } else {
        (value - in_lo) / (in_hi - in_lo)
    };
    out_lo + t.clamp(0.0, 1.0) * (out_hi - out_lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_config::AnalysisConfig;
    use crate::indicators::IndicatorEngine;
    use crate::market_data::{Bar, SeriesMeta, Timeframe};

    fn store(closes: &[f64]) -> SeriesStore {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = if i == 0 { c } else { closes[i - 1] };
                Bar::new(i as i64 * 60_000, open, open.max(c) + 0.2, open.min(c) - 0.2, c, 50.0)
            })
            .collect();
        SeriesStore::new(SeriesMeta::new("RG", Timeframe::M1), bars).unwrap()
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify(30.0, 3.0, 0.50, 0.98).0, MarketRegime::Dead);
        assert_eq!(classify(40.0, 3.0, 0.70, 0.97).0, MarketRegime::Dead);
        assert_eq!(classify(30.0, 7.0, 0.50, 0.50).0, MarketRegime::Volatile);
        assert_eq!(classify(15.0, 1.0, 0.50, 0.50).0, MarketRegime::Squeeze);
        assert_eq!(classify(35.0, 3.0, 0.65, 0.50).0, MarketRegime::Trending);
        assert_eq!(classify(15.0, 3.0, 0.40, 0.50).0, MarketRegime::Ranging);
    }

    #[test]
    fn fallback_is_low_confidence_ranging() {
        let (regime, conf) = classify(22.0, 3.0, 0.50, 0.50);
        assert_eq!(regime, MarketRegime::Ranging);
        assert!((conf - 0.30).abs() < 1e-10);
    }

    #[test]
    fn remap_clamps() {
        assert!((remap(0.5, 0.0, 1.0, 0.0, 10.0) - 5.0).abs() < 1e-10);
        assert!((remap(2.0, 0.0, 1.0, 0.0, 10.0) - 10.0).abs() < 1e-10);
        assert!(remap(-1.0, 0.0, 1.0, 0.0, 10.0).abs() < 1e-10);
    }

    #[test]
    fn short_series_has_no_regime() {
        let s = store(&[10.0, 10.5, 11.0, 10.8]);
        let config = AnalysisConfig::default();
        let table = IndicatorEngine::from_config(&config).compute(&s);
        assert!(detect_regime(&s, &table, &config.indicators).is_none());
    }

    #[test]
    fn steady_uptrend_is_labelled() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.8).collect();
        let s = store(&closes);
        let config = AnalysisConfig::default();
        let table = IndicatorEngine::from_config(&config).compute(&s);
        let state = detect_regime(&s, &table, &config.indicators).unwrap();
        assert!(state.adx > 25.0);
        assert!(state.entropy.abs() < 1e-10);
        assert!((0.0..=1.0).contains(&state.confidence));
    }
}

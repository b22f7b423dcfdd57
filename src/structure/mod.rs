// =============================================================================
// Structure Analyzer — swings, BOS, order blocks, liquidity, volume profile
// =============================================================================
//
// All zones share one shape (`StructureZone`). Invalidated zones stay in the
// output with `active = false` and the bar that invalidated them.
// =============================================================================

pub mod order_blocks;
pub mod swings;
pub mod volume_profile;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis_config::{AnalysisConfig, StructureParams};
use crate::indicators::find_extrema;
use crate::market_data::SeriesStore;
use crate::types::Direction;

pub use swings::{BosEvent, StructureState};
pub use volume_profile::{ValueArea, VolumeProfile, VolumeProfileBin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    OrderBlock,
    LiquidityZone,
    SwingHigh,
    SwingLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureZone {
    pub kind: ZoneKind,
    pub direction: Direction,
    pub price_low: f64,
    pub price_high: f64,
    pub formation_index: usize,
    pub active: bool,
    pub invalidated_index: Option<usize>,
}

impl StructureZone {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.price_low && price <= self.price_high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub zones: Vec<StructureZone>,
    pub events: Vec<BosEvent>,
    pub state: StructureState,
    pub last_bos_index: Option<usize>,
    pub volume_profile: VolumeProfile,
}

impl StructureAnalysis {
    pub fn active_zones(&self) -> impl Iterator<Item = &StructureZone> {
        self.zones.iter().filter(|z| z.active)
    }

    pub fn zones_of(&self, kind: ZoneKind) -> impl Iterator<Item = &StructureZone> {
        self.zones.iter().filter(move |z| z.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    params: StructureParams,
}

impl StructureAnalyzer {
    pub fn new(params: &StructureParams) -> Self {
        Self { params: params.clone() }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(&config.structure)
    }

    pub fn analyze(&self, store: &SeriesStore) -> StructureAnalysis {
        let p = &self.params;
        let bars = store.bars();
        let extrema = find_extrema(&store.highs(), &store.lows(), p.swing_window);
        let walk = swings::break_of_structure(bars, &extrema, p.swing_window);

        let mut zones = swings::swing_zones(&extrema, &walk.broken_at);
        zones.extend(order_blocks::order_blocks(bars, &walk.events));
        zones.extend(order_blocks::liquidity_zones(bars, &extrema, p.liquidity_tolerance_pct));
        zones.sort_by(|a, b| a.formation_index.cmp(&b.formation_index).then(a.kind.cmp(&b.kind)));

        let profile = volume_profile::volume_profile(bars, p.profile_bins, p.tick_size, p.value_area_fraction);

        debug!(
            series = %store.meta(),
            swings = extrema.len(),
            bos = walk.events.len(),
            zones = zones.len(),
            state = ?walk.state,
            "structure analysed"
        );

        StructureAnalysis {
            last_bos_index: walk.events.last().map(|e| e.index),
            zones,
            events: walk.events,
            state: walk.state,
            volume_profile: profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Bar, SeriesMeta, Timeframe};

    fn store(closes: &[f64]) -> SeriesStore {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = if i == 0 { c } else { closes[i - 1] };
                Bar::new(i as i64 * 3_600_000, open, open.max(c) + 0.5, open.min(c) - 0.5, c, 100.0)
            })
            .collect();
        SeriesStore::new(SeriesMeta::new("ST", Timeframe::H1), bars).unwrap()
    }

    fn rally_pullback_breakout() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..=10).map(|i| 100.0 + i as f64).collect();
        closes.extend((1..=6).map(|i| 110.0 - i as f64));
        closes.extend((1..=14).map(|i| 104.0 + i as f64));
        closes
    }

    #[test]
    fn breakout_gives_bullish_state_and_order_block() {
        let analysis = StructureAnalyzer::from_config(&AnalysisConfig::default()).analyze(&store(&rally_pullback_breakout()));
        assert_eq!(analysis.state, StructureState::Bullish);
        assert!(analysis.last_bos_index.is_some());

        let block = analysis
            .zones_of(ZoneKind::OrderBlock)
            .find(|z| z.direction == Direction::Bullish)
            .expect("bullish order block");
        assert!(block.price_low < block.price_high);
        assert!(block.formation_index < analysis.last_bos_index.unwrap());
    }

    #[test]
    fn zones_sorted_by_formation() {
        let analysis = StructureAnalyzer::from_config(&AnalysisConfig::default()).analyze(&store(&rally_pullback_breakout()));
        for pair in analysis.zones.windows(2) {
            assert!(pair[0].formation_index <= pair[1].formation_index);
        }
        for zone in &analysis.zones {
            assert_eq!(zone.active, zone.invalidated_index.is_none());
        }
    }

    #[test]
    fn short_series_still_analysed() {
        let analysis = StructureAnalyzer::from_config(&AnalysisConfig::default()).analyze(&store(&[10.0, 11.0, 10.5]));
        assert!(analysis.zones.is_empty());
        assert_eq!(analysis.state, StructureState::NoTrend);
        let binned: f64 = analysis.volume_profile.bins.iter().map(|b| b.volume).sum();
        assert!((binned - 300.0).abs() < 1e-9);
    }
}

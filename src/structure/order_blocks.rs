// =============================================================================
// Order Blocks and Liquidity Zones
// =============================================================================
//
// Order block: on a bullish BOS, the last bearish candle before the break,
// searching back from the break bar no further than the broken swing, is a
// bullish (demand) block spanning that candle's low..high. Bearish BOS is
// symmetric. A later close below a bullish block's low (above a bearish
// block's high) invalidates it.
//
// Liquidity zone: two or more swing highs (or lows) within a relative price
// tolerance of each other. Clustering runs over prices sorted ascending and
// grows a cluster while the next price stays within tolerance of the
// cluster's lowest price. The zone is swept by a later close beyond it.
// =============================================================================

use crate::indicators::statistical::{Extremum, ExtremumKind};
use crate::market_data::Bar;
use crate::structure::swings::BosEvent;
use crate::structure::{StructureZone, ZoneKind};
use crate::types::Direction;

pub fn order_blocks(bars: &[Bar], events: &[BosEvent]) -> Vec<StructureZone> {
    let mut zones = Vec::new();
    for event in events {
        let want_bearish_candle = match event.direction {
            Direction::Bullish => true,
            Direction::Bearish => false,
            Direction::Neutral => continue,
        };
        let Some(origin) = (event.swing_index..event.index).rev().find(|&j| {
            if want_bearish_candle {
                bars[j].is_bearish()
            } else {
                bars[j].is_bullish()
            }
        }) else {
            continue;
        };

        let candle = &bars[origin];
        let mut zone = StructureZone {
            kind: ZoneKind::OrderBlock,
            direction: event.direction,
            price_low: candle.low,
            price_high: candle.high,
            formation_index: origin,
            active: true,
            invalidated_index: None,
        };
        zone.invalidated_index = (event.index + 1..bars.len()).find(|&k| match zone.direction {
            Direction::Bullish => bars[k].close < zone.price_low,
            _ => bars[k].close > zone.price_high,
        });
        zone.active = zone.invalidated_index.is_none();
        zones.push(zone);
    }
    zones
}

pub fn liquidity_zones(bars: &[Bar], extrema: &[Extremum], tolerance_pct: f64) -> Vec<StructureZone> {
    let mut zones = Vec::new();
    for kind in [ExtremumKind::High, ExtremumKind::Low] {
        let mut members: Vec<&Extremum> = extrema.iter().filter(|e| e.kind == kind).collect();
        members.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.index.cmp(&b.index)));

        let mut start = 0;
        while start < members.len() {
            let floor = members[start].price;
            let mut end = start + 1;
            while end < members.len() && floor > 0.0 && (members[end].price - floor) / floor * 100.0 <= tolerance_pct {
                end += 1;
            }
            if end - start >= 2 {
                zones.push(cluster_zone(bars, &members[start..end], kind));
            }
            start = end;
        }
    }
    zones.sort_by_key(|z| z.formation_index);
    zones
}

fn cluster_zone(bars: &[Bar], cluster: &[&Extremum], kind: ExtremumKind) -> StructureZone {
    let price_low = cluster.iter().map(|e| e.price).fold(f64::INFINITY, f64::min);
    let price_high = cluster.iter().map(|e| e.price).fold(f64::NEG_INFINITY, f64::max);
    let formed = cluster.iter().map(|e| e.index).max().unwrap_or(0);

    // Resting liquidity above equal highs is sell-side resistance.
    let direction = match kind {
        ExtremumKind::High => Direction::Bearish,
        ExtremumKind::Low => Direction::Bullish,
    };
    let swept = (formed + 1..bars.len()).find(|&k| match kind {
        ExtremumKind::High => bars[k].close > price_high,
        ExtremumKind::Low => bars[k].close < price_low,
    });

    StructureZone {
        kind: ZoneKind::LiquidityZone,
        direction,
        price_low,
        price_high,
        formation_index: formed,
        active: swept.is_none(),
        invalidated_index: swept,
    }
}

// =============================================================================
// Volume Profile — volume-at-price histogram, POC and value area
// =============================================================================
//
// Bins cover [min low, max high] in equal steps. Each bar's volume is spread
// over the bins its [low, high] range overlaps, proportionally to overlap; the
// last overlapped bin takes whatever rounding left over so the bar's volume is
// conserved exactly. A bar with zero range lands in a single bin.
//
// Value area: the shortest run of adjacent bins whose volume reaches
// `fraction × total`. Among equally short runs, prefer the one containing the
// POC, then the larger volume, then the lower price.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Bar;

/// Relative slack when comparing float sums against the value-area target.
const TARGET_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfileBin {
    pub price_low: f64,
    pub price_high: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    pub low_bin: usize,
    pub high_bin: usize,
    pub price_low: f64,
    pub price_high: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub bins: Vec<VolumeProfileBin>,
    pub bin_size: f64,
    pub total_volume: f64,
    /// Index of the point-of-control bin.
    pub poc: Option<usize>,
    pub value_area: Option<ValueArea>,
}

impl VolumeProfile {
    pub fn poc_bin(&self) -> Option<&VolumeProfileBin> {
        self.poc.and_then(|i| self.bins.get(i))
    }

    /// Midpoint price of the POC bin.
    pub fn poc_price(&self) -> Option<f64> {
        self.poc_bin().map(|b| (b.price_low + b.price_high) / 2.0)
    }
}

pub fn volume_profile(bars: &[Bar], bins: usize, tick_size: Option<f64>, fraction: f64) -> VolumeProfile {
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    if bars.is_empty() || !low.is_finite() || !high.is_finite() {
        return VolumeProfile {
            bins: Vec::new(),
            bin_size: 0.0,
            total_volume: 0.0,
            poc: None,
            value_area: None,
        };
    }

    let range = high - low;
    let (bin_size, count) = if range <= 0.0 {
        (0.0, 1)
    } else {
        let even = range / bins.max(1) as f64;
        match tick_size {
            Some(tick) if tick > even => (tick, ((range / tick).ceil() as usize).max(1)),
            _ => (even, bins.max(1)),
        }
    };

    let mut profile: Vec<VolumeProfileBin> = (0..count)
        .map(|i| {
            let price_low = low + i as f64 * bin_size;
            VolumeProfileBin {
                price_low,
                price_high: if i + 1 == count { high.max(price_low + bin_size) } else { price_low + bin_size },
                volume: 0.0,
            }
        })
        .collect();

    let locate = |price: f64| -> usize {
        if bin_size <= 0.0 {
            return 0;
        }
        (((price - low) / bin_size).floor().max(0.0) as usize).min(count - 1)
    };

    for bar in bars {
        let first = locate(bar.low);
        let last = locate(bar.high);
        let span = bar.high - bar.low;
        if span <= 0.0 || first == last {
            profile[first].volume += bar.volume;
            continue;
        }
        let mut assigned = 0.0;
        for bin in &mut profile[first..last] {
            let overlap = (bar.high.min(bin.price_high) - bar.low.max(bin.price_low)).max(0.0);
            let share = bar.volume * overlap / span;
            bin.volume += share;
            assigned += share;
        }
        profile[last].volume += bar.volume - assigned;
    }

    let total_volume: f64 = bars.iter().map(|b| b.volume).sum();
    let (poc, value_area) = if total_volume > 0.0 {
        let poc = point_of_control(&profile);
        (Some(poc), Some(value_area(&profile, poc, total_volume * fraction)))
    } else {
        (None, None)
    };

    VolumeProfile {
        bins: profile,
        bin_size,
        total_volume,
        poc,
        value_area,
    }
}

/// First bin holding the maximum volume.
fn point_of_control(bins: &[VolumeProfileBin]) -> usize {
    let mut best = 0;
    for (i, bin) in bins.iter().enumerate() {
        if bin.volume > bins[best].volume {
            best = i;
        }
    }
    best
}

fn value_area(bins: &[VolumeProfileBin], poc: usize, target: f64) -> ValueArea {
    let n = bins.len();
    let mut prefix = vec![0.0; n + 1];
    for (i, bin) in bins.iter().enumerate() {
        prefix[i + 1] = prefix[i] + bin.volume;
    }
    let slack = TARGET_EPS * prefix[n].max(1.0);

    for width in 1..=n {
        // (contains poc, volume, start)
        let mut best: Option<(bool, f64, usize)> = None;
        for start in 0..=n - width {
            let volume = prefix[start + width] - prefix[start];
            if volume + slack < target {
                continue;
            }
            let contains = (start..start + width).contains(&poc);
            let better = match best {
                None => true,
                Some((c, v, _)) => (contains && !c) || (contains == c && volume > v + slack),
            };
            if better {
                best = Some((contains, volume, start));
            }
        }
        if let Some((_, volume, start)) = best {
            let end = start + width - 1;
            return ValueArea {
                low_bin: start,
                high_bin: end,
                price_low: bins[start].price_low,
                price_high: bins[end].price_high,
                volume,
            };
        }
    }

    ValueArea {
        low_bin: 0,
        high_bin: n.saturating_sub(1),
        price_low: bins.first().map_or(0.0, |b| b.price_low),
        price_high: bins.last().map_or(0.0, |b| b.price_high),
        volume: prefix[n],
    }
}

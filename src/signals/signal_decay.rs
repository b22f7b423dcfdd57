// =============================================================================
// Signal Decay — half-life freshness in bars
// =============================================================================
//
// An event's influence halves every `half_life` bars:
//
//   decay(age) = 0.5 ^ (age / half_life)
//
// Age is counted in bars from the event's end to the last bar of the series,
// so the same event weighs the same no matter when the analysis runs.

use crate::types::Direction;

/// Decay factor for an event `age` bars old. A non-positive half-life keeps
/// only events on the last bar.
pub fn decay_factor(age: usize, half_life: f64) -> f64 {
    if half_life <= 0.0 || !half_life.is_finite() {
        return if age == 0 { 1.0 } else { 0.0 };
    }
    0.5_f64.powf(age as f64 / half_life)
}

/// Net several directional events into one `(direction, confidence)` pair.
///
/// Each item is `(direction, confidence, age)`. The signed sum of
/// `confidence × decay` decides the direction; its magnitude, capped at 1,
/// is the confidence. `None` when there are no items.
pub fn net_decayed<I>(items: I, half_life: f64) -> Option<(Direction, f64)>
where
    I: IntoIterator<Item = (Direction, f64, usize)>,
{
    let mut any = false;
    let mut net = 0.0;
    for (direction, confidence, age) in items {
        any = true;
        net += direction.sign() * confidence * decay_factor(age, half_life);
    }
    if !any {
        return None;
    }
    Some((Direction::from_value(net, 0.0), net.abs().min(1.0)))
}

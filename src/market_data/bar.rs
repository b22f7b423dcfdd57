use serde::{Deserialize, Serialize};

/// A single OHLCV sample for a fixed interval.
///
/// `timestamp` is the bar's open time in Unix epoch milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check the per-bar invariants:
    /// `high >= max(open, close) >= min(open, close) >= low >= 0`, `volume >= 0`,
    /// every field finite.
    pub fn check(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} is not finite ({value})"));
        }
        if self.low < 0.0 {
            return Err(format!("low {} is negative", self.low));
        }
        if self.volume < 0.0 {
            return Err(format!("volume {} is negative", self.volume));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} below body top {}",
                self.high,
                self.open.max(self.close)
            ));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "low {} above body bottom {}",
                self.low,
                self.open.min(self.close)
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    #[inline]
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    #[inline]
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.body_top()
    }

    #[inline]
    pub fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Midpoint of the real body.
    #[inline]
    pub fn body_mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    /// Typical price: (high + low + close) / 3.
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// True range against the previous close.
    #[inline]
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_bar_passes() {
        assert!(Bar::new(0, 10.0, 12.0, 9.0, 11.0, 100.0).check().is_ok());
        // Flat bar with zero volume is legal.
        assert!(Bar::new(0, 10.0, 10.0, 10.0, 10.0, 0.0).check().is_ok());
    }

    #[test]
    fn high_below_close_rejected() {
        let err = Bar::new(0, 10.0, 10.5, 9.0, 11.0, 1.0).check().unwrap_err();
        assert!(err.contains("high"));
    }

    #[test]
    fn low_above_open_rejected() {
        assert!(Bar::new(0, 10.0, 12.0, 10.5, 11.0, 1.0).check().is_err());
    }

    #[test]
    fn negative_and_nan_rejected() {
        assert!(Bar::new(0, 1.0, 2.0, 0.5, 1.5, -1.0).check().is_err());
        assert!(Bar::new(0, f64::NAN, 2.0, 0.5, 1.5, 1.0).check().is_err());
        assert!(Bar::new(0, 0.0, 0.0, -0.5, 0.0, 1.0).check().is_err());
    }

    #[test]
    fn geometry_helpers() {
        let bar = Bar::new(0, 10.0, 14.0, 8.0, 12.0, 1.0);
        assert_eq!(bar.range(), 6.0);
        assert_eq!(bar.body(), 2.0);
        assert_eq!(bar.upper_shadow(), 2.0);
        assert_eq!(bar.lower_shadow(), 2.0);
        assert!(bar.is_bullish());
        assert!((bar.typical_price() - 34.0 / 3.0).abs() < 1e-12);
        // Gap scenario: |H - prevClose| > H - L.
        assert_eq!(bar.true_range(4.0), 10.0);
    }
}

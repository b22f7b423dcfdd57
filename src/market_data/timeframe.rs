// =============================================================================
// Timeframes and bucket alignment
// =============================================================================
//
// Fixed-duration timeframes bucket on multiples of their duration from the
// local epoch. Weekly buckets start Monday 00:00 local (the Unix epoch fell on
// a Thursday, so the anchor is shifted by three days). Monthly buckets start
// on the first of the month and are computed through chrono.

use std::str::FromStr;

use chrono::{Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
/// Days between the Monday preceding the Unix epoch and the epoch itself.
const WEEK_ANCHOR_MS: i64 = 3 * DAY_MS;

/// Bar interval. Variants are declared finest to coarsest so `Ord` follows
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    Mn1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Self::M1,
        Self::M5,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::D1,
        Self::W1,
        Self::Mn1,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
            Self::W1 => "1w",
            Self::Mn1 => "1M",
        }
    }

    /// Fixed duration in milliseconds; `None` for calendar months.
    pub fn duration_ms(self) -> Option<i64> {
        match self {
            Self::M1 => Some(MINUTE_MS),
            Self::M5 => Some(5 * MINUTE_MS),
            Self::M15 => Some(15 * MINUTE_MS),
            Self::M30 => Some(30 * MINUTE_MS),
            Self::H1 => Some(HOUR_MS),
            Self::H4 => Some(4 * HOUR_MS),
            Self::D1 => Some(DAY_MS),
            Self::W1 => Some(WEEK_MS),
            Self::Mn1 => None,
        }
    }

    /// Whether bars of `self` can be aggregated into whole `target` buckets.
    pub fn divides(self, target: Timeframe) -> bool {
        if self >= target {
            return false;
        }
        match (self.duration_ms(), target.duration_ms()) {
            (Some(src), Some(dst)) => dst % src == 0,
            // Months are whole days but not whole weeks.
            (Some(src), None) => DAY_MS % src == 0,
            _ => false,
        }
    }

    /// Start of the bucket containing `timestamp` (UTC ms), aligned in the
    /// given source timezone, returned as UTC ms. `None` when the timestamp
    /// is too close to the edge of the i64 range to be aligned.
    pub fn bucket_start(self, timestamp: i64, offset: FixedOffset) -> Option<i64> {
        let offset_ms = i64::from(offset.local_minus_utc()) * 1_000;
        let local = timestamp.checked_add(offset_ms)?;
        let local_start = match self {
            Self::W1 => local
                .checked_add(WEEK_ANCHOR_MS)?
                .div_euclid(WEEK_MS)
                .checked_mul(WEEK_MS)?
                .checked_sub(WEEK_ANCHOR_MS)?,
            Self::Mn1 => month_start(local)?,
            other => {
                // Every non-monthly variant has a fixed duration.
                let dur = other.duration_ms().unwrap_or(DAY_MS);
                local.div_euclid(dur) * dur
            }
        };
        local_start.checked_sub(offset_ms)
    }
}

fn month_start(local_ms: i64) -> Option<i64> {
    let dt = Utc.timestamp_millis_opt(local_ms).single()?;
    let first = NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&first).timestamp_millis())
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.label() == trimmed)
            .or_else(|| match trimmed.to_ascii_lowercase().as_str() {
                "1min" => Some(Self::M1),
                "1hour" | "60m" => Some(Self::H1),
                "1day" | "daily" => Some(Self::D1),
                "1week" | "weekly" => Some(Self::W1),
                "1month" | "monthly" | "1mo" => Some(Self::Mn1),
                _ => None,
            })
            .ok_or_else(|| AnalysisError::invalid("timeframe", format!("unknown timeframe '{s}'")))
    }
}

/// Parse a source timezone: `UTC`, `Z`, or a fixed offset `+HH:MM` / `-HHMM`.
pub fn parse_timezone(tz: &str) -> Result<FixedOffset, AnalysisError> {
    let tz = tz.trim();
    let invalid = || AnalysisError::invalid("timezone", format!("unsupported timezone '{tz}'"));

    if tz.is_empty() || tz.eq_ignore_ascii_case("utc") || tz == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match tz.as_bytes().first() {
        Some(b'+') => (1, &tz[1..]),
        Some(b'-') => (-1, &tz[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn labels_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.label().parse::<Timeframe>().unwrap(), tf);
        }
        assert_eq!("daily".parse::<Timeframe>().unwrap(), Timeframe::D1);
        assert!("7x".parse::<Timeframe>().is_err());
    }

    #[test]
    fn divisibility() {
        assert!(Timeframe::M15.divides(Timeframe::H1));
        assert!(Timeframe::H4.divides(Timeframe::D1));
        assert!(Timeframe::D1.divides(Timeframe::W1));
        assert!(Timeframe::D1.divides(Timeframe::Mn1));
        assert!(!Timeframe::W1.divides(Timeframe::Mn1));
        assert!(!Timeframe::H1.divides(Timeframe::M15));
        assert!(!Timeframe::H1.divides(Timeframe::H1));
    }

    #[test]
    fn weekly_bucket_starts_on_monday() {
        // 2024-01-04 (Thursday) 12:00 UTC.
        let ts = 1_704_369_600_000;
        let start = Timeframe::W1.bucket_start(ts, utc()).unwrap();
        // 2024-01-01 (Monday) 00:00 UTC.
        assert_eq!(start, 1_704_067_200_000);
    }

    #[test]
    fn monthly_bucket_starts_on_the_first() {
        // 2024-02-20 08:00 UTC.
        let ts = 1_708_416_000_000;
        let start = Timeframe::Mn1.bucket_start(ts, utc()).unwrap();
        // 2024-02-01 00:00 UTC.
        assert_eq!(start, 1_706_745_600_000);
    }

    #[test]
    fn daily_bucket_respects_timezone() {
        // 2024-01-01 20:00 UTC is 2024-01-02 05:00 at +09:00.
        let ts = 1_704_139_200_000;
        let tokyo = parse_timezone("+09:00").unwrap();
        let start = Timeframe::D1.bucket_start(ts, tokyo).unwrap();
        // 2024-01-02 00:00 +09:00 == 2024-01-01 15:00 UTC.
        assert_eq!(start, 1_704_121_200_000);
    }

    #[test]
    fn bucket_start_at_the_edge_of_time() {
        let tokyo = parse_timezone("+09:00").unwrap();
        let new_york = parse_timezone("-05:00").unwrap();
        assert_eq!(Timeframe::D1.bucket_start(i64::MAX, tokyo), None);
        assert_eq!(Timeframe::H1.bucket_start(i64::MIN, new_york), None);
        assert_eq!(Timeframe::W1.bucket_start(i64::MAX - 1, utc()), None);
        assert_eq!(Timeframe::Mn1.bucket_start(i64::MAX, utc()), None);
    }

    #[test]
    fn timezone_parsing() {
        assert_eq!(parse_timezone("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_timezone("-0530").unwrap().local_minus_utc(), -19_800);
        assert!(parse_timezone("Europe/Paris").is_err());
        assert!(parse_timezone("+25:00").is_err());
    }
}

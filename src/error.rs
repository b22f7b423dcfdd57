// =============================================================================
// Analysis Errors
// =============================================================================
//
// Only `MalformedBar` and `InvalidParameter` reject a whole request.
// `InsufficientData` and `TimeframeData` are contained at the smallest unit
// (one indicator, one timeframe) and surface in the report as "unavailable"
// markers instead of propagating.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Input contract violation: ordering, OHLC geometry, sign or finiteness.
    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("insufficient data: required {required} bars, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// A single timeframe could not be produced (missing source data, finer
    /// than anything available, too short after resampling).
    #[error("timeframe {timeframe} unavailable: {reason}")]
    TimeframeData { timeframe: String, reason: String },

    #[error("invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl AnalysisError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedBar {
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn timeframe(timeframe: impl ToString, reason: impl Into<String>) -> Self {
        Self::TimeframeData {
            timeframe: timeframe.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error rejects the entire analysis request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedBar { .. } | Self::InvalidParameter { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_follows_taxonomy() {
        assert!(AnalysisError::malformed(3, "high < low").is_fatal());
        assert!(AnalysisError::invalid("rsi_period", "must be > 0").is_fatal());
        assert!(!AnalysisError::InsufficientData { required: 2, got: 1 }.is_fatal());
        assert!(!AnalysisError::timeframe("1h", "no bars").is_fatal());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = AnalysisError::malformed(7, "timestamp not increasing");
        assert_eq!(
            err.to_string(),
            "malformed bar at index 7: timestamp not increasing"
        );
        let err = AnalysisError::timeframe("4h", "no source bars");
        assert_eq!(err.to_string(), "timeframe 4h unavailable: no source bars");
    }
}

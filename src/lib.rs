//! Multi-timeframe technical analysis over OHLCV bars.
//!
//! Bars go into a [`SeriesStore`] per timeframe; the [`Pipeline`] runs
//! indicators, pattern detection, structure analysis and signal scoring on a
//! single series, and the [`MultiTimeframeCoordinator`] fans a request out
//! across timeframes and folds the results into an [`AnalysisReport`].

pub mod analysis_config;
pub mod api;
pub mod app_state;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod multi_timeframe;
pub mod patterns;
pub mod pipeline;
pub mod regime;
pub mod replay;
pub mod report;
pub mod scanner;
pub mod signals;
pub mod structure;
pub mod types;

pub use analysis_config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use market_data::{Bar, BarSource, InMemorySource, SeriesMeta, SeriesStore, Timeframe};
pub use multi_timeframe::MultiTimeframeCoordinator;
pub use pipeline::{analyze_series, Pipeline, TimeframeAnalysis};
pub use report::{Alignment, AnalysisReport, TimeframeResult};
pub use types::{Direction, Recommendation};

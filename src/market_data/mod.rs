pub mod bar;
pub mod series_store;
pub mod source;
pub mod timeframe;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Bar`).
pub use bar::Bar;
pub use series_store::{SeriesMeta, SeriesStore, DEFAULT_MIN_BARS};
pub use source::{BarSource, InMemorySource};
pub use timeframe::{parse_timezone, Timeframe};

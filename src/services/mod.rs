//! I/O around the engine: upstream client, caching, comparison fetches

pub mod cache;
pub mod comparison;
pub mod upstream;

pub use cache::{CachedSeriesProvider, Clock, ManualClock, SystemClock, TtlCache};
pub use comparison::{fetch_comparison, ComparisonData};
pub use upstream::{SeriesProvider, SeriesQuery, TaggingApiClient};

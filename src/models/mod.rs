//! Shared data models spanning the engine layers.

pub mod chart;
pub mod grouping;
pub mod request;
pub mod series;
pub mod taxonomy;
pub mod time;

pub use chart::{Breakdown, Bucketized, CategorySummary, DeltaResult, DonutSlice, EntityDelta, SeriesLine};
pub use grouping::{GroupedResult, OthersPayload, PartitionMode};
pub use request::{BreakdownRequest, DrilldownRequest};
pub use series::{Entry, KeyInfo, RawPoint, RawSeriesByKey};
pub use taxonomy::{EntityKind, Taxonomy, TaxonomyEntity};
pub use time::{BucketMode, DateRange, Granularity};

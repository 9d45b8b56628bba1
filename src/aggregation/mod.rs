//! Aggregation engine: partitioning, bucketing, deltas and chart shapes.

pub mod buckets;
pub mod charts;
pub mod delta;
pub mod engine;
pub mod partition;

pub use buckets::*;
pub use charts::*;
pub use delta::*;
pub use engine::{BreakdownEngine, EngineSettings};
pub use partition::*;

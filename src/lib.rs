//! Tourlytics: breakdown engine for the tourism interaction dashboard.
//!
//! Turns the flat, dot-path keyed series returned by the tagging backend into
//! grouped, bucketized and comparable aggregates ready for charting.

pub mod aggregation;
pub mod config;
pub mod core;
pub mod error;
pub mod keys;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod services;

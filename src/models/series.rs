//! Raw series as delivered by the tagging backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day format used by the upstream API (`20250919`).
pub const UPSTREAM_DAY_FORMAT: &str = "%Y%m%d";

/// A single daily observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    /// Day in `YYYYMMDD` form.
    pub time: String,
    pub value: f64,
}

impl RawPoint {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }

    /// Parsed day, `None` when the upstream sent something other than `YYYYMMDD`.
    pub fn date(&self) -> Option<NaiveDate> {
        if self.time.len() != 8 {
            return None;
        }
        NaiveDate::parse_from_str(&self.time, UPSTREAM_DAY_FORMAT).ok()
    }
}

/// Dot-path key → ordered points. Ordered map so every traversal is deterministic.
pub type RawSeriesByKey = BTreeMap<String, Vec<RawPoint>>;

/// Parsed form of a raw key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub raw: String,
    pub parts: Vec<String>,
    pub depth: usize,
}

impl KeyInfo {
    /// Segment at `index` (0 is the root marker).
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.parts.get(index).map(String::as_str)
    }
}

/// One key with its full raw series. Moved between groups during partitioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub points: Vec<RawPoint>,
}

impl Entry {
    pub fn new(key: impl Into<String>, points: Vec<RawPoint>) -> Self {
        Self {
            key: key.into(),
            points,
        }
    }

    /// Sum of every point value, regardless of date.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

//! Partition output: groups of entries plus the "Others" overflow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::series::Entry;

/// How the children of a scope decompose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionMode {
    /// Immediate children are geographic units (towns).
    #[serde(rename = "town-first")]
    TownFirst,
    /// Immediate children are free-form subtopics.
    #[serde(rename = "topic-first")]
    TopicFirst,
}

impl PartitionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionMode::TownFirst => "town-first",
            PartitionMode::TopicFirst => "topic-first",
        }
    }
}

impl std::fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entries that could not be resolved to a canonical id.
///
/// Keeps every raw series so the dashboard can drill into "Otros".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OthersPayload {
    pub entries: Vec<Entry>,
    pub total: f64,
    pub distinct_keys: usize,
}

impl OthersPayload {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let total = entries.iter().map(Entry::total).sum();
        let distinct_keys = entries.len();
        Self {
            entries,
            total,
            distinct_keys,
        }
    }

    pub fn push(&mut self, entry: Entry) {
        self.total += entry.total();
        self.entries.push(entry);
        self.distinct_keys = self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of partitioning one scope.
///
/// Every in-scope entry lands in exactly one group or in `others`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedResult {
    pub mode: PartitionMode,
    pub groups: BTreeMap<String, Vec<Entry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others: Option<OthersPayload>,
}

impl GroupedResult {
    pub fn new(mode: PartitionMode) -> Self {
        Self {
            mode,
            groups: BTreeMap::new(),
            others: None,
        }
    }

    /// Total per group (sum over all entries, every date).
    pub fn group_totals(&self) -> BTreeMap<String, f64> {
        self.groups
            .iter()
            .map(|(id, entries)| (id.clone(), entries.iter().map(Entry::total).sum()))
            .collect()
    }

    /// Groups plus Others.
    pub fn grand_total(&self) -> f64 {
        let groups: f64 = self.group_totals().values().sum();
        groups + self.others.as_ref().map(|o| o.total).unwrap_or(0.0)
    }

    pub fn entry_count(&self) -> usize {
        let grouped: usize = self.groups.values().map(Vec::len).sum();
        grouped + self.others.as_ref().map(|o| o.entries.len()).unwrap_or(0)
    }
}

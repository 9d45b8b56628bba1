//! Chart-ready shapes handed to the dashboard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::grouping::{OthersPayload, PartitionMode};
use super::time::Granularity;

/// Per-group series aligned to a common time axis.
///
/// For every group, `current_by_group`, `previous_by_group` and `x_labels`
/// have the same length and `totals_by_group` is the sum of the current series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucketized {
    pub x_labels: Vec<String>,
    pub current_by_group: BTreeMap<String, Vec<f64>>,
    pub previous_by_group: BTreeMap<String, Vec<f64>>,
    pub totals_by_group: BTreeMap<String, f64>,
    pub labels_by_group: BTreeMap<String, String>,
}

impl Bucketized {
    pub fn group_ids(&self) -> impl Iterator<Item = &String> {
        self.current_by_group.keys()
    }

    /// Total of the previous-period series of a group.
    pub fn previous_total(&self, group: &str) -> f64 {
        self.previous_by_group
            .get(group)
            .map(|values| values.iter().sum())
            .unwrap_or(0.0)
    }

    pub fn label(&self, group: &str) -> String {
        self.labels_by_group
            .get(group)
            .cloned()
            .unwrap_or_else(|| group.to_string())
    }
}

/// Absolute and relative change between two totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaResult {
    pub delta_abs: f64,
    /// `None` when the previous total is not positive.
    pub delta_percent: Option<f64>,
}

/// Comparison record for one taxonomy entity or group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDelta {
    pub id: String,
    pub label: String,
    pub current_total: f64,
    pub prev_total: f64,
    pub delta_abs: f64,
    pub delta_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonutSlice {
    pub id: String,
    pub label: String,
    pub value: f64,
}

/// One line/bar series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesLine {
    pub id: String,
    pub label: String,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SeriesLine {
    pub fn new(id: impl Into<String>, label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            values,
            color: None,
        }
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Full engine output for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub scope: String,
    pub mode: PartitionMode,
    pub granularity: Granularity,
    pub bucketized: Bucketized,
    pub deltas: Vec<EntityDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others: Option<OthersPayload>,
    /// Others bucketized on the same axis, for the "Otros" drilldown chart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others_series: Option<Vec<f64>>,
    pub donut: Vec<DonutSlice>,
    pub top_series: Vec<SeriesLine>,
}

/// Totals per category across the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub entities: Vec<EntityDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others: Option<OthersPayload>,
}

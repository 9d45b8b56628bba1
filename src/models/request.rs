//! Query descriptions accepted by the engine and the REST surface.

use serde::{Deserialize, Serialize};

use super::grouping::PartitionMode;
use super::taxonomy::EntityKind;
use super::time::{DateRange, Granularity};

/// One scope breakdown over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    /// Canonical id (or any alias) of the scope entity.
    pub scope: String,
    /// Table the scope belongs to.
    #[serde(default = "default_kind")]
    pub kind: EntityKind,
    #[serde(flatten)]
    pub range: DateRange,
    pub granularity: Granularity,
    /// Number of individual series kept before folding into "Otros".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Forces the partition mode instead of detecting it from the data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PartitionMode>,
}

fn default_kind() -> EntityKind {
    EntityKind::Category
}

impl BreakdownRequest {
    pub fn new(scope: &str, kind: EntityKind, range: DateRange, granularity: Granularity) -> Self {
        Self {
            scope: scope.to_string(),
            kind,
            range,
            granularity,
            top_k: None,
            mode: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_mode(mut self, mode: PartitionMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Second-level breakdown: the children of `child` inside `scope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrilldownRequest {
    #[serde(flatten)]
    pub breakdown: BreakdownRequest,
    pub child: String,
}

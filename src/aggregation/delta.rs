//! Totals and period-over-period deltas

use std::collections::BTreeMap;

use crate::models::chart::{DeltaResult, EntityDelta};
use crate::models::series::{Entry, RawPoint};

/// Percentage change, `None` when the baseline is zero or negative.
pub fn compute_delta_percent(current: f64, prev: f64) -> Option<f64> {
    if prev <= 0.0 {
        return None;
    }
    Some(((current - prev) / prev) * 100.0)
}

/// Absolute change is always defined, percentage follows `compute_delta_percent`.
pub fn compute_delta(current: f64, prev: f64) -> DeltaResult {
    DeltaResult {
        delta_abs: current - prev,
        delta_percent: compute_delta_percent(current, prev),
    }
}

pub fn sum_points(points: &[RawPoint]) -> f64 {
    points.iter().map(|p| p.value).sum()
}

pub fn sum_entries(entries: &[Entry]) -> f64 {
    entries.iter().map(Entry::total).sum()
}

/// One delta record per `(id, label)` of the universe, in universe order.
///
/// Ids missing from the totals count as zero, so every entity is reported.
pub fn entity_deltas(
    universe: &[(String, String)],
    current_totals: &BTreeMap<String, f64>,
    prev_totals: &BTreeMap<String, f64>,
) -> Vec<EntityDelta> {
    universe
        .iter()
        .map(|(id, label)| {
            let current_total = current_totals.get(id).copied().unwrap_or(0.0);
            let prev_total = prev_totals.get(id).copied().unwrap_or(0.0);
            let delta = compute_delta(current_total, prev_total);
            EntityDelta {
                id: id.clone(),
                label: label.clone(),
                current_total,
                prev_total,
                delta_abs: delta.delta_abs,
                delta_percent: delta.delta_percent,
            }
        })
        .collect()
}

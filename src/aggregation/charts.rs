//! Chart-shape adapters: top-N selection, donut slices and top-K series.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::chart::{Bucketized, DonutSlice, SeriesLine};

/// Id and label of the overflow group / synthetic series.
pub const OTHERS_ID: &str = "otros";
pub const OTHERS_LABEL: &str = "Otros";
/// Neutral grey used for the synthetic "Otros" series.
pub const OTHERS_COLOR: &str = "#9CA3AF";
/// Series kept individually before folding into "Otros".
pub const DEFAULT_TOP_K: usize = 6;

/// Total descending, then id ascending.
fn by_total_desc(a: (&str, f64), b: (&str, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Ids of the `n` largest groups.
pub fn get_top_groups(totals: &BTreeMap<String, f64>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = totals.iter().map(|(id, v)| (id, *v)).collect();
    ranked.sort_by(|a, b| by_total_desc((a.0.as_str(), a.1), (b.0.as_str(), b.1)));
    ranked.into_iter().take(n).map(|(id, _)| id.clone()).collect()
}

/// Every group as a slice, plus "Otros" when the overflow holds entries.
///
/// `others_series` is the overflow bucketized on the same axis, so every
/// slice counts only in-range points. Unlike the line series this is never
/// truncated, so the legend totals reconcile with the "Otros" drilldown.
pub fn prepare_donut_data(bucketized: &Bucketized, others_series: Option<&[f64]>) -> Vec<DonutSlice> {
    let mut slices: Vec<DonutSlice> = bucketized
        .totals_by_group
        .iter()
        .map(|(id, value)| DonutSlice {
            id: id.clone(),
            label: bucketized.label(id),
            value: *value,
        })
        .collect();
    slices.sort_by(|a, b| by_total_desc((a.id.as_str(), a.value), (b.id.as_str(), b.value)));

    if let Some(values) = others_series {
        slices.push(DonutSlice {
            id: OTHERS_ID.to_string(),
            label: OTHERS_LABEL.to_string(),
            value: values.iter().sum(),
        });
    }
    slices
}

/// Current-period series of every group, in group id order.
pub fn lines_from_bucketized(bucketized: &Bucketized) -> Vec<SeriesLine> {
    bucketized
        .current_by_group
        .iter()
        .map(|(id, values)| SeriesLine::new(id.clone(), bucketized.label(id), values.clone()))
        .collect()
}

/// Keeps the `k` largest series and sums the rest bucket by bucket into a
/// synthetic "Otros" series.
///
/// A line already named `otros` (the unresolved overflow) always folds into
/// the synthetic series. Per bucket the output sums to the input.
pub fn top_k_series(lines: Vec<SeriesLine>, k: usize) -> Vec<SeriesLine> {
    let (overflow, mut ranked): (Vec<SeriesLine>, Vec<SeriesLine>) =
        lines.into_iter().partition(|line| line.id == OTHERS_ID);
    ranked.sort_by(|a, b| by_total_desc((a.id.as_str(), a.total()), (b.id.as_str(), b.total())));

    let rest: Vec<SeriesLine> = if ranked.len() > k {
        ranked.split_off(k)
    } else {
        Vec::new()
    };
    let folded: Vec<&SeriesLine> = rest.iter().chain(overflow.iter()).collect();
    if folded.is_empty() {
        return ranked;
    }

    let width = folded.iter().map(|l| l.values.len()).max().unwrap_or(0);
    let mut values = vec![0.0; width];
    for line in &folded {
        for (i, v) in line.values.iter().enumerate() {
            values[i] += v;
        }
    }

    let mut others = SeriesLine::new(OTHERS_ID, OTHERS_LABEL, values);
    others.color = Some(OTHERS_COLOR.to_string());
    ranked.push(others);
    ranked
}

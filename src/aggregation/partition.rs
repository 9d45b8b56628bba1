//! Scope partitioning: town-first vs topic-first grouping with "Others" overflow.

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::keys::parser::{parse_key, LEVEL1_DEPTH, LEVEL2_DEPTH, SCOPE_DEPTH};
use crate::matching::normalize::{normalize_label, normalize_token};
use crate::matching::synonyms::SynonymIndex;
use crate::models::grouping::{GroupedResult, OthersPayload, PartitionMode};
use crate::models::series::{Entry, KeyInfo, RawSeriesByKey};

/// Lookup tables a partition needs.
#[derive(Debug, Clone, Copy)]
pub struct PartitionContext<'a> {
    pub root: &'a str,
    /// Index of the table the scope belongs to (categories or towns).
    pub scope_index: &'a SynonymIndex,
    /// Geographic entities used to decide town-first mode.
    pub town_index: &'a SynonymIndex,
}

fn segment_is(segment: &str, id: &str, index: &SynonymIndex) -> bool {
    index.resolve(segment) == Some(id) || normalize_token(segment) == normalize_token(id)
}

/// Whether segment 1 of the key names the scope.
fn in_scope(info: &KeyInfo, scope: &str, ctx: &PartitionContext<'_>) -> bool {
    info.segment(1)
        .map(|segment| segment_is(segment, scope, ctx.scope_index))
        .unwrap_or(false)
}

/// In-scope keys of the dataset, parsed.
fn scoped_keys<'d>(
    scope: &'d str,
    data: &'d RawSeriesByKey,
    ctx: &'d PartitionContext<'d>,
) -> impl Iterator<Item = KeyInfo> + 'd {
    data.keys().filter_map(move |raw| {
        let Some(info) = parse_key(raw, ctx.root) else {
            trace!(key = %raw, "Skipping malformed key");
            return None;
        };
        in_scope(&info, scope, ctx).then_some(info)
    })
}

/// Town-first as soon as one child of the scope resolves to a town.
pub fn detect_partition_mode(
    scope: &str,
    data: &RawSeriesByKey,
    ctx: &PartitionContext<'_>,
) -> PartitionMode {
    let any_town = scoped_keys(scope, data, ctx)
        .filter(|info| info.depth >= LEVEL1_DEPTH)
        .any(|info| {
            info.segment(2)
                .and_then(|child| ctx.town_index.resolve(child))
                .is_some()
        });

    if any_town {
        PartitionMode::TownFirst
    } else {
        PartitionMode::TopicFirst
    }
}

/// Detects the mode and groups the scope's first-level keys.
pub fn partition(scope: &str, data: &RawSeriesByKey, ctx: &PartitionContext<'_>) -> GroupedResult {
    let mode = detect_partition_mode(scope, data, ctx);
    partition_with_mode(scope, data, ctx, mode)
}

/// Where a level-1 key lands: a named group, or Others under its raw child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Group(String),
    Unresolved(String),
}

fn level1_slot(info: &KeyInfo, ctx: &PartitionContext<'_>, mode: PartitionMode) -> Slot {
    let child = info.segment(2).unwrap_or_default();
    let group = match mode {
        PartitionMode::TopicFirst => Some(normalize_label(child)).filter(|label| !label.is_empty()),
        PartitionMode::TownFirst => ctx.town_index.resolve(child).map(str::to_string),
    };
    match group {
        Some(id) => Slot::Group(id),
        None => Slot::Unresolved(normalize_token(child)),
    }
}

/// Groups the scope's first-level keys under a given mode.
///
/// - depth 2 (`root.<scope>`): whole series goes to Others
/// - depth 3 and deeper: grouped by the segment after the scope, as a topic
///   or as a resolved town (unresolved → Others)
///
/// Only the shallowest keys of each group count. Subcategory keys under a
/// child that also has its own `root.<scope>.<child>` key are ignored, so
/// detail never adds to the level-1 totals twice.
pub fn partition_with_mode(
    scope: &str,
    data: &RawSeriesByKey,
    ctx: &PartitionContext<'_>,
    mode: PartitionMode,
) -> GroupedResult {
    let mut result = GroupedResult::new(mode);
    let mut others = OthersPayload::default();

    let level1: Vec<(KeyInfo, Slot)> = scoped_keys(scope, data, ctx)
        .filter(|info| info.depth >= LEVEL1_DEPTH)
        .map(|info| {
            let slot = level1_slot(&info, ctx, mode);
            (info, slot)
        })
        .collect();
    let mut shallowest: HashMap<&Slot, usize> = HashMap::new();
    for (info, slot) in &level1 {
        shallowest
            .entry(slot)
            .and_modify(|depth| *depth = (*depth).min(info.depth))
            .or_insert(info.depth);
    }

    for info in scoped_keys(scope, data, ctx).filter(|info| info.depth == SCOPE_DEPTH) {
        let points = data.get(&info.raw).cloned().unwrap_or_default();
        others.push(Entry::new(info.raw.clone(), points));
    }

    for (info, slot) in &level1 {
        if shallowest.get(slot).is_some_and(|depth| info.depth > *depth) {
            trace!(key = %info.raw, "Ignoring subcategory detail of a level-1 key");
            continue;
        }
        let points = data.get(&info.raw).cloned().unwrap_or_default();
        let entry = Entry::new(info.raw.clone(), points);
        match slot {
            Slot::Group(id) => result.groups.entry(id.clone()).or_default().push(entry),
            Slot::Unresolved(_) => {
                trace!(key = %info.raw, "Unresolved child routed to Others");
                others.push(entry);
            }
        }
    }

    if !others.is_empty() {
        result.others = Some(others);
    }

    debug!(
        scope = %scope,
        mode = %mode,
        groups = result.groups.len(),
        others = result.others.as_ref().map(|o| o.distinct_keys).unwrap_or(0),
        "Partitioned scope"
    );
    result
}

/// Second-level breakdown of `child` inside `scope`, grouped by subtopic.
///
/// The exact `root.<scope>.<child>` key carries no further breakdown and goes
/// to Others.
pub fn partition_subtopics(
    scope: &str,
    child: &str,
    data: &RawSeriesByKey,
    ctx: &PartitionContext<'_>,
) -> GroupedResult {
    let mut result = GroupedResult::new(PartitionMode::TopicFirst);
    let mut others = OthersPayload::default();

    let under_child = |info: &KeyInfo| {
        info.segment(2)
            .map(|segment| segment_is(segment, child, ctx.town_index))
            .unwrap_or(false)
    };

    for info in scoped_keys(scope, data, ctx).filter(|info| under_child(info)) {
        let points = data.get(&info.raw).cloned().unwrap_or_default();
        let entry = Entry::new(info.raw.clone(), points);

        match info.depth {
            LEVEL1_DEPTH => others.push(entry),
            LEVEL2_DEPTH => {
                let topic = normalize_label(info.segment(3).unwrap_or_default());
                if topic.is_empty() {
                    others.push(entry);
                } else {
                    result.groups.entry(topic).or_default().push(entry);
                }
            }
            _ => {}
        }
    }

    if !others.is_empty() {
        result.others = Some(others);
    }

    debug!(
        scope = %scope,
        child = %child,
        groups = result.groups.len(),
        "Partitioned subtopics"
    );
    result
}

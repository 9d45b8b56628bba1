//! Breakdown engine: raw current/previous datasets → chart-ready breakdown.
//!
//! Pure and synchronous. The service layer fetches both periods and only
//! calls in here once it holds the complete pair.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::buckets::{bucketize, bucketize_groups, derive_previous_range, range_total};
use super::charts::{lines_from_bucketized, prepare_donut_data, top_k_series, DEFAULT_TOP_K, OTHERS_ID, OTHERS_LABEL};
use super::delta::{entity_deltas, sum_points};
use super::partition::{detect_partition_mode, partition_subtopics, partition_with_mode, PartitionContext};
use crate::keys::parser::{parse_key, DEFAULT_ROOT, SCOPE_DEPTH};
use crate::matching::fuzzy::resolve_segments;
use crate::matching::synonyms::SynonymIndex;
use crate::models::chart::{Breakdown, CategorySummary, SeriesLine};
use crate::models::grouping::{GroupedResult, OthersPayload, PartitionMode};
use crate::models::request::BreakdownRequest;
use crate::models::series::{Entry, RawSeriesByKey};
use crate::models::taxonomy::{EntityKind, Taxonomy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub root: String,
    pub top_k: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Taxonomy-bound engine. Indices are built once and reused per request.
#[derive(Debug, Clone)]
pub struct BreakdownEngine {
    taxonomy: Taxonomy,
    towns: SynonymIndex,
    categories: SynonymIndex,
    settings: EngineSettings,
}

/// "ocio nocturno" → "Ocio nocturno".
fn display_label(group: &str) -> String {
    let mut chars = group.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl BreakdownEngine {
    pub fn new(taxonomy: Taxonomy, settings: EngineSettings) -> Self {
        let towns = SynonymIndex::from_entities(&taxonomy.towns);
        let categories = SynonymIndex::from_entities(&taxonomy.categories);
        Self {
            taxonomy,
            towns,
            categories,
            settings,
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn index(&self, kind: EntityKind) -> &SynonymIndex {
        match kind {
            EntityKind::Town => &self.towns,
            EntityKind::Category => &self.categories,
        }
    }

    /// Canonical id for a scope alias, or the trimmed input when unknown.
    pub fn resolve_scope(&self, kind: EntityKind, raw: &str) -> String {
        self.index(kind)
            .resolve(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.trim().to_string())
    }

    /// Human label for a canonical id, falling back to the id.
    pub fn label_for(&self, kind: EntityKind, id: &str) -> String {
        self.taxonomy
            .label(kind, id)
            .map(str::to_string)
            .unwrap_or_else(|| display_label(id))
    }

    fn context(&self, kind: EntityKind) -> PartitionContext<'_> {
        PartitionContext {
            root: &self.settings.root,
            scope_index: self.index(kind),
            town_index: &self.towns,
        }
    }

    /// First-level breakdown of one scope.
    ///
    /// Both periods are partitioned under the same mode so their groups line
    /// up: the requested one, otherwise town-first as soon as either period
    /// has a town child.
    pub fn breakdown(
        &self,
        request: &BreakdownRequest,
        current: &RawSeriesByKey,
        previous: &RawSeriesByKey,
    ) -> Breakdown {
        let scope = self.resolve_scope(request.kind, &request.scope);
        let ctx = self.context(request.kind);

        let mode = request.mode.unwrap_or_else(|| {
            match (
                detect_partition_mode(&scope, current, &ctx),
                detect_partition_mode(&scope, previous, &ctx),
            ) {
                (PartitionMode::TopicFirst, PartitionMode::TopicFirst) => PartitionMode::TopicFirst,
                _ => PartitionMode::TownFirst,
            }
        });

        let current_groups = partition_with_mode(&scope, current, &ctx, mode);
        let previous_groups = partition_with_mode(&scope, previous, &ctx, mode);

        let universe = match mode {
            PartitionMode::TownFirst => self
                .taxonomy
                .towns
                .iter()
                .map(|town| (town.id.clone(), town.label.clone()))
                .collect(),
            PartitionMode::TopicFirst => topic_universe(&current_groups, &previous_groups),
        };

        self.assemble(request, scope, mode, current_groups, previous_groups, universe)
    }

    /// Second-level breakdown: subtopics of `child` inside the scope.
    pub fn drilldown(
        &self,
        request: &BreakdownRequest,
        child: &str,
        current: &RawSeriesByKey,
        previous: &RawSeriesByKey,
    ) -> Breakdown {
        let scope = self.resolve_scope(request.kind, &request.scope);
        let child = self.resolve_scope(EntityKind::Town, child);
        let ctx = self.context(request.kind);

        let current_groups = partition_subtopics(&scope, &child, current, &ctx);
        let previous_groups = partition_subtopics(&scope, &child, previous, &ctx);
        let universe = topic_universe(&current_groups, &previous_groups);

        let scope = format!("{}.{}", scope, child);
        self.assemble(
            request,
            scope,
            PartitionMode::TopicFirst,
            current_groups,
            previous_groups,
            universe,
        )
    }

    fn assemble(
        &self,
        request: &BreakdownRequest,
        scope: String,
        mode: PartitionMode,
        current: GroupedResult,
        previous: GroupedResult,
        universe: Vec<(String, String)>,
    ) -> Breakdown {
        let range = request.range;
        let granularity = request.granularity;
        let previous_range = derive_previous_range(&range);

        let bucketized = bucketize_groups(&current, &previous, &range, granularity, &universe);

        let previous_totals: BTreeMap<String, f64> = universe
            .iter()
            .map(|(id, _)| {
                let entries = previous.groups.get(id).map(Vec::as_slice).unwrap_or(&[]);
                (id.clone(), range_total(entries, &previous_range))
            })
            .collect();
        let deltas = entity_deltas(&universe, &bucketized.totals_by_group, &previous_totals);

        let others_series = current
            .others
            .as_ref()
            .map(|others| bucketize(&others.entries, &range, granularity, &bucketized.x_labels));

        let donut = prepare_donut_data(&bucketized, others_series.as_deref());

        let mut lines = lines_from_bucketized(&bucketized);
        if let Some(values) = &others_series {
            lines.push(SeriesLine::new(OTHERS_ID, OTHERS_LABEL, values.clone()));
        }
        let top_series = top_k_series(lines, request.top_k.unwrap_or(self.settings.top_k));

        debug!(
            scope = %scope,
            mode = %mode,
            granularity = granularity.as_str(),
            buckets = bucketized.x_labels.len(),
            groups = universe.len(),
            "Breakdown computed"
        );

        Breakdown {
            scope,
            mode,
            granularity,
            bucketized,
            deltas,
            others: current.others,
            others_series,
            donut,
            top_series,
        }
    }

    /// Totals per category for keys of exactly `depth`.
    ///
    /// Segment 1 is tried first, then segment 2 (town-scoped keys such as
    /// `root.<town>.<category>`), exact lookups before fuzzy ones. Every
    /// category is reported, unmatched keys go to Others.
    pub fn summarize_categories(
        &self,
        current: &RawSeriesByKey,
        previous: &RawSeriesByKey,
        depth: usize,
    ) -> CategorySummary {
        let (current_totals, current_others) = self.fold_categories(current, depth);
        let (previous_totals, _) = self.fold_categories(previous, depth);

        let universe: Vec<(String, String)> = self
            .taxonomy
            .categories
            .iter()
            .map(|c| (c.id.clone(), c.label.clone()))
            .collect();

        CategorySummary {
            entities: entity_deltas(&universe, &current_totals, &previous_totals),
            others: (!current_others.is_empty()).then_some(current_others),
        }
    }

    fn fold_categories(&self, data: &RawSeriesByKey, depth: usize) -> (BTreeMap<String, f64>, OthersPayload) {
        let mut totals: BTreeMap<String, f64> = self
            .categories
            .ids()
            .iter()
            .map(|id| (id.clone(), 0.0))
            .collect();
        let mut others = OthersPayload::default();

        for (raw, points) in data {
            let Some(info) = parse_key(raw, &self.settings.root) else {
                continue;
            };
            if info.depth != depth || info.depth < SCOPE_DEPTH {
                continue;
            }
            let segments: Vec<&str> = info.parts[1..info.depth.min(3)]
                .iter()
                .map(String::as_str)
                .collect();

            match resolve_segments(&self.categories, &segments) {
                Some(id) => *totals.entry(id.to_string()).or_insert(0.0) += sum_points(points),
                None => others.push(Entry::new(raw.clone(), points.clone())),
            }
        }
        (totals, others)
    }
}

impl Default for BreakdownEngine {
    fn default() -> Self {
        Self::new(Taxonomy::default(), EngineSettings::default())
    }
}

/// Topic groups seen in either period, in id order.
fn topic_universe(current: &GroupedResult, previous: &GroupedResult) -> Vec<(String, String)> {
    let ids: BTreeSet<&String> = current.groups.keys().chain(previous.groups.keys()).collect();
    ids.into_iter()
        .map(|id| (id.clone(), display_label(id)))
        .collect()
}

//! Unit tests for scope partitioning

use tourlytics::aggregation::partition::{
    detect_partition_mode, partition, partition_with_mode, PartitionContext,
};
use tourlytics::keys::parser::parse_key;
use tourlytics::matching::synonyms::SynonymIndex;
use tourlytics::models::grouping::PartitionMode;
use tourlytics::models::series::{RawPoint, RawSeriesByKey};
use tourlytics::models::taxonomy::Taxonomy;

struct Indices {
    towns: SynonymIndex,
    categories: SynonymIndex,
}

impl Indices {
    fn huelva() -> Self {
        let taxonomy = Taxonomy::huelva();
        Self {
            towns: SynonymIndex::from_entities(&taxonomy.towns),
            categories: SynonymIndex::from_entities(&taxonomy.categories),
        }
    }

    fn ctx(&self) -> PartitionContext<'_> {
        PartitionContext {
            root: "root",
            scope_index: &self.categories,
            town_index: &self.towns,
        }
    }
}

fn series(pairs: &[(&str, &[f64])]) -> RawSeriesByKey {
    pairs
        .iter()
        .map(|(key, values)| {
            let points = values
                .iter()
                .enumerate()
                .map(|(i, v)| RawPoint::new(format!("202509{:02}", 10 + i), *v))
                .collect();
            (key.to_string(), points)
        })
        .collect()
}

fn in_scope_sum(data: &RawSeriesByKey, scope_segment: &str) -> f64 {
    data.iter()
        .filter(|(key, _)| {
            parse_key(key, "root")
                .map(|info| info.segment(1) == Some(scope_segment))
                .unwrap_or(false)
        })
        .flat_map(|(_, points)| points.iter().map(|p| p.value))
        .sum()
}

fn mixed_dataset() -> RawSeriesByKey {
    series(&[
        ("root.playas", &[7.0, 1.0]),
        ("root.playas.almonte", &[2.0, 13.0]),
        ("root.playas.matalascañas", &[4.0]),
        ("root.playas.lepe.chiringuitos", &[3.0, 3.0, 3.0]),
        ("root.playas.xyzplace", &[5.0]),
        ("root.playas.nowhere.chiringuitos", &[0.5]),
        ("root.naturaleza.aracena", &[100.0]),
        ("other.playas.lepe", &[1000.0]),
    ])
}

#[test]
fn test_conservation_town_first() {
    let indices = Indices::huelva();
    let data = mixed_dataset();
    let result = partition("playas", &data, &indices.ctx());

    assert_eq!(result.mode, PartitionMode::TownFirst);
    assert_eq!(result.grand_total(), in_scope_sum(&data, "playas"));
    assert_eq!(result.entry_count(), 6);
}

#[test]
fn test_conservation_topic_first() {
    let indices = Indices::huelva();
    let data = series(&[
        ("root.gastronomia", &[1.0]),
        ("root.gastronomia.tapas", &[2.0, 2.0]),
        ("root.gastronomia.quesos.curados", &[3.0]),
        ("root.gastronomia.Vinos", &[4.0]),
    ]);
    let result = partition("gastronomia", &data, &indices.ctx());

    assert_eq!(result.mode, PartitionMode::TopicFirst);
    assert_eq!(result.grand_total(), in_scope_sum(&data, "gastronomia"));
    assert_eq!(result.group_totals()["vinos"], 4.0);
    assert_eq!(result.group_totals()["quesos"], 3.0);
    assert_eq!(result.others.as_ref().map(|o| o.total), Some(1.0));
}

#[test]
fn test_level1_key_shadows_its_subcategories() {
    let indices = Indices::huelva();
    let data = series(&[
        ("root.gastronomia.Vinos", &[4.0]),
        ("root.gastronomia.vinos.finos", &[3.0]),
        ("root.playas.almonte", &[10.0]),
        ("root.playas.almonte.chiringuitos", &[4.0]),
        ("root.playas.xyzplace", &[1.0]),
        ("root.playas.xyzplace.chiringuitos", &[2.0]),
    ]);

    let topics = partition("gastronomia", &data, &indices.ctx());
    assert_eq!(topics.group_totals()["vinos"], 4.0);
    assert_eq!(topics.grand_total(), in_scope_sum(&data, "gastronomia") - 3.0);

    let towns = partition("playas", &data, &indices.ctx());
    assert_eq!(towns.group_totals()["almonte"], 10.0);
    let others = towns.others.as_ref().unwrap();
    assert_eq!(others.distinct_keys, 1);
    assert_eq!(others.total, 1.0);
}

#[test]
fn test_every_entry_lands_exactly_once() {
    let indices = Indices::huelva();
    let data = mixed_dataset();
    let result = partition("playas", &data, &indices.ctx());

    let mut keys: Vec<&str> = result
        .groups
        .values()
        .flatten()
        .chain(result.others.iter().flat_map(|o| o.entries.iter()))
        .map(|e| e.key.as_str())
        .collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[test]
fn test_mode_is_deterministic() {
    let indices = Indices::huelva();
    let data = mixed_dataset();
    let modes: Vec<PartitionMode> = (0..5)
        .map(|_| detect_partition_mode("playas", &data, &indices.ctx()))
        .collect();
    assert!(modes.iter().all(|m| *m == PartitionMode::TownFirst));

    let first = partition("playas", &data, &indices.ctx());
    let second = partition("playas", &data, &indices.ctx());
    assert_eq!(first, second);
}

#[test]
fn test_single_town_switches_mode() {
    let indices = Indices::huelva();
    let topics = series(&[("root.playas.xyzplace", &[1.0])]);
    assert_eq!(
        detect_partition_mode("playas", &topics, &indices.ctx()),
        PartitionMode::TopicFirst
    );

    let with_town = series(&[("root.playas.xyzplace", &[1.0]), ("root.playas.nerva", &[1.0])]);
    assert_eq!(
        detect_partition_mode("playas", &with_town, &indices.ctx()),
        PartitionMode::TownFirst
    );
}

#[test]
fn test_unresolved_child_under_forced_town_first() {
    let indices = Indices::huelva();
    let data = series(&[("root.playas.xyzplace.chiringuitos", &[2.0, 13.0])]);
    let result = partition_with_mode("playas", &data, &indices.ctx(), PartitionMode::TownFirst);

    assert!(result.groups.is_empty());
    let others = result.others.unwrap();
    assert_eq!(others.total, 15.0);
    assert_eq!(others.distinct_keys, 1);
    assert_eq!(others.entries[0].points.len(), 2);
}

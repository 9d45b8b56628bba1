//! Unit tests for the breakdown engine (raw pair → chart-ready breakdown)

use tourlytics::aggregation::charts::{OTHERS_ID, OTHERS_LABEL};
use tourlytics::aggregation::delta::compute_delta_percent;
use tourlytics::aggregation::engine::{BreakdownEngine, EngineSettings};
use tourlytics::models::grouping::PartitionMode;
use tourlytics::models::request::BreakdownRequest;
use tourlytics::models::series::{RawPoint, RawSeriesByKey};
use tourlytics::models::taxonomy::{EntityKind, Taxonomy};
use tourlytics::models::time::{DateRange, Granularity};

fn series(pairs: &[(&str, &[(&str, f64)])]) -> RawSeriesByKey {
    pairs
        .iter()
        .map(|(key, points)| {
            (
                key.to_string(),
                points.iter().map(|(t, v)| RawPoint::new(*t, *v)).collect(),
            )
        })
        .collect()
}

fn playas_request() -> BreakdownRequest {
    BreakdownRequest::new(
        "playas",
        EntityKind::Category,
        DateRange::parse("2025-09-19", "2025-09-20").unwrap(),
        Granularity::Day,
    )
}

#[test]
fn test_delta_examples() {
    assert_eq!(compute_delta_percent(60.0, 40.0), Some(50.0));
    assert_eq!(compute_delta_percent(50.0, 0.0), None);
    assert_eq!(compute_delta_percent(0.0, 0.0), None);
}

#[test]
fn test_resolved_town_scenario() {
    let engine = BreakdownEngine::default();
    let current = series(&[(
        "root.playas.almonte.chiringuitos",
        &[("20250919", 2.0), ("20250920", 13.0)],
    )]);

    let breakdown = engine.breakdown(&playas_request(), &current, &RawSeriesByKey::new());

    assert_eq!(breakdown.mode, PartitionMode::TownFirst);
    assert_eq!(breakdown.bucketized.x_labels, vec!["2025-09-19", "2025-09-20"]);
    assert_eq!(breakdown.bucketized.current_by_group["almonte"], vec![2.0, 13.0]);
    assert_eq!(breakdown.bucketized.totals_by_group["almonte"], 15.0);
    assert!(breakdown.others.is_none());
    assert!(breakdown.others_series.is_none());
}

#[test]
fn test_unresolved_town_scenario() {
    let engine = BreakdownEngine::default();
    let current = series(&[(
        "root.playas.xyzplace.chiringuitos",
        &[("20250919", 2.0), ("20250920", 13.0)],
    )]);
    let request = playas_request().with_mode(PartitionMode::TownFirst);

    let breakdown = engine.breakdown(&request, &current, &RawSeriesByKey::new());

    assert!(breakdown.bucketized.totals_by_group.values().all(|v| *v == 0.0));
    let others = breakdown.others.as_ref().unwrap();
    assert_eq!(others.total, 15.0);
    assert_eq!(others.distinct_keys, 1);
    assert_eq!(breakdown.others_series, Some(vec![2.0, 13.0]));

    let last_slice = breakdown.donut.last().unwrap();
    assert_eq!(last_slice.id, OTHERS_ID);
    assert_eq!(last_slice.label, OTHERS_LABEL);
    assert_eq!(last_slice.value, 15.0);

    let otros = breakdown.top_series.last().unwrap();
    assert_eq!(otros.id, OTHERS_ID);
    assert_eq!(otros.values, vec![2.0, 13.0]);
}

#[test]
fn test_unresolved_child_detected_as_topic() {
    let engine = BreakdownEngine::default();
    let current = series(&[("root.playas.xyzplace.chiringuitos", &[("20250919", 15.0)])]);

    let breakdown = engine.breakdown(&playas_request(), &current, &RawSeriesByKey::new());
    assert_eq!(breakdown.mode, PartitionMode::TopicFirst);
    assert!(breakdown.others.is_none());
    assert_eq!(breakdown.bucketized.totals_by_group["xyzplace"], 15.0);
}

#[test]
fn test_every_town_is_reported() {
    let engine = BreakdownEngine::default();
    let current = series(&[("root.playas.lepe", &[("20250919", 3.0)])]);
    let previous = series(&[("root.playas.lepe", &[("20250917", 2.0)])]);

    let breakdown = engine.breakdown(&playas_request(), &current, &previous);

    assert_eq!(breakdown.deltas.len(), Taxonomy::huelva().towns.len());
    let lepe = breakdown.deltas.iter().find(|d| d.id == "lepe").unwrap();
    assert_eq!(lepe.current_total, 3.0);
    assert_eq!(lepe.prev_total, 2.0);
    assert_eq!(lepe.delta_percent, Some(50.0));

    let nerva = breakdown.deltas.iter().find(|d| d.id == "nerva").unwrap();
    assert_eq!(nerva.label, "Nerva");
    assert_eq!((nerva.current_total, nerva.prev_total, nerva.delta_abs), (0.0, 0.0, 0.0));
    assert!(nerva.delta_percent.is_none());

    assert_eq!(breakdown.bucketized.previous_by_group["lepe"], vec![2.0, 0.0]);
    assert_eq!(breakdown.donut.len(), Taxonomy::huelva().towns.len());
}

#[test]
fn test_mode_follows_previous_period() {
    let engine = BreakdownEngine::default();
    let current = series(&[("root.playas.xyzplace", &[("20250919", 1.0)])]);
    let previous = series(&[("root.playas.moguer", &[("20250918", 1.0)])]);

    let breakdown = engine.breakdown(&playas_request(), &current, &previous);
    assert_eq!(breakdown.mode, PartitionMode::TownFirst);
    assert_eq!(breakdown.others.as_ref().map(|o| o.total), Some(1.0));
}

#[test]
fn test_drilldown_groups_subtopics() {
    let engine = BreakdownEngine::default();
    let current = series(&[
        ("root.playas.almonte", &[("20250919", 9.0)]),
        ("root.playas.matalascañas.chiringuitos", &[("20250919", 2.0)]),
        ("root.playas.almonte.socorrismo", &[("20250920", 4.0)]),
    ]);

    let breakdown = engine.drilldown(&playas_request(), "El Rocío", &current, &RawSeriesByKey::new());

    assert_eq!(breakdown.scope, "playas.almonte");
    assert_eq!(breakdown.mode, PartitionMode::TopicFirst);
    assert_eq!(breakdown.bucketized.current_by_group["chiringuitos"], vec![2.0, 0.0]);
    assert_eq!(breakdown.bucketized.current_by_group["socorrismo"], vec![0.0, 4.0]);
    assert_eq!(breakdown.bucketized.labels_by_group["socorrismo"], "Socorrismo");
    assert_eq!(breakdown.others.as_ref().map(|o| o.total), Some(9.0));
}

#[test]
fn test_top_k_comes_from_request_or_settings() {
    let current: RawSeriesByKey = Taxonomy::huelva()
        .towns
        .iter()
        .enumerate()
        .map(|(i, town)| {
            (
                format!("root.playas.{}", town.id),
                vec![RawPoint::new("20250919", (i + 1) as f64)],
            )
        })
        .collect();

    let engine = BreakdownEngine::new(
        Taxonomy::huelva(),
        EngineSettings {
            top_k: 3,
            ..EngineSettings::default()
        },
    );
    let default_k = engine.breakdown(&playas_request(), &current, &RawSeriesByKey::new());
    assert_eq!(default_k.top_series.len(), 4);

    let request = playas_request().with_top_k(5);
    let explicit_k = engine.breakdown(&request, &current, &RawSeriesByKey::new());
    assert_eq!(explicit_k.top_series.len(), 6);

    let series_total: f64 = explicit_k.top_series.iter().map(|l| l.total()).sum();
    let group_total: f64 = explicit_k.bucketized.totals_by_group.values().sum();
    assert_eq!(series_total, group_total);
}

#[test]
fn test_category_summary() {
    let engine = BreakdownEngine::default();
    let current = series(&[
        ("root.playas", &[("20250919", 5.0)]),
        ("root.Playa", &[("20250919", 2.0)]),
        ("root.gastronomya", &[("20250919", 3.0)]),
        ("root.zzz", &[("20250919", 4.0)]),
        ("root.playas.almonte", &[("20250919", 100.0)]),
    ]);
    let previous = series(&[("root.playas", &[("20250918", 14.0)])]);

    let summary = engine.summarize_categories(&current, &previous, 2);

    assert_eq!(summary.entities.len(), Taxonomy::huelva().categories.len());
    let playas = summary.entities.iter().find(|e| e.id == "playas").unwrap();
    assert_eq!(playas.current_total, 7.0);
    assert_eq!(playas.delta_percent, Some(-50.0));
    let gastronomia = summary.entities.iter().find(|e| e.id == "gastronomia").unwrap();
    assert_eq!(gastronomia.current_total, 3.0);
    assert_eq!(gastronomia.label, "Gastronomía");

    let others = summary.others.unwrap();
    assert_eq!(others.distinct_keys, 1);
    assert_eq!(others.entries[0].key, "root.zzz");
}

#[test]
fn test_level1_totals_ignore_subcategory_detail() {
    let engine = BreakdownEngine::default();
    let current = series(&[
        ("root.playas.almonte", &[("20250919", 10.0)]),
        ("root.playas.almonte.chiringuitos", &[("20250919", 4.0)]),
    ]);

    let breakdown = engine.breakdown(&playas_request(), &current, &RawSeriesByKey::new());
    assert_eq!(breakdown.bucketized.totals_by_group["almonte"], 10.0);
    assert!(breakdown.others.is_none());
}

#[test]
fn test_monthly_previous_series_matches_previous_total() {
    let engine = BreakdownEngine::default();
    let request = BreakdownRequest::new(
        "playas",
        EntityKind::Category,
        DateRange::parse("2025-03-01", "2025-03-31").unwrap(),
        Granularity::Month,
    );
    let current = series(&[("root.playas.lepe", &[("20250310", 8.0)])]);
    let previous = series(&[("root.playas.lepe", &[("20250130", 1.0), ("20250220", 3.0)])]);

    let breakdown = engine.breakdown(&request, &current, &previous);
    assert_eq!(breakdown.bucketized.x_labels, vec!["2025-03"]);
    assert_eq!(breakdown.bucketized.previous_by_group["lepe"], vec![4.0]);

    let lepe = breakdown.deltas.iter().find(|d| d.id == "lepe").unwrap();
    assert_eq!(lepe.prev_total, 4.0);
    assert_eq!(lepe.delta_percent, Some(100.0));
}

#[test]
fn test_donut_others_counts_only_in_range_points() {
    let engine = BreakdownEngine::default();
    let current = series(&[
        ("root.playas.lepe", &[("20250919", 1.0)]),
        (
            "root.playas.xyzplace",
            &[("20250101", 50.0), ("20250919", 2.0), ("20250920", 3.0)],
        ),
    ]);

    let breakdown = engine.breakdown(&playas_request(), &current, &RawSeriesByKey::new());
    assert_eq!(breakdown.others_series, Some(vec![2.0, 3.0]));
    let otros = breakdown.donut.iter().find(|s| s.id == OTHERS_ID).unwrap();
    assert_eq!(otros.value, 5.0);
}

#[test]
fn test_first_representable_date_does_not_panic() {
    let engine = BreakdownEngine::default();
    let first = chrono::NaiveDate::MIN;
    let request = BreakdownRequest::new(
        "playas",
        EntityKind::Category,
        DateRange::new(first, first),
        Granularity::Day,
    );

    let breakdown = engine.breakdown(&request, &RawSeriesByKey::new(), &RawSeriesByKey::new());
    assert_eq!(breakdown.bucketized.x_labels.len(), 1);
    assert!(breakdown.bucketized.previous_by_group.values().all(|v| v == &vec![0.0]));
}

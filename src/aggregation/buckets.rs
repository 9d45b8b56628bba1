//! Time bucketing: axis generation and folding of daily points.
//!
//! Every granularity goes through one `BucketMode`, so the labels produced
//! by `generate_buckets` and the keys computed for points always agree.

use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::HashMap;

use crate::models::chart::Bucketized;
use crate::models::grouping::GroupedResult;
use crate::models::series::Entry;
use crate::models::time::{BucketMode, DateRange, Granularity};

/// Label of the bucket containing `day`.
pub fn bucket_key(day: NaiveDate, mode: BucketMode) -> String {
    match mode {
        BucketMode::Day => day.format("%Y-%m-%d").to_string(),
        BucketMode::IsoWeek => iso_week_monday(day).format("%Y-%m-%d").to_string(),
        BucketMode::Month => day.format("%Y-%m").to_string(),
    }
}

/// Monday opening the ISO week of `day`.
///
/// Days in the first partial week of the calendar map to themselves.
pub fn iso_week_monday(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(day.weekday().num_days_from_monday() as u64))
        .unwrap_or(day)
}

fn first_of_month(day: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1)
}

/// Ordered bucket labels for `YYYY-MM-DD` bounds. Malformed bounds give an empty axis.
pub fn generate_buckets(start_iso: &str, end_iso: &str, granularity: Granularity) -> Vec<String> {
    DateRange::parse(start_iso, end_iso)
        .map(|range| generate_range_buckets(&range, granularity))
        .unwrap_or_default()
}

/// Ordered bucket labels covering `range`.
///
/// - `d`: every day
/// - `w`: the Monday of every ISO week touched
/// - `m`: every month touched
/// - `y`: the twelve months of the start year, whatever the range spans
pub fn generate_range_buckets(range: &DateRange, granularity: Granularity) -> Vec<String> {
    if range.is_empty() {
        return Vec::new();
    }

    match granularity {
        Granularity::Day => range
            .start
            .iter_days()
            .take_while(|day| *day <= range.end)
            .map(|day| bucket_key(day, BucketMode::Day))
            .collect(),
        Granularity::Week => iso_week_monday(range.start)
            .iter_weeks()
            .take_while(|monday| *monday <= range.end)
            .map(|monday| bucket_key(monday, BucketMode::IsoWeek))
            .collect(),
        Granularity::Month => {
            let mut labels = Vec::new();
            let mut cursor = first_of_month(range.start);
            while let Some(month) = cursor.filter(|m| *m <= range.end) {
                labels.push(bucket_key(month, BucketMode::Month));
                cursor = month.checked_add_months(Months::new(1));
            }
            labels
        }
        Granularity::Year => {
            let year = range.start.year();
            (1..=12)
                .filter_map(|month| NaiveDate::from_ymd_opt(year, month, 1))
                .map(|day| bucket_key(day, BucketMode::Month))
                .collect()
        }
    }
}

/// Sums the points of `entries` inside `range` onto `x_labels`.
///
/// Points with an unparsable day, outside the range, or whose bucket is not
/// on the axis are dropped.
pub fn bucketize(
    entries: &[Entry],
    range: &DateRange,
    granularity: Granularity,
    x_labels: &[String],
) -> Vec<f64> {
    fold_onto_axis(entries, range, granularity, x_labels, Some)
}

fn fold_onto_axis(
    entries: &[Entry],
    range: &DateRange,
    granularity: Granularity,
    x_labels: &[String],
    place: impl Fn(NaiveDate) -> Option<NaiveDate>,
) -> Vec<f64> {
    let mut values = vec![0.0; x_labels.len()];
    let positions: HashMap<&str, usize> = x_labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();
    let mode = granularity.bucket_mode();

    for point in entries.iter().flat_map(|e| e.points.iter()) {
        let Some(day) = point.date().filter(|day| range.contains(*day)) else {
            continue;
        };
        let Some(day) = place(day) else {
            continue;
        };
        if let Some(&i) = positions.get(bucket_key(day, mode).as_str()) {
            values[i] += point.value;
        }
    }
    values
}

/// Sum of the points of `entries` that fall inside `range`.
pub fn range_total(entries: &[Entry], range: &DateRange) -> f64 {
    entries
        .iter()
        .flat_map(|e| e.points.iter())
        .filter(|p| p.date().map(|day| range.contains(day)).unwrap_or(false))
        .map(|p| p.value)
        .sum()
}

/// Same-length window immediately before `current`.
pub fn derive_previous_range(current: &DateRange) -> DateRange {
    current.previous()
}

/// Bucketizes the previous period onto the current axis.
///
/// Every previous day is moved forward by the window length, so it lands on
/// the bucket of the matching current day and no previous point is lost.
pub fn bucketize_previous(
    entries: &[Entry],
    previous: &DateRange,
    granularity: Granularity,
    x_labels: &[String],
) -> Vec<f64> {
    let shift = Days::new(previous.length_days() as u64);
    fold_onto_axis(entries, previous, granularity, x_labels, |day| {
        day.checked_add_days(shift)
    })
}

/// Builds the per-group axis-aligned structure.
///
/// `groups` is the ordered `(id, label)` universe; ids absent from the
/// grouped results get zero series.
pub fn bucketize_groups(
    current: &GroupedResult,
    previous: &GroupedResult,
    range: &DateRange,
    granularity: Granularity,
    groups: &[(String, String)],
) -> Bucketized {
    let x_labels = generate_range_buckets(range, granularity);
    let previous_range = derive_previous_range(range);
    let mut out = Bucketized {
        x_labels,
        ..Bucketized::default()
    };

    for (id, label) in groups {
        let current_entries = current.groups.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let previous_entries = previous.groups.get(id).map(Vec::as_slice).unwrap_or(&[]);

        let current_values = bucketize(current_entries, range, granularity, &out.x_labels);
        let previous_values =
            bucketize_previous(previous_entries, &previous_range, granularity, &out.x_labels);

        out.totals_by_group
            .insert(id.clone(), current_values.iter().sum());
        out.current_by_group.insert(id.clone(), current_values);
        out.previous_by_group.insert(id.clone(), previous_values);
        out.labels_by_group.insert(id.clone(), label.clone());
    }
    out
}

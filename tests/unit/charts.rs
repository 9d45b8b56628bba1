//! Unit tests for chart adapters

use tourlytics::aggregation::charts::{
    get_top_groups, prepare_donut_data, top_k_series, DEFAULT_TOP_K, OTHERS_ID,
};
use tourlytics::models::chart::{Bucketized, SeriesLine};

fn lines(count: usize, width: usize) -> Vec<SeriesLine> {
    (0..count)
        .map(|i| {
            let values = (0..width).map(|b| ((i * 7 + b * 3) % 11) as f64).collect();
            SeriesLine::new(format!("g{:02}", i), format!("Group {}", i), values)
        })
        .collect()
}

fn column_sums(lines: &[SeriesLine], width: usize) -> Vec<f64> {
    (0..width)
        .map(|b| lines.iter().map(|l| l.values[b]).sum())
        .collect()
}

#[test]
fn test_top_k_reconciles_every_bucket() {
    let width = 5;
    let input = lines(11, width);
    let expected = column_sums(&input, width);

    let output = top_k_series(input, DEFAULT_TOP_K);
    assert_eq!(output.len(), DEFAULT_TOP_K + 1);
    assert_eq!(output.last().map(|l| l.id.as_str()), Some(OTHERS_ID));
    assert_eq!(column_sums(&output, width), expected);
}

#[test]
fn test_top_k_keeps_largest_in_order() {
    let output = top_k_series(lines(11, 5), DEFAULT_TOP_K);
    let totals: Vec<f64> = output[..DEFAULT_TOP_K].iter().map(SeriesLine::total).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_top_groups_match_top_series() {
    let input = lines(9, 4);
    let totals = input.iter().map(|l| (l.id.clone(), l.total())).collect();
    let top = get_top_groups(&totals, DEFAULT_TOP_K);
    let series = top_k_series(input, DEFAULT_TOP_K);

    let series_ids: Vec<&str> = series[..DEFAULT_TOP_K].iter().map(|l| l.id.as_str()).collect();
    assert_eq!(top, series_ids);
}

#[test]
fn test_donut_is_complete() {
    let mut bucketized = Bucketized::default();
    for (i, line) in lines(9, 3).iter().enumerate() {
        bucketized.totals_by_group.insert(line.id.clone(), line.total());
        bucketized
            .labels_by_group
            .insert(line.id.clone(), format!("Group {}", i));
    }
    let others_series = [10.0, 5.0];

    let without = prepare_donut_data(&bucketized, None);
    assert_eq!(without.len(), 9);

    let with = prepare_donut_data(&bucketized, Some(&others_series[..]));
    assert_eq!(with.len(), 10);
    assert_eq!(with.last().map(|s| s.value), Some(15.0));

    let slice_sum: f64 = with.iter().map(|s| s.value).sum();
    let group_sum: f64 = bucketized.totals_by_group.values().sum();
    assert_eq!(slice_sum, group_sum + 15.0);
}

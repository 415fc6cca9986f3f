#![allow(dead_code)]

use lineage_labels::data::model::Series;

/// Build a categorical series from optional labels.
pub fn cat(labels: &[Option<&str>]) -> Series {
    Series::from_labels(labels.iter().copied())
}

/// Per-item labels of a categorical series.
pub fn labels(series: &Series) -> Vec<Option<String>> {
    series
        .as_categorical()
        .expect("series should be categorical")
        .labels()
        .map(|l| l.map(str::to_string))
        .collect()
}

/// Assert two categorical series hold the same labels, treating missing
/// items as equal to each other.
pub fn assert_labels_eq(actual: &Series, expected: &Series) {
    assert_eq!(actual.len(), expected.len(), "length differs");
    assert_eq!(labels(actual), labels(expected));
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

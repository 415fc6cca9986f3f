mod common;

use std::collections::BTreeMap;

use common::{assert_labels_eq, cat, labels, strings};
use lineage_labels::color::{create_colors, is_color_like, ColorShift, Colors};
use lineage_labels::data::filter::process_series;
use lineage_labels::data::mapping::{map_names_and_colors, MapOptions};
use lineage_labels::data::merge::{merge_categorical_series, merged_categorical_series, MergeColors};
use lineage_labels::data::model::{Index, MetadataValue, Series};
use lineage_labels::LabelError;

fn old() -> Series {
    cat(&[Some("a"), Some("b"), None, Some("b"), None])
}

fn new() -> Series {
    cat(&[Some("b"), None, Some("a"), Some("d"), Some("a")])
}

fn plain(labels: &[Option<&str>]) -> Series {
    Series::from_values(
        labels
            .iter()
            .map(|l| l.map(MetadataValue::from).unwrap_or(MetadataValue::Null))
            .collect(),
    )
}

fn with_colors(old: Option<&[&str]>, new: Option<&[&str]>, overwrite: bool) -> MergeColors {
    MergeColors {
        colors_old: old.map(|c| Colors::from(c.to_vec())),
        colors_new: new.map(|c| Colors::from(c.to_vec())),
        color_overwrite: overwrite,
    }
}

// ---------------------------------------------------------------------------
// merge_categorical_series
// ---------------------------------------------------------------------------

mod merge {
    use super::*;

    #[test]
    fn test_merge_not_categorical() {
        let x = old();
        let y = plain(&[Some("b"), None, None, Some("d"), Some("a")]);
        let err = merged_categorical_series(&x, &y, &MergeColors::default()).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_merge_different_index() {
        let x = old();
        let y = cat(&[Some("b"), None, None, Some("d"), Some("a")])
            .with_index(Index::new((1..=5).rev().map(MetadataValue::Integer).collect()))
            .unwrap();
        let err = merged_categorical_series(&x, &y, &MergeColors::default()).unwrap_err();
        assert!(matches!(err, LabelError::IndexMismatch { .. }));
    }

    #[test]
    fn test_merge_normal_run() {
        let expected = cat(&[Some("b"), Some("b"), Some("a"), Some("d"), Some("a")]);
        let (res, colors) =
            merged_categorical_series(&old(), &new(), &MergeColors::default()).unwrap();
        assert_labels_eq(&res, &expected);
        assert!(colors.is_none());
    }

    #[test]
    fn test_merge_normal_run_inplace() {
        let mut x = old();
        let expected = cat(&[Some("b"), Some("b"), Some("a"), Some("d"), Some("a")]);
        let colors = merge_categorical_series(&mut x, &new(), &MergeColors::default()).unwrap();
        assert!(colors.is_none());
        assert_labels_eq(&x, &expected);
    }

    #[test]
    fn test_merge_completely_different_categories() {
        let x = cat(&[Some("a"), Some("a"), Some("a")]);
        let y = cat(&[Some("b"), Some("b"), Some("b")]);
        let (res, _) = merged_categorical_series(&x, &y, &MergeColors::default()).unwrap();
        assert_labels_eq(&res, &y);
        assert_eq!(res.as_categorical().unwrap().categories(), &strings(&["b"]));
    }

    #[test]
    fn test_merge_colors_not_colorlike() {
        let mut x = old();
        let err = merge_categorical_series(
            &mut x,
            &new(),
            &with_colors(Some(&["red", "foo"]), None, false),
        )
        .unwrap_err();
        assert_eq!(err, LabelError::NotColorLike("foo".into()));
    }

    #[test]
    fn test_merge_colors_wrong_number_of_colors() {
        let mut x = old();
        let err = merge_categorical_series(&mut x, &new(), &with_colors(Some(&["red"]), None, false))
            .unwrap_err();
        assert_eq!(err, LabelError::ColorCount { expected: 2, found: 1 });
    }

    #[test]
    fn test_merge_colors_wrong_dict() {
        let mut x = old();
        let mapping: BTreeMap<String, String> =
            [("a".into(), "red".into()), ("foo".into(), "blue".into())].into();
        let colors = MergeColors {
            colors_old: Some(Colors::from(mapping)),
            ..Default::default()
        };
        let err = merge_categorical_series(&mut x, &new(), &colors).unwrap_err();
        assert!(matches!(err, LabelError::ColorKeys(_)));
    }

    #[test]
    fn test_merge_colors_dict() {
        let mut x = old();
        let mapping: BTreeMap<String, String> =
            [("b".into(), "blue".into()), ("a".into(), "red".into())].into();
        let colors = MergeColors {
            colors_old: Some(Colors::from(mapping)),
            ..Default::default()
        };
        let merged = merge_categorical_series(&mut x, &new(), &colors).unwrap();
        assert_eq!(merged.unwrap(), strings(&["red", "blue", "#4daf4a"]));
    }

    #[test]
    fn test_merge_colors_simple_old() {
        let mut x = old();
        let merged =
            merge_categorical_series(&mut x, &new(), &with_colors(Some(&["red", "blue"]), None, false))
                .unwrap();
        assert_eq!(merged.unwrap(), strings(&["red", "blue", "#4daf4a"]));
    }

    #[test]
    fn test_merge_colors_simple_old_no_inplace() {
        let x = old();
        let expected = cat(&[Some("b"), Some("b"), Some("a"), Some("d"), Some("a")]);
        let (res, merged) = merged_categorical_series(
            &x,
            &new(),
            &with_colors(Some(&["red", "blue"]), None, false),
        )
        .unwrap();
        assert_labels_eq(&res, &expected);
        assert_eq!(merged.unwrap(), strings(&["red", "blue", "#4daf4a"]));
        // the input is left alone
        assert_labels_eq(&x, &old());
    }

    #[test]
    fn test_merge_colors_simple_new() {
        let mut x = old();
        let merged = merge_categorical_series(
            &mut x,
            &new(),
            &with_colors(None, Some(&["red", "blue", "green"]), false),
        )
        .unwrap();
        assert_eq!(merged.unwrap(), strings(&["#e41a1c", "#377eb8", "green"]));
    }

    #[test]
    fn test_merge_colors_both() {
        let mut x = old();
        let merged = merge_categorical_series(
            &mut x,
            &new(),
            &with_colors(Some(&["red", "blue"]), Some(&["green", "yellow", "black"]), false),
        )
        .unwrap();
        assert_eq!(merged.unwrap(), strings(&["red", "blue", "black"]));
    }

    #[test]
    fn test_merge_colors_both_overwrite() {
        let mut x = old();
        let merged = merge_categorical_series(
            &mut x,
            &new(),
            &with_colors(Some(&["red", "blue"]), Some(&["green", "yellow", "black"]), true),
        )
        .unwrap();
        assert_eq!(merged.unwrap(), strings(&["green", "yellow", "black"]));
    }
}

// ---------------------------------------------------------------------------
// map_names_and_colors
// ---------------------------------------------------------------------------

mod map_names {
    use super::*;

    fn query() -> Series {
        cat(&[Some("b"), None, None, Some("d"), Some("a")])
    }

    #[test]
    fn test_simple_not_categorical() {
        let y = plain(&[Some("b"), None, None, Some("d"), Some("a")]);
        let err = map_names_and_colors::<&str>(&old(), &y, None, &MapOptions::default())
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_simple_wrong_index() {
        let y = query()
            .with_index(Index::from_labels(["foo", "bar", "baz", "quux", "quas"]))
            .unwrap();
        let err = map_names_and_colors::<&str>(&old(), &y, None, &MapOptions::default())
            .unwrap_err();
        assert!(matches!(err, LabelError::IndexMismatch { .. }));
    }

    #[test]
    fn test_simple_not_color_like() {
        let err = map_names_and_colors(
            &old(),
            &query(),
            Some(&["foo", "bar"][..]),
            &MapOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LabelError::NotColorLike(_)));
    }

    #[test]
    fn test_simple_invalid_color_length() {
        let err = map_names_and_colors(&old(), &query(), Some(&["red"][..]), &MapOptions::default())
            .unwrap_err();
        assert_eq!(err, LabelError::ColorCount { expected: 2, found: 1 });
    }

    #[test]
    fn test_simple_run() {
        let res = map_names_and_colors::<&str>(&old(), &query(), None, &MapOptions::default())
            .unwrap();
        assert!(res.colors.is_none());
        let names: Vec<MetadataValue> = (0..res.names.len()).map(|i| res.names.value(i)).collect();
        assert_eq!(
            names,
            vec![
                MetadataValue::from("a_1"),
                MetadataValue::from("a_2"),
                MetadataValue::from("b")
            ]
        );
        assert_eq!(res.names.index(), &Index::from_labels(["a", "b", "d"]));
    }

    #[test]
    fn test_return_colors() {
        let res = map_names_and_colors(
            &old(),
            &query(),
            Some(&["red", "green"][..]),
            &MapOptions::default(),
        )
        .unwrap();
        let colors = res.colors.unwrap();
        assert_eq!(colors.len(), 3);
        // "a_1" and "a_2" are variations of red, "b" keeps green
        let shades = create_colors("red", 2, &ColorShift::default()).unwrap();
        assert_eq!(&colors[..2], shades.as_slice());
        assert_ne!(colors[0], colors[1]);
        assert_eq!(colors[2], "#008000");
        assert!(colors.iter().all(|c| is_color_like(c)));
    }
}

// ---------------------------------------------------------------------------
// process_series
// ---------------------------------------------------------------------------

mod process {
    use super::*;

    fn x() -> Series {
        old()
    }

    fn keys<'a>(k: &'a [&'a str]) -> Option<&'a [&'a str]> {
        Some(k)
    }

    #[test]
    fn test_not_categorical() {
        let s = plain(&[Some("a"), Some("b"), None, Some("b"), None]);
        let err = process_series(s, keys(&["foo"]), None).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_colors_wrong_number_of_colors() {
        let err = process_series(x(), keys(&["foo"]), Some(strings(&["red"]))).unwrap_err();
        assert_eq!(err, LabelError::ColorCount { expected: 2, found: 1 });
    }

    #[test]
    fn test_colors_not_colorlike() {
        let err = process_series(x(), keys(&["foo"]), Some(strings(&["bar", "red"]))).unwrap_err();
        assert_eq!(err, LabelError::NotColorLike("bar".into()));
    }

    #[test]
    fn test_keys_are_not_proper_categories() {
        let err = process_series(x(), keys(&["foo"]), None).unwrap_err();
        assert_eq!(err, LabelError::UnknownKeys(strings(&["foo"])));
    }

    #[test]
    fn test_keys_overlap() {
        let err = process_series(x(), keys(&["a", "b, a"]), None).unwrap_err();
        assert!(matches!(err, LabelError::OverlappingKeys(_)));
    }

    #[test]
    fn test_normal_run() {
        let expected = cat(&[Some("a"), None, None, None, None]);
        let res = process_series(x(), keys(&["a"]), None).unwrap();
        assert_labels_eq(&res.series, &expected);
    }

    #[test]
    fn test_repeat_key() {
        let expected = cat(&[Some("a"), None, None, None, None]);
        let res = process_series(x(), keys(&["a, a, a"]), None).unwrap();
        assert_labels_eq(&res.series, &expected);
    }

    #[test]
    fn test_reorder_keys() {
        let s = cat(&[Some("b"), Some("c"), Some("a"), Some("d"), Some("a")]);
        let group = Some("a or b or d");
        let expected = cat(&[group, None, group, group, group]);
        let res = process_series(s, keys(&["b, a, d"]), None).unwrap();
        assert_labels_eq(&res.series, &expected);
    }

    #[test]
    fn test_no_keys() {
        let res = process_series::<&str>(x(), None, None).unwrap();
        assert_eq!(res.series, x());
        assert!(res.colors.is_none());
    }

    #[test]
    fn test_no_keys_colors() {
        // no validation happens without keys
        let colors = strings(&["foo"]);
        let res = process_series::<&str>(x(), None, Some(colors.clone())).unwrap();
        assert_eq!(res.series, x());
        assert_eq!(res.colors, Some(colors));
    }

    #[test]
    fn test_empty_keys() {
        let res = process_series::<&str>(x(), Some(&[]), None).unwrap();
        assert_eq!(res.series.len(), x().len());
        assert!(labels(&res.series).iter().all(Option::is_none));
    }

    #[test]
    fn test_return_colors() {
        let s = cat(&[Some("b"), Some("c"), Some("a"), Some("d"), Some("a")]);
        let expected = cat(&[
            Some("a or b"),
            Some("c or d"),
            Some("a or b"),
            Some("c or d"),
            Some("a or b"),
        ]);
        let res = process_series(
            s,
            keys(&["b, a", "d, c"]),
            Some(strings(&["red", "green", "blue", "white"])),
        )
        .unwrap();

        assert!(res.series.is_categorical());
        assert_labels_eq(&res.series, &expected);
        assert_eq!(res.colors.unwrap(), strings(&["#804000", "#8080ff"]));
    }

    #[test]
    fn test_single_key_color_is_hex() {
        let res = process_series(x(), keys(&["b"]), Some(strings(&["red", "blue"]))).unwrap();
        assert_eq!(res.colors.unwrap(), strings(&["#0000ff"]));
    }
}

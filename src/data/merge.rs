use std::collections::BTreeSet;

use log::debug;

use super::model::{check_aligned, Categorical, Series};
use crate::color::{create_categorical_colors, ColorMap, Colors};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Merge options
// ---------------------------------------------------------------------------

/// Colors attached to the two operands of a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeColors {
    /// Colors of the old series' categories.
    pub colors_old: Option<Colors>,
    /// Colors of the new series' categories.
    pub colors_new: Option<Colors>,
    /// Prefer the new colors for categories present in both series.
    pub color_overwrite: bool,
}

impl MergeColors {
    fn requested(&self) -> bool {
        self.colors_old.is_some() || self.colors_new.is_some()
    }
}

// ---------------------------------------------------------------------------
// Categorical merge
// ---------------------------------------------------------------------------

/// Update `old` in place with the non-missing labels of `new`.
///
/// Old categories are never removed by the update itself: the category set
/// becomes the sorted union of the old categories and those used by the new
/// labels, after which unused categories are dropped. Nothing is modified
/// unless every check passes.
///
/// Returns the merged colors when any colors were supplied.
pub fn merge_categorical_series(
    old: &mut Series,
    new: &Series,
    colors: &MergeColors,
) -> Result<Option<Vec<String>>> {
    let (merged, merged_colors) = merged_categorical_series(old, new, colors)?;
    *old = merged;
    Ok(merged_colors)
}

/// Like [`merge_categorical_series`] but leaves `old` untouched and returns
/// the merged series alongside the optional colors.
pub fn merged_categorical_series(
    old: &Series,
    new: &Series,
    colors: &MergeColors,
) -> Result<(Series, Option<Vec<String>>)> {
    let old_cat = old.as_categorical()?;
    let new_cat = new.as_categorical()?;
    check_aligned(old, new)?;

    let merged = merge_labels(old_cat, new_cat)?;
    debug!(
        "merged `{}` into `{}`: {} -> {} categories",
        new.display_name(),
        old.display_name(),
        old_cat.categories().len(),
        merged.categories().len()
    );

    let merged_colors = if colors.requested() {
        Some(merge_colors(old_cat, new_cat, merged.categories(), colors)?)
    } else {
        None
    };

    Ok((old.with_categorical(merged), merged_colors))
}

fn merge_labels(old: &Categorical, new: &Categorical) -> Result<Categorical> {
    if new.labels().all(|l| l.is_none()) {
        return Ok(old.clone());
    }

    let used_new: BTreeSet<&str> = new.labels().flatten().collect();
    let union: BTreeSet<String> = old
        .categories()
        .iter()
        .cloned()
        .chain(used_new.iter().map(|s| s.to_string()))
        .collect();
    let categories: Vec<String> = union.into_iter().collect();

    let labels: Vec<Option<&str>> = old
        .labels()
        .zip(new.labels())
        .map(|(o, n)| n.or(o))
        .collect();
    let mut merged = Categorical::with_categories(categories, labels)?;
    merged.remove_unused_categories();
    Ok(merged)
}

fn merge_colors(
    old: &Categorical,
    new: &Categorical,
    merged_categories: &[String],
    colors: &MergeColors,
) -> Result<Vec<String>> {
    let resolve = |cat: &Categorical, given: &Option<Colors>| -> Result<ColorMap> {
        let given = given
            .clone()
            .unwrap_or_else(|| Colors::List(create_categorical_colors(cat.categories().len())));
        ColorMap::new(cat.categories(), &given)
    };
    let old_map = resolve(old, &colors.colors_old)?;
    let new_map = resolve(new, &colors.colors_new)?;

    let combined = if colors.color_overwrite {
        old_map.overlay(&new_map)
    } else {
        new_map.overlay(&old_map)
    };
    combined.colors_for(merged_categories)
}

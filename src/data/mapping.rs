use std::collections::BTreeMap;

use log::{debug, warn};

use super::model::{check_aligned, Categorical, Index, MetadataValue, Series};
use crate::color::{check_color_like, create_colors, to_hex, ColorShift};
use crate::error::{LabelError, Result};

/// How query categories are named after the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// Rows of the association matrix whose entropy exceeds this are unknown.
    pub en_cutoff: Option<f64>,
    /// Name given to query categories without a clear reference match.
    pub unknown_label: String,
    /// Base color of unknown categories.
    pub unknown_color: String,
    /// Spread used to derive colors for reference names shared by several
    /// query categories.
    pub color_shift: ColorShift,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            en_cutoff: None,
            unknown_label: "Unknown".to_string(),
            unknown_color: "gray".to_string(),
            color_shift: ColorShift::default(),
        }
    }
}

/// Result of [`map_names_and_colors`].
#[derive(Debug, Clone, PartialEq)]
pub struct MappedNames {
    /// New names, indexed by the query categories.
    pub names: Series,
    /// Hex colors, one per query category, when reference colors were given.
    pub colors: Option<Vec<String>>,
}

/// Overlap counts: rows are query categories, columns reference categories.
pub fn association_matrix(reference: &Categorical, query: &Categorical) -> Vec<Vec<usize>> {
    let mut counts = vec![vec![0usize; reference.categories().len()]; query.categories().len()];
    for (q, r) in query.codes().iter().zip(reference.codes()) {
        if let (Some(q), Some(r)) = (q, r) {
            counts[*q][*r] += 1;
        }
    }
    counts
}

/// Shannon entropy (natural log) of normalized counts; `None` for an all-zero row.
fn entropy(row: &[usize]) -> Option<f64> {
    let total: usize = row.iter().sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    Some(
        row.iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.ln()
            })
            .sum(),
    )
}

/// Name each query category after the reference category it overlaps most.
///
/// Reference names picked by several query categories get `_1`, `_2`, ...
/// suffixes in query category order. With reference colors, unique names keep
/// the reference color and shared names get variations of it.
pub fn map_names_and_colors<S: AsRef<str>>(
    reference: &Series,
    query: &Series,
    colors_reference: Option<&[S]>,
    options: &MapOptions,
) -> Result<MappedNames> {
    let query_cat = query.as_categorical()?;
    let reference_cat = reference.as_categorical()?;
    check_aligned(reference, query)?;

    if let Some(colors) = colors_reference {
        if colors.len() != reference_cat.categories().len() {
            return Err(LabelError::ColorCount {
                expected: reference_cat.categories().len(),
                found: colors.len(),
            });
        }
        check_color_like(colors)?;
    }

    let association = association_matrix(reference_cat, query_cat);
    let ref_names = reference_cat.categories();

    // best reference match per query category; unknown when ambiguous
    let matches: Vec<Option<usize>> = association
        .iter()
        .map(|row| {
            let best = argmax(row);
            match (options.en_cutoff, entropy(row)) {
                (Some(cutoff), Some(h)) if h > cutoff => None,
                _ => best,
            }
        })
        .collect();

    let mut frequency: BTreeMap<Option<usize>, usize> = BTreeMap::new();
    for m in &matches {
        *frequency.entry(*m).or_default() += 1;
    }

    let base_name = |m: &Option<usize>| -> String {
        match m {
            Some(r) => ref_names[*r].clone(),
            None => options.unknown_label.clone(),
        }
    };

    let mut seen: BTreeMap<Option<usize>, usize> = BTreeMap::new();
    let mut names = Vec::with_capacity(matches.len());
    for m in &matches {
        let n = frequency.get(m).copied().unwrap_or(1);
        let rep = seen.entry(*m).or_default();
        *rep += 1;
        if n == 1 {
            names.push(base_name(m));
        } else {
            names.push(format!("{}_{}", base_name(m), rep));
        }
    }

    let colors = match colors_reference {
        None => None,
        Some(colors) => {
            let mut variations: BTreeMap<Option<usize>, Vec<String>> = BTreeMap::new();
            for (m, n) in &frequency {
                let base = match m {
                    Some(r) => colors[*r].as_ref(),
                    None => options.unknown_color.as_str(),
                };
                let shades = if *n == 1 {
                    vec![to_hex(base)?]
                } else {
                    create_colors(base, *n, &options.color_shift)?
                };
                variations.insert(*m, shades);
            }
            let mut used: BTreeMap<Option<usize>, usize> = BTreeMap::new();
            let mut out = Vec::with_capacity(matches.len());
            for m in &matches {
                let i = used.entry(*m).or_default();
                let color = variations
                    .get(m)
                    .and_then(|v| v.get(*i))
                    .cloned()
                    .ok_or(LabelError::InvalidColorCount(*i))?;
                *i += 1;
                out.push(color);
            }
            Some(out)
        }
    };

    let n_unknown = frequency.get(&None).copied().unwrap_or(0);
    if n_unknown > 0 {
        warn!(
            "{n_unknown} of {} query categories could not be matched confidently",
            matches.len()
        );
    }
    debug!(
        "mapped {} query categories onto {} reference categories",
        matches.len(),
        ref_names.len()
    );

    let index = Index::from_labels(query_cat.categories().iter().cloned());
    let names = Series::from_values(names.into_iter().map(MetadataValue::String).collect())
        .with_index(index)?;
    Ok(MappedNames { names, colors })
}

/// Position of the first maximum, `None` for an empty row.
fn argmax(row: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, &v) in row.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

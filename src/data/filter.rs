use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::model::{Categorical, Series};
use crate::color::{check_color_like, mean_color, to_hex};
use crate::error::{LabelError, Result};

/// Separator between the members of a combined category name.
pub const GROUP_SEPARATOR: &str = " or ";

// ---------------------------------------------------------------------------
// Key groups: which categories are kept, and which are reported together
// ---------------------------------------------------------------------------

/// One reported category: its sorted, de-duplicated member categories.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyGroup(Vec<String>);

impl KeyGroup {
    /// Parse a comma-joined key such as `"b, a"`.
    pub fn parse(key: &str) -> Self {
        let members: BTreeSet<String> = key
            .trim_matches(|c| c == ' ' || c == ',')
            .split(',')
            .map(|k| k.trim_matches(' ').to_string())
            .collect();
        KeyGroup(members.into_iter().collect())
    }

    pub fn members(&self) -> &[String] {
        &self.0
    }

    /// Name of the reported category, e.g. `"a or b"`.
    pub fn name(&self) -> String {
        self.0.join(GROUP_SEPARATOR)
    }
}

/// Parse key strings into distinct groups, in first-occurrence order.
/// Fails when two groups share a category.
pub fn parse_key_groups<S: AsRef<str>>(keys: &[S]) -> Result<Vec<KeyGroup>> {
    let mut groups: Vec<KeyGroup> = Vec::new();
    for key in keys {
        let group = KeyGroup::parse(key.as_ref());
        if !groups.contains(&group) {
            groups.push(group);
        }
    }

    for (i, a) in groups.iter().enumerate() {
        for b in &groups[i + 1..] {
            let overlap: Vec<String> = a
                .members()
                .iter()
                .filter(|m| b.members().contains(*m))
                .cloned()
                .collect();
            if !overlap.is_empty() {
                return Err(LabelError::OverlappingKeys(overlap));
            }
        }
    }
    Ok(groups)
}

// ---------------------------------------------------------------------------
// Series processing
// ---------------------------------------------------------------------------

/// Output of [`process_series`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSeries {
    pub series: Series,
    pub colors: Option<Vec<String>>,
}

/// Keep and combine categories of `series` according to `keys`.
///
/// * `keys == None` → the series and colors are returned as they are.
/// * every key group (e.g. `"b, a"`) becomes one category named after its
///   sorted members (`"a or b"`); items outside all groups become missing.
/// * colors of single-member groups are kept, combined groups get the mean
///   color. Returned colors are hex.
pub fn process_series<S: AsRef<str>>(
    series: Series,
    keys: Option<&[S]>,
    colors: Option<Vec<String>>,
) -> Result<ProcessedSeries> {
    let Some(keys) = keys else {
        return Ok(ProcessedSeries { series, colors });
    };

    let cat = series.as_categorical()?;
    if let Some(colors) = &colors {
        if colors.len() != cat.categories().len() {
            return Err(LabelError::ColorCount {
                expected: cat.categories().len(),
                found: colors.len(),
            });
        }
        check_color_like(colors)?;
    }

    let groups = parse_key_groups(keys)?;
    let categories: BTreeSet<&str> = cat.categories().iter().map(String::as_str).collect();
    let unknown: Vec<String> = groups
        .iter()
        .flat_map(|g| g.members())
        .filter(|m| !categories.contains(m.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(LabelError::UnknownKeys(unknown));
    }

    // original category position → group position
    let position: BTreeMap<&str, usize> = cat
        .categories()
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let mut remap: Vec<Option<usize>> = vec![None; cat.categories().len()];
    for (g, group) in groups.iter().enumerate() {
        for m in group.members() {
            if let Some(&i) = position.get(m.as_str()) {
                remap[i] = Some(g);
            }
        }
    }

    let codes = cat.codes().iter().map(|c| c.and_then(|c| remap[c])).collect();
    let names: Vec<String> = groups.iter().map(KeyGroup::name).collect();
    debug!(
        "restricted `{}` from {} to {} categories: {:?}",
        series.display_name(),
        cat.categories().len(),
        names.len(),
        names
    );
    let processed = Categorical::from_codes(names, codes);

    let colors = match colors {
        None => None,
        Some(colors) => Some(
            groups
                .iter()
                .map(|group| {
                    let members: Vec<&str> = group
                        .members()
                        .iter()
                        .filter_map(|m| position.get(m.as_str()).map(|&i| colors[i].as_str()))
                        .collect();
                    match members.as_slice() {
                        [single] => to_hex(single),
                        _ => mean_color(&members),
                    }
                })
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    Ok(ProcessedSeries {
        series: series.with_categorical(processed),
        colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_group_parse() {
        let g = KeyGroup::parse(" d, b ,a,");
        assert_eq!(g.members(), &["a", "b", "d"]);
        assert_eq!(g.name(), "a or b or d");
        assert_eq!(KeyGroup::parse("a, a, a").name(), "a");
    }

    #[test]
    fn test_parse_key_groups_dedup_and_order() {
        let groups = parse_key_groups(&["c", "b, a", "a,b"]).unwrap();
        let names: Vec<String> = groups.iter().map(KeyGroup::name).collect();
        assert_eq!(names, vec!["c", "a or b"]);
    }

    #[test]
    fn test_parse_key_groups_overlap() {
        assert_eq!(
            parse_key_groups(&["a", "b, a"]).unwrap_err(),
            LabelError::OverlappingKeys(vec!["a".into()])
        );
    }

    #[test]
    fn test_groups_keep_key_order() {
        let s = Series::from_labels([Some("a"), Some("b"), Some("c")]);
        let res = process_series(s, Some(&["c", "a"][..]), None).unwrap();
        let cat = res.series.as_categorical().unwrap();
        assert_eq!(cat.categories(), &["c".to_string(), "a".to_string()]);
        assert_eq!(
            cat.labels().collect::<Vec<_>>(),
            vec![Some("a"), None, Some("c")]
        );
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{LabelError, Result};

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in an observation column
// ---------------------------------------------------------------------------

/// A dynamically-typed table value mirroring common Pandas dtypes.
/// Used as index label and as plain column value, so it must be `Ord`.
#[derive(Debug, Clone)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl MetadataValue {
    /// Whether this cell is a missing value.
    pub fn is_null(&self) -> bool {
        match self {
            MetadataValue::Null => true,
            MetadataValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Label used when the value becomes a category; `None` for missing values.
    pub fn as_label(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }

    fn dtype(&self) -> &'static str {
        match self {
            MetadataValue::String(_) => "string",
            MetadataValue::Integer(_) => "integer",
            MetadataValue::Float(_) => "floating",
            MetadataValue::Bool(_) => "boolean",
            MetadataValue::Null => "empty",
        }
    }
}

// ---------------------------------------------------------------------------
// Index – ordered row labels shared by aligned series
// ---------------------------------------------------------------------------

/// Row labels of a series or table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Index(Vec<MetadataValue>);

impl Index {
    /// The default `0..n` index.
    pub fn range(n: usize) -> Self {
        Index((0..n as i64).map(MetadataValue::Integer).collect())
    }

    pub fn new(labels: Vec<MetadataValue>) -> Self {
        Index(labels)
    }

    /// Index made of string labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Index(
            labels
                .into_iter()
                .map(|s| MetadataValue::String(s.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[MetadataValue] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Categorical – labels drawn from a finite ordered category set
// ---------------------------------------------------------------------------

/// Per-item codes into an ordered, duplicate-free category list.
/// `None` codes are missing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorical {
    categories: Vec<String>,
    codes: Vec<Option<usize>>,
}

impl Categorical {
    /// Build from labels; categories are the sorted distinct non-missing labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let labels: Vec<Option<String>> =
            labels.into_iter().map(|l| l.map(Into::into)).collect();
        let categories: Vec<String> = labels
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lookup = position_map(&categories);
        let codes = labels
            .iter()
            .map(|l| l.as_ref().and_then(|l| lookup.get(l.as_str()).copied()))
            .collect();
        Categorical { categories, codes }
    }

    /// Build with an explicit category order. Every label must be a category.
    pub fn with_categories<I, S>(categories: Vec<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        check_unique(&categories)?;
        let lookup = position_map(&categories);
        let codes = labels
            .into_iter()
            .map(|l| match l {
                None => Ok(None),
                Some(l) => lookup
                    .get(l.as_ref())
                    .copied()
                    .map(Some)
                    .ok_or_else(|| LabelError::UnknownCategory(l.as_ref().to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Categorical { categories, codes })
    }

    pub(crate) fn from_codes(categories: Vec<String>, codes: Vec<Option<usize>>) -> Self {
        Categorical { categories, codes }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn codes(&self) -> &[Option<usize>] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Label of item `i`, `None` when missing or out of bounds.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.codes
            .get(i)
            .copied()
            .flatten()
            .map(|c| self.categories[c].as_str())
    }

    pub fn is_missing(&self, i: usize) -> bool {
        self.get(i).is_none()
    }

    /// Per-item labels in order.
    pub fn labels(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.codes
            .iter()
            .map(|c| c.map(|c| self.categories[c].as_str()))
    }

    /// Replace the category set. Items whose label is dropped become missing.
    pub fn set_categories(&mut self, categories: Vec<String>) -> Result<()> {
        check_unique(&categories)?;
        let lookup = position_map(&categories);
        let remap: Vec<Option<usize>> = self
            .categories
            .iter()
            .map(|c| lookup.get(c.as_str()).copied())
            .collect();
        for code in &mut self.codes {
            *code = code.and_then(|c| remap[c]);
        }
        self.categories = categories;
        Ok(())
    }

    /// Drop categories no item refers to, keeping the order of the rest.
    pub fn remove_unused_categories(&mut self) {
        let used: BTreeSet<usize> = self.codes.iter().flatten().copied().collect();
        let kept: Vec<String> = self
            .categories
            .iter()
            .enumerate()
            .filter(|(i, _)| used.contains(i))
            .map(|(_, c)| c.clone())
            .collect();
        let lookup = position_map(&kept);
        let remap: Vec<Option<usize>> = self
            .categories
            .iter()
            .map(|c| lookup.get(c.as_str()).copied())
            .collect();
        for code in &mut self.codes {
            *code = code.and_then(|c| remap[c]);
        }
        self.categories = kept;
    }

    /// Reorder categories; `categories` must be a permutation of the current ones.
    pub fn reorder_categories(&mut self, categories: Vec<String>) -> Result<()> {
        let current: BTreeSet<&String> = self.categories.iter().collect();
        let proposed: BTreeSet<&String> = categories.iter().collect();
        if categories.len() != self.categories.len() || current != proposed {
            return Err(LabelError::InvalidCategories(format!(
                "{categories:?} is not a permutation of {:?}",
                self.categories
            )));
        }
        self.set_categories(categories)
    }

    /// Number of items per category, in category order.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.categories.len()];
        for c in self.codes.iter().flatten() {
            counts[*c] += 1;
        }
        self.categories.iter().cloned().zip(counts).collect()
    }
}

fn position_map(categories: &[String]) -> BTreeMap<&str, usize> {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect()
}

fn check_unique(categories: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for c in categories {
        if !seen.insert(c.as_str()) {
            return Err(LabelError::InvalidCategories(format!(
                "duplicate category `{c}`"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Series – one column of the observation table
// ---------------------------------------------------------------------------

/// Column payload: categorical labels or plain values.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Categorical(Categorical),
    Values(Vec<MetadataValue>),
}

/// A named, indexed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: Option<String>,
    index: Index,
    data: SeriesData,
}

impl Series {
    /// Categorical series with the default range index.
    pub fn categorical(cat: Categorical) -> Self {
        Series {
            name: None,
            index: Index::range(cat.len()),
            data: SeriesData::Categorical(cat),
        }
    }

    /// Categorical series from optional labels (categories sorted).
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Series::categorical(Categorical::from_labels(labels))
    }

    /// Plain (non-categorical) series with the default range index.
    pub fn from_values(values: Vec<MetadataValue>) -> Self {
        Series {
            name: None,
            index: Index::range(values.len()),
            data: SeriesData::Values(values),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the index; its length must match the series length.
    pub fn with_index(mut self, index: Index) -> Result<Self> {
        if index.len() != self.len() {
            return Err(LabelError::LengthMismatch {
                expected: self.len(),
                found: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn data(&self) -> &SeriesData {
        &self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            SeriesData::Categorical(c) => c.len(),
            SeriesData::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.data, SeriesData::Categorical(_))
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Inferred dtype name in the style of pandas' `infer_dtype`.
    pub fn dtype(&self) -> &'static str {
        match &self.data {
            SeriesData::Categorical(_) => "categorical",
            SeriesData::Values(values) => {
                let mut kinds = values.iter().filter(|v| !v.is_null()).map(|v| v.dtype());
                match kinds.next() {
                    None => "empty",
                    Some(first) if kinds.all(|k| k == first) => first,
                    Some(_) => "mixed",
                }
            }
        }
    }

    /// Borrow the categorical payload, failing for plain series.
    pub fn as_categorical(&self) -> Result<&Categorical> {
        match &self.data {
            SeriesData::Categorical(c) => Ok(c),
            SeriesData::Values(_) => Err(LabelError::NotCategorical {
                name: self.display_name(),
                dtype: self.dtype(),
            }),
        }
    }

    /// Convert to a categorical series; missing values stay missing.
    pub fn astype_category(&self) -> Series {
        let data = match &self.data {
            SeriesData::Categorical(c) => c.clone(),
            SeriesData::Values(values) => {
                Categorical::from_labels(values.iter().map(MetadataValue::as_label))
            }
        };
        Series {
            name: self.name.clone(),
            index: self.index.clone(),
            data: SeriesData::Categorical(data),
        }
    }

    /// Replace the payload, keeping name and index.
    pub(crate) fn with_categorical(&self, cat: Categorical) -> Series {
        Series {
            name: self.name.clone(),
            index: self.index.clone(),
            data: SeriesData::Categorical(cat),
        }
    }

    /// Cell `i` as a table value.
    pub fn value(&self, i: usize) -> MetadataValue {
        match &self.data {
            SeriesData::Categorical(c) => c
                .get(i)
                .map(MetadataValue::from)
                .unwrap_or(MetadataValue::Null),
            SeriesData::Values(v) => v.get(i).cloned().unwrap_or(MetadataValue::Null),
        }
    }
}

/// Fails with `IndexMismatch` unless both series share the same index.
pub fn check_aligned(left: &Series, right: &Series) -> Result<()> {
    if left.index() != right.index() {
        return Err(LabelError::IndexMismatch {
            left: left.display_name(),
            right: right.display_name(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ObsTable – the observation table of an annotated-data object
// ---------------------------------------------------------------------------

/// Observation table: aligned named columns over one index.
#[derive(Debug, Clone, PartialEq)]
pub struct ObsTable {
    index: Index,
    /// Ordered list of column names.
    pub column_names: Vec<String>,
    columns: BTreeMap<String, Series>,
}

impl ObsTable {
    pub fn new(index: Index) -> Self {
        ObsTable {
            index,
            column_names: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Number of observations (rows).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .get(name)
            .ok_or_else(|| LabelError::UnknownColumn(name.to_string()))
    }

    /// Insert or replace a column. The series must be aligned to the table.
    pub fn insert(&mut self, name: &str, series: Series) -> Result<()> {
        if series.index() != &self.index {
            return Err(LabelError::IndexMismatch {
                left: "obs".to_string(),
                right: name.to_string(),
            });
        }
        if !self.columns.contains_key(name) {
            self.column_names.push(name.to_string());
        }
        self.columns
            .insert(name.to_string(), series.with_name(name.to_string()));
        Ok(())
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Series)> + '_ {
        self.column_names
            .iter()
            .filter_map(|n| self.columns.get(n).map(|s| (n.as_str(), s)))
    }
}

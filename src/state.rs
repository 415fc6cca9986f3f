use std::collections::BTreeMap;

use crate::color::Colors;
use crate::config::Config;
use crate::data::filter::process_series;
use crate::data::mapping::map_names_and_colors;
use crate::data::merge::{merge_categorical_series, MergeColors};
use crate::data::model::{Categorical, MetadataValue, ObsTable, Series};
use crate::error::Result;

/// Key under which the colors of `column` are stored.
pub fn colors_key(column: &str) -> String {
    format!("{column}_colors")
}

// ---------------------------------------------------------------------------
// Annotation state
// ---------------------------------------------------------------------------

/// An observation table together with per-column color lists.
pub struct AnnotationState {
    /// Observation table.
    pub obs: ObsTable,

    /// `<column>_colors` → one color per category of that column.
    pub colors: BTreeMap<String, Vec<String>>,

    /// Tunables for the helpers.
    pub config: Config,
}

impl AnnotationState {
    pub fn new(obs: ObsTable, colors: BTreeMap<String, Vec<String>>, config: Config) -> Self {
        Self {
            obs,
            colors,
            config,
        }
    }

    /// Colors stored for `column`, if any.
    pub fn colors_of(&self, column: &str) -> Option<&Vec<String>> {
        self.colors.get(&colors_key(column))
    }

    /// Convert column `name` to categorical in place. Plain columns come from
    /// text formats, which carry no dtype.
    pub fn make_categorical(&mut self, name: &str) -> Result<()> {
        let series = self.obs.column(name)?;
        if series.is_categorical() {
            return Ok(());
        }
        log::debug!("Converting column `{name}` to categorical");
        let converted = series.astype_category();
        self.obs.insert(name, converted)
    }

    /// Update column `old` with the non-missing labels of column `new`.
    /// Colors stored for either column take part in the merge.
    pub fn merge_columns(&mut self, old: &str, new: &str) -> Result<()> {
        let mut old_series = self.obs.column(old)?.clone();
        let new_series = self.obs.column(new)?;
        let colors = MergeColors {
            colors_old: self.colors_of(old).cloned().map(Colors::List),
            colors_new: self.colors_of(new).cloned().map(Colors::List),
            color_overwrite: self.config.color_overwrite,
        };

        let merged_colors = merge_categorical_series(&mut old_series, new_series, &colors)?;
        log::info!(
            "Merged `{new}` into `{old}`: {} categories",
            old_series.as_categorical()?.categories().len()
        );
        self.obs.insert(old, old_series)?;
        if let Some(merged_colors) = merged_colors {
            self.colors.insert(colors_key(old), merged_colors);
        }
        Ok(())
    }

    /// Rename the categories of `query` after `reference` and store the result
    /// as column `target`.
    pub fn map_columns(&mut self, reference: &str, query: &str, target: &str) -> Result<()> {
        let reference_series = self.obs.column(reference)?;
        let query_series = self.obs.column(query)?;
        let colors_reference = self.colors_of(reference).cloned();

        let mapped = map_names_and_colors(
            reference_series,
            query_series,
            colors_reference.as_deref(),
            &self.config.map_options(),
        )?;

        // query category → new name, applied per observation
        let query_cat = query_series.as_categorical()?;
        let renamed: Vec<Option<String>> = query_cat
            .codes()
            .iter()
            .map(|c| c.and_then(|c| mapped.names.value(c).as_label()))
            .collect();
        let names_in_order: Vec<String> = (0..mapped.names.len())
            .filter_map(|i| mapped.names.value(i).as_label())
            .collect();
        let series = Series::categorical(Categorical::with_categories(names_in_order, renamed)?)
            .with_index(self.obs.index().clone())?;

        log::info!(
            "Mapped `{query}` onto `{reference}` as `{target}`: {:?}",
            (0..mapped.names.len())
                .map(|i| mapped.names.value(i))
                .collect::<Vec<MetadataValue>>()
        );
        self.obs.insert(target, series)?;
        if let Some(colors) = mapped.colors {
            self.colors.insert(colors_key(target), colors);
        }
        Ok(())
    }

    /// Keep and combine categories of `column` according to `keys`, storing
    /// the result as `target`.
    pub fn restrict_column<S: AsRef<str>>(
        &mut self,
        column: &str,
        keys: Option<&[S]>,
        target: &str,
    ) -> Result<()> {
        let series = self.obs.column(column)?.clone();
        let colors = self.colors_of(column).cloned();
        let processed = process_series(series, keys, colors)?;

        log::info!("Restricted `{column}` into `{target}`");
        self.obs.insert(target, processed.series)?;
        if let Some(colors) = processed.colors {
            self.colors.insert(colors_key(target), colors);
        }
        Ok(())
    }
}

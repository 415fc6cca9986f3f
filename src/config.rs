//! Configuration loading with defaults

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::ColorShift;
use crate::data::mapping::MapOptions;

/// Tunables for the annotation helpers. Every field has a default, so a
/// config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spread used to derive colors for duplicated names.
    pub color_shift: ColorShift,
    /// Entropy above which a mapped category is called unknown.
    pub en_cutoff: Option<f64>,
    /// Name of categories without a confident reference match.
    pub unknown_label: String,
    /// Base color for unknown categories.
    pub unknown_color: String,
    /// When merging, prefer the new series' colors over the old ones.
    pub color_overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        let map = MapOptions::default();
        Self {
            color_shift: map.color_shift,
            en_cutoff: map.en_cutoff,
            unknown_label: map.unknown_label,
            unknown_color: map.unknown_color,
            color_overwrite: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Options for [`crate::data::mapping::map_names_and_colors`].
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            en_cutoff: self.en_cutoff,
            unknown_label: self.unknown_label.clone(),
            unknown_color: self.unknown_color.clone(),
            color_shift: self.color_shift,
        }
    }
}

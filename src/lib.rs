//! # lineage-labels
//!
//! Helpers for the categorical annotations of single-cell observation
//! tables: cell-state labels and the colors they are displayed with.
//!
//! - **[`data::merge`]**: update one categorical column with another
//! - **[`data::mapping`]**: name query categories after the reference categories they overlap most
//! - **[`data::filter`]**: keep and combine categories by comma-joined key groups
//! - **[`color`]**: color parsing, palettes, mean colors and color variations
//! - **[`state`]**: the three transforms applied to named columns of an [`data::model::ObsTable`]

pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use error::{LabelError, Result};

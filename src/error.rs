//! Error types for categorical label operations.

use thiserror::Error;

/// Result type alias for label operations.
pub type Result<T> = std::result::Result<T, LabelError>;

/// Validation failures raised by the series and color helpers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LabelError {
    /// A categorical series was required but plain values were given.
    #[error("Series `{name}` must be categorical, found `{dtype}`")]
    NotCategorical { name: String, dtype: &'static str },

    /// Two series that must be aligned have different indices.
    #[error("Index of `{left}` does not match index of `{right}`")]
    IndexMismatch { left: String, right: String },

    /// A color list does not have one entry per category.
    #[error("Expected {expected} colors, found {found}")]
    ColorCount { expected: usize, found: usize },

    /// A string could not be interpreted as a color.
    #[error("Not all colors are color-like: `{0}`")]
    NotColorLike(String),

    /// A category → color mapping is keyed by something other than the categories.
    #[error("Color mapping keys do not match the categories: {0:?}")]
    ColorKeys(Vec<String>),

    /// Key groups name labels that are not categories of the series.
    #[error("Not all keys are proper categories, check for spelling mistakes: {0:?}")]
    UnknownKeys(Vec<String>),

    /// Two key groups share at least one category.
    #[error("Found overlapping keys: {0:?}")]
    OverlappingKeys(Vec<String>),

    /// A label was assigned that is not one of the declared categories.
    #[error("Label `{0}` is not a category")]
    UnknownCategory(String),

    /// A category list is not a valid permutation / set for the operation.
    #[error("Invalid categories: {0}")]
    InvalidCategories(String),

    /// Lengths that must agree do not.
    #[error("Length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// Asked for a non-positive number of colors.
    #[error("Number of colors must be positive, found {0}")]
    InvalidColorCount(usize),

    /// A table column was requested that does not exist.
    #[error("Column `{0}` not found")]
    UnknownColumn(String),
}

impl LabelError {
    /// Whether this error corresponds to a wrong input *type* rather than a wrong value.
    pub fn is_type_error(&self) -> bool {
        matches!(self, LabelError::NotCategorical { .. })
    }
}

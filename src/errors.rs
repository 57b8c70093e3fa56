//! Custom error types for feature table assembly

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling, normalizing or persisting a feature table
///
/// Every variant is fatal to the current run. The only non-fatal outcome,
/// a directory scan that finds no images, is reported as `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A path that had to exist does not
    #[error("Path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    /// Image bytes could not be decoded
    #[error("Could not read image file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An image could not be encoded or written
    #[error("Could not encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// An embedded thumbnail string is not a base64 encoded image
    #[error("Invalid thumbnail: {0}")]
    InvalidThumbnail(String),

    /// A featurizer failed or returned inconsistent output
    #[error("Featurizer contract violation ({context}): {reason}")]
    FeaturizerContractViolation { context: String, reason: String },

    /// The output directory already contains images
    #[error("Images directory is not empty! ({})", dir.display())]
    PrecautionaryRefusal { dir: PathBuf },

    /// A filename column value is not an image inside the images directory
    #[error("{file} is not in the images directory ({})", dir.display())]
    MissingReferencedFile { file: String, dir: PathBuf },

    /// Labels of a table and a labelled image disagree
    #[error("Labels in table don't match labels in the label image: {reason}")]
    LabelMismatch { reason: String },

    /// A column required by the current mode is absent
    #[error("Missing required column `{column}`: {reason}")]
    MissingRequiredColumn { column: String, reason: String },

    /// A cell does not hold the kind of value its column requires
    #[error("Column `{column}` row {row}: expected {expected}")]
    InvalidColumnValue {
        column: String,
        row: usize,
        expected: String,
    },

    /// Two arrays that must be aligned pixel for pixel have different shapes
    #[error("Dimension mismatch: {what} is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        what: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A configuration value is out of range or unparsable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure while reading or writing delimited text
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for feature table operations
pub type FeatureResult<T> = Result<T, FeatureError>;

impl FeatureError {
    /// Shorthand for a missing column error
    pub(crate) fn missing_column(column: &str, reason: impl Into<String>) -> Self {
        FeatureError::MissingRequiredColumn {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

//! In-memory row table
//!
//! Rows are ordered column-to-value records. A table is created fresh per
//! run by a row source, reshaped by the normalizer and then written out.

mod record;
mod row_table;
mod value;

pub use record::{MergePolicy, Record};
pub use row_table::RowTable;
pub use value::Value;

/// Path of the persisted full-resolution image of a row
pub const IMAGE_FILE_COLUMN: &str = "image_file";

/// Base64 encoded PNG preview of a row
pub const THUMBNAIL_COLUMN: &str = "thumbnail";

/// Row position assigned during normalization
pub const ID_COLUMN: &str = "id";

/// Object label of labelled-image rows
pub const LABEL_COLUMN: &str = "label";

/// Per-object crop of labelled-image rows
pub const CROP_COLUMN: &str = "image_intensity";

/// Columns owned by the pipeline itself
pub const AUXILIARY_COLUMNS: [&str; 3] = [IMAGE_FILE_COLUMN, THUMBNAIL_COLUMN, ID_COLUMN];

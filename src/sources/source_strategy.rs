//! Row source strategy definitions
//!
//! Every way of turning inputs into a feature table is a `RowSource`. The
//! strategies differ in their preconditions and in how they find the image
//! of each row; they share the post-step that persists images and attaches
//! the `image_file` and `thumbnail` columns.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::debug;

use crate::errors::FeatureResult;
use crate::imaging::ThumbnailEncoder;
use crate::io::image_access::{save_png, sequential_file_name};
use crate::io::FEATURES_FILE_NAME;
use crate::table::{Record, RowTable, Value, IMAGE_FILE_COLUMN, THUMBNAIL_COLUMN};

/// What the images directory may contain before a run starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryPolicy {
    /// Existing images are allowed (and may be the input)
    AllowExisting,
    /// Existing images are refused so earlier results are never overwritten
    RequireEmpty,
}

/// Shared state handed to a row source while it resolves rows
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Directory holding (or receiving) the row images
    pub images_path: PathBuf,
    /// Encoder for the `thumbnail` column
    pub encoder: ThumbnailEncoder,
}

impl SourceContext {
    pub fn new<P: Into<PathBuf>>(images_path: P, encoder: ThumbnailEncoder) -> Self {
        SourceContext {
            images_path: images_path.into(),
            encoder,
        }
    }

    /// Set `image_file` and `thumbnail` on a row
    pub fn attach_auxiliary(&self, row: &mut Record, image_file: &Path, image: &DynamicImage) -> FeatureResult<()> {
        row.insert(IMAGE_FILE_COLUMN, path_value(image_file));
        row.insert(THUMBNAIL_COLUMN, self.encoder.encode(image)?);
        Ok(())
    }

    /// Save the `index`-th row image as `NNN.png` and attach its auxiliary columns
    pub fn persist_and_attach(&self, row: &mut Record, index: usize, image: &DynamicImage) -> FeatureResult<PathBuf> {
        let image_file = save_png(image, &self.images_path.join(sequential_file_name(index)))?;
        debug!("Row {} image saved to {}", index, image_file.display());
        self.attach_auxiliary(row, &image_file, image)?;
        Ok(image_file)
    }
}

/// Strategy producing the unnormalized rows of one run
pub trait RowSource {
    /// Short description used in logs and progress bars
    fn name(&self) -> &str;

    /// Emptiness requirement on the images directory
    fn directory_policy(&self) -> DirectoryPolicy;

    /// Name of the table file written into the images directory
    fn output_file_name(&self) -> &str {
        FEATURES_FILE_NAME
    }

    /// Input checks that must pass before anything touches the disk
    fn validate(&self) -> FeatureResult<()> {
        Ok(())
    }

    /// Produce the rows
    ///
    /// # Returns
    /// `Ok(None)` when there is nothing to process (no file must be written),
    /// otherwise a table whose rows all carry `image_file` and `thumbnail`
    fn resolve(&mut self, ctx: &SourceContext) -> FeatureResult<Option<RowTable>>;
}

/// Text cell holding a path
pub(crate) fn path_value(path: &Path) -> Value {
    Value::Text(path.display().to_string())
}

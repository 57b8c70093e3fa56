use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::info;

use crate::config::PipelineConfig;
use crate::errors::FeatureResult;
use crate::featurizer::{Featurizer, Params};
use crate::imaging::{LabelImage, RegionProperty, ThumbnailEncoder};
use crate::io::{setup_images_path, write_table};
use crate::normalize::ColumnNormalizer;
use crate::sources::{
    DatasetSource, DirectoryPolicy, DirectoryScanSource, ImagesTableSource, LabelImageSource, LabelTableSource,
    RowSource, SourceContext,
};
use crate::table::RowTable;

/// Main interface to the FeatureScope library
///
/// Every entry point runs the same pipeline: check the inputs, prepare the
/// images directory, resolve the rows, normalize the numeric columns and
/// write the table next to the images.
pub struct FeatureScope {
    config: PipelineConfig,
}

impl FeatureScope {
    /// Create a new FeatureScope instance
    ///
    /// # Arguments
    /// * `config` - Thumbnail size and normalization margin
    pub fn new(config: PipelineConfig) -> Self {
        FeatureScope { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run any row source through the pipeline
    ///
    /// # Arguments
    /// * `source` - Strategy producing the rows
    /// * `images_dir` - Directory holding (or receiving) the row images
    ///
    /// # Returns
    /// Absolute path of the written table, or `None` when the source had
    /// nothing to process
    pub fn run(&self, source: &mut dyn RowSource, images_dir: &Path) -> FeatureResult<Option<PathBuf>> {
        self.config.validate()?;
        source.validate()?;

        let ensure_empty = source.directory_policy() == DirectoryPolicy::RequireEmpty;
        let images_path = setup_images_path(images_dir, ensure_empty)?;
        let ctx = SourceContext::new(images_path, ThumbnailEncoder::new(self.config.thumbnail_size));

        info!("{}: {}", source.name(), ctx.images_path.display());
        let table = match source.resolve(&ctx)? {
            Some(table) => table,
            None => return Ok(None),
        };

        let normalized = ColumnNormalizer::new(self.config.margin).normalize(&table)?;
        let csv_path = write_table(&normalized, &ctx.images_path, source.output_file_name())?;
        Ok(Some(csv_path))
    }

    /// Apply a featurizer to every image of a directory
    ///
    /// # Arguments
    /// * `featurizer` - Computes the features of one image
    /// * `images_dir` - Directory of images, scanned without recursion
    /// * `params` - Extra named parameters passed to every call
    ///
    /// # Returns
    /// Path of `features.csv`, or `None` when the directory holds no image
    pub fn apply_to_images(
        &self,
        featurizer: &dyn Featurizer,
        images_dir: &Path,
        params: Params,
    ) -> FeatureResult<Option<PathBuf>> {
        self.run(&mut DirectoryScanSource::new(featurizer, params), images_dir)
    }

    /// Measure the objects of a label image and save one crop per object
    ///
    /// # Arguments
    /// * `labels` - The label image
    /// * `images_dir` - Output directory; must be absent or empty
    /// * `intensity` - Optional intensity image cropped under each object
    /// * `properties` - Region properties to measure
    /// * `featurizer` - Optional featurizer applied to every crop, with its parameters
    pub fn apply_to_label_image(
        &self,
        labels: &LabelImage,
        images_dir: &Path,
        intensity: Option<&DynamicImage>,
        properties: &[RegionProperty],
        featurizer: Option<(&dyn Featurizer, Params)>,
    ) -> FeatureResult<Option<PathBuf>> {
        let mut source = LabelImageSource::new(labels, intensity).with_properties(properties);
        if let Some((featurizer, params)) = featurizer {
            source = source.with_featurizer(featurizer, params);
        }
        self.run(&mut source, images_dir)
    }

    /// Pair the rows of an existing table with images
    ///
    /// # Arguments
    /// * `table` - The feature table
    /// * `images_dir` - Directory of the referenced images, or an empty one
    ///   receiving the images of `image_column`
    /// * `filename_column` - Column of file names inside `images_dir`
    /// * `image_column` - Column of in-memory images
    pub fn apply_from_images_table(
        &self,
        table: RowTable,
        images_dir: &Path,
        filename_column: Option<&str>,
        image_column: Option<&str>,
    ) -> FeatureResult<Option<PathBuf>> {
        self.run(&mut ImagesTableSource::new(table, filename_column, image_column), images_dir)
    }

    /// Pair the rows of an existing table with the objects of a label image
    ///
    /// The table needs a `label` column covering exactly the labels of the image.
    pub fn apply_from_label_image_table(
        &self,
        table: RowTable,
        images_dir: &Path,
        labels: &LabelImage,
        intensity: Option<&DynamicImage>,
    ) -> FeatureResult<Option<PathBuf>> {
        self.run(&mut LabelTableSource::new(table, labels, intensity), images_dir)
    }

    /// Save a table of `image_intensity` crops as `dataset.csv`
    pub fn apply_dataset(&self, table: RowTable, images_dir: &Path) -> FeatureResult<Option<PathBuf>> {
        self.run(&mut DatasetSource::new(table), images_dir)
    }
}

impl Default for FeatureScope {
    fn default() -> Self {
        FeatureScope::new(PipelineConfig::default())
    }
}

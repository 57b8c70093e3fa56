//! Directory of loose images + user featurizer

use std::fs;

use log::{debug, info};

use crate::errors::FeatureResult;
use crate::featurizer::{Featurizer, KeySetGuard, Params};
use crate::io::{list_image_files, load_image};
use crate::table::{MergePolicy, Record, RowTable};
use crate::utils::progress::ProgressTracker;

use super::source_strategy::{DirectoryPolicy, RowSource, SourceContext};

/// Runs a featurizer on every recognized image of the images directory
pub struct DirectoryScanSource<'a> {
    featurizer: &'a dyn Featurizer,
    params: Params,
}

impl<'a> DirectoryScanSource<'a> {
    /// # Arguments
    /// * `featurizer` - Featurizer applied to each image
    /// * `params` - Extra named parameters forwarded to every call
    pub fn new(featurizer: &'a dyn Featurizer, params: Params) -> Self {
        DirectoryScanSource { featurizer, params }
    }
}

impl<'a> RowSource for DirectoryScanSource<'a> {
    fn name(&self) -> &str {
        "Applying featurizer"
    }

    fn directory_policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::AllowExisting
    }

    fn resolve(&mut self, ctx: &SourceContext) -> FeatureResult<Option<RowTable>> {
        let image_files = list_image_files(&ctx.images_path)?;
        if image_files.is_empty() {
            info!("No image files in this directory: {}", ctx.images_path.display());
            return Ok(None);
        }

        let progress = ProgressTracker::new(image_files.len() as u64, self.name());
        let mut guard = KeySetGuard::new();
        let mut table = RowTable::new();

        for image_file in &image_files {
            let image = load_image(image_file)?;
            let context = image_file.display().to_string();
            let features = guard.featurize(self.featurizer, &image, &self.params, &context)?;
            debug!("{}: {} features", context, features.len());

            let mut row = Record::new();
            row.merge(features, MergePolicy::PreferIncoming);
            ctx.attach_auxiliary(&mut row, &fs::canonicalize(image_file)?, &image)?;
            table.push_row(row);
            progress.increment(1);
        }
        progress.finish();

        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FeatureError;
    use crate::imaging::ThumbnailEncoder;
    use crate::table::Value;
    use image::{DynamicImage, GrayImage, Luma};

    fn mean(image: &DynamicImage, _: &Params) -> Result<Record, String> {
        let grey = image.to_luma8();
        let sum: f64 = grey.pixels().map(|p| p[0] as f64).sum();
        Ok(Record::new().with("mean", sum / grey.len() as f64))
    }

    #[test]
    fn test_rows_carry_features_and_auxiliary_columns() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..2u8 {
            GrayImage::from_pixel(8, 8, Luma([i * 100])).save(dir.path().join(format!("img_{}.png", i))).unwrap();
        }
        let ctx = SourceContext::new(dir.path(), ThumbnailEncoder::new(16));

        let table = DirectoryScanSource::new(&mean, Params::new()).resolve(&ctx).unwrap().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["mean", "image_file", "thumbnail"]);
        let mut means: Vec<f64> = table.column("mean").map(|v| v.and_then(Value::as_f64).unwrap()).collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(means, vec![0.0, 100.0]);
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "no images").unwrap();
        let ctx = SourceContext::new(dir.path(), ThumbnailEncoder::new(16));

        assert!(DirectoryScanSource::new(&mean, Params::new()).resolve(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_undecodable_image_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"garbage").unwrap();
        let ctx = SourceContext::new(dir.path(), ThumbnailEncoder::new(16));

        let result = DirectoryScanSource::new(&mean, Params::new()).resolve(&ctx);
        assert!(matches!(result, Err(FeatureError::Decode { .. })));
    }
}

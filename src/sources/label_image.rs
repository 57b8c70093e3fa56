//! Labelled image + optional region featurizer

use image::DynamicImage;
use log::debug;

use crate::errors::{FeatureError, FeatureResult};
use crate::featurizer::{Featurizer, KeySetGuard, Params};
use crate::imaging::{measure_regions, LabelImage, RegionProperty};
use crate::table::{MergePolicy, RowTable, Value, CROP_COLUMN, LABEL_COLUMN};
use crate::utils::progress::ProgressTracker;

use super::source_strategy::{DirectoryPolicy, RowSource, SourceContext};

/// One row per object of a label image
///
/// Rows start from the region measurement (label, requested properties,
/// crop). When a featurizer is set it runs on each crop and its output is
/// merged into the row, overriding measured columns of the same name.
pub struct LabelImageSource<'a> {
    labels: &'a LabelImage,
    intensity: Option<&'a DynamicImage>,
    properties: Vec<RegionProperty>,
    featurizer: Option<&'a dyn Featurizer>,
    params: Params,
}

impl<'a> LabelImageSource<'a> {
    /// # Arguments
    /// * `labels` - The label image
    /// * `intensity` - Optional intensity image; the binary object mask is
    ///   cropped instead when absent
    pub fn new(labels: &'a LabelImage, intensity: Option<&'a DynamicImage>) -> Self {
        LabelImageSource {
            labels,
            intensity,
            properties: Vec::new(),
            featurizer: None,
            params: Params::new(),
        }
    }

    /// Additional region properties to measure
    pub fn with_properties(mut self, properties: &[RegionProperty]) -> Self {
        self.properties = properties.to_vec();
        self
    }

    /// Featurizer applied to every object crop
    pub fn with_featurizer(mut self, featurizer: &'a dyn Featurizer, params: Params) -> Self {
        self.featurizer = Some(featurizer);
        self.params = params;
        self
    }
}

impl<'a> RowSource for LabelImageSource<'a> {
    fn name(&self) -> &str {
        "Measuring regions"
    }

    fn directory_policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::RequireEmpty
    }

    fn validate(&self) -> FeatureResult<()> {
        if let Some(image) = self.intensity {
            let actual = (image.width(), image.height());
            if actual != self.labels.dimensions() {
                return Err(FeatureError::DimensionMismatch {
                    what: "intensity image".to_string(),
                    expected: self.labels.dimensions(),
                    actual,
                });
            }
        }
        Ok(())
    }

    fn resolve(&mut self, ctx: &SourceContext) -> FeatureResult<Option<RowTable>> {
        let mut table = measure_regions(self.labels, self.intensity, &self.properties)?;
        let progress = ProgressTracker::new(table.len() as u64, self.name());
        let mut guard = KeySetGuard::new();

        for (index, row) in table.rows_mut().iter_mut().enumerate() {
            let crop = row
                .get(CROP_COLUMN)
                .and_then(Value::as_image)
                .cloned()
                .ok_or_else(|| FeatureError::missing_column(CROP_COLUMN, "region measurement produced no crop"))?;

            if let Some(featurizer) = self.featurizer {
                let context = format!("{} {}", LABEL_COLUMN, row.get(LABEL_COLUMN).map(|v| v.to_string()).unwrap_or_default());
                let features = guard.featurize(featurizer, &crop, &self.params, &context)?;
                row.merge(features, MergePolicy::PreferIncoming);
            }

            let image_file = ctx.persist_and_attach(row, index, &crop)?;
            debug!("Object {} -> {}", index, image_file.display());
            progress.increment(1);
        }
        progress.finish();

        let rows = table.into_rows();
        Ok(Some(RowTable::from_rows(rows)))
    }
}

//! Existing feature table matched to the objects of a label image

use std::collections::{BTreeMap, BTreeSet};

use image::DynamicImage;
use log::{debug, info};

use crate::errors::{FeatureError, FeatureResult};
use crate::imaging::{measure_regions, LabelImage};
use crate::table::{RowTable, Value, CROP_COLUMN, LABEL_COLUMN};
use crate::utils::progress::ProgressTracker;

use super::source_strategy::{DirectoryPolicy, RowSource, SourceContext};

/// A user table with a `label` column naming the object of each row
///
/// Rows keep the table order. Without an `image_intensity` column the crops
/// are measured from the label image and joined on `label`.
pub struct LabelTableSource<'a> {
    table: RowTable,
    labels: &'a LabelImage,
    intensity: Option<&'a DynamicImage>,
}

impl<'a> LabelTableSource<'a> {
    pub fn new(table: RowTable, labels: &'a LabelImage, intensity: Option<&'a DynamicImage>) -> Self {
        LabelTableSource { table, labels, intensity }
    }

    /// Labels of the table rows, in row order
    fn row_labels(&self) -> FeatureResult<Vec<u32>> {
        self.table
            .column(LABEL_COLUMN)
            .enumerate()
            .map(|(row, cell)| {
                cell.and_then(Value::as_i64)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| FeatureError::LabelMismatch {
                        reason: format!("row {} has no integer label", row),
                    })
            })
            .collect()
    }
}

impl<'a> RowSource for LabelTableSource<'a> {
    fn name(&self) -> &str {
        "Matching table rows to objects"
    }

    fn directory_policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::RequireEmpty
    }

    fn validate(&self) -> FeatureResult<()> {
        if !self.table.has_column(LABEL_COLUMN) {
            return Err(FeatureError::missing_column(LABEL_COLUMN, "the table must name the object of each row"));
        }

        let image_labels = self.labels.unique_labels();
        let row_labels = self.row_labels()?;
        let table_labels: BTreeSet<u32> = row_labels.iter().copied().filter(|&v| v != 0).collect();

        if table_labels.len() != image_labels.len() {
            return Err(FeatureError::LabelMismatch {
                reason: format!(
                    "{} distinct labels in the table, {} in the label image",
                    table_labels.len(),
                    image_labels.len()
                ),
            });
        }
        if let Some(unknown) = row_labels.iter().find(|&&v| !image_labels.contains(&v)) {
            return Err(FeatureError::LabelMismatch {
                reason: format!("label {} is not an object of the label image", unknown),
            });
        }
        let mut seen = BTreeSet::new();
        if let Some(repeated) = row_labels.iter().find(|&&v| !seen.insert(v)) {
            return Err(FeatureError::LabelMismatch {
                reason: format!("label {} names more than one row", repeated),
            });
        }

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
        if !self.table.has_column(CROP_COLUMN) {
            info!("No {} column in the table, measuring crops from the label image", CROP_COLUMN);
            let mut crops: BTreeMap<i64, Value> = BTreeMap::new();
            for mut row in measure_regions(self.labels, self.intensity, &[])?.into_rows() {
                if let (Some(label), Some(crop)) = (row.get(LABEL_COLUMN).and_then(Value::as_i64), row.remove(CROP_COLUMN)) {
                    crops.insert(label, crop);
                }
            }

            let mut values = Vec::with_capacity(self.table.len());
            for (row, cell) in self.table.column(LABEL_COLUMN).enumerate() {
                let crop = cell
                    .and_then(Value::as_i64)
                    .and_then(|label| crops.get(&label))
                    .cloned()
                    .ok_or_else(|| FeatureError::LabelMismatch {
                        reason: format!("row {} has no matching object", row),
                    })?;
                values.push(crop);
            }
            self.table.set_column(CROP_COLUMN, values)?;
        }

        let mut table = std::mem::take(&mut self.table);
        let progress = ProgressTracker::new(table.len() as u64, self.name());
        for (index, row) in table.rows_mut().iter_mut().enumerate() {
            let crop = row
                .get(CROP_COLUMN)
                .and_then(Value::as_image)
                .cloned()
                .ok_or_else(|| FeatureError::InvalidColumnValue {
                    column: CROP_COLUMN.to_string(),
                    row: index,
                    expected: "an image array".to_string(),
                })?;
            let image_file = ctx.persist_and_attach(row, index, &crop)?;
            debug!("Object row {} -> {}", index, image_file.display());
            progress.increment(1);
        }
        progress.finish();

        Ok(Some(RowTable::from_rows(table.into_rows())))
    }
}

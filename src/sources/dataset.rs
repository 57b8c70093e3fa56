//! Table of in-memory crops written out as a dataset

use crate::errors::{FeatureError, FeatureResult};
use crate::io::DATASET_FILE_NAME;
use crate::table::{RowTable, Value, CROP_COLUMN};
use crate::utils::progress::ProgressTracker;

use super::source_strategy::{DirectoryPolicy, RowSource, SourceContext};

/// Rows carrying their own `image_intensity` crop
///
/// Every crop is saved as `NNN.png` whatever the directory already holds,
/// and the table lands in `dataset.csv`.
pub struct DatasetSource {
    table: RowTable,
}

impl DatasetSource {
    pub fn new(table: RowTable) -> Self {
        DatasetSource { table }
    }
}

impl RowSource for DatasetSource {
    fn name(&self) -> &str {
        "Saving dataset crops"
    }

    fn directory_policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::AllowExisting
    }

    fn output_file_name(&self) -> &str {
        DATASET_FILE_NAME
    }

    fn validate(&self) -> FeatureResult<()> {
        if !self.table.has_column(CROP_COLUMN) {
            return Err(FeatureError::missing_column(CROP_COLUMN, "column not found in table"));
        }
        Ok(())
    }

    fn resolve(&mut self, ctx: &SourceContext) -> FeatureResult<Option<RowTable>> {
        let mut table = std::mem::take(&mut self.table);
        let progress = ProgressTracker::new(table.len() as u64, self.name());

        for (index, row) in table.rows_mut().iter_mut().enumerate() {
            let crop = match row.get(CROP_COLUMN).and_then(Value::as_image) {
                Some(crop) => crop.clone(),
                None => {
                    return Err(FeatureError::InvalidColumnValue {
                        column: CROP_COLUMN.to_string(),
                        row: index,
                        expected: "an image array".to_string(),
                    })
                }
            };
            ctx.persist_and_attach(row, index, &crop)?;
            progress.increment(1);
        }
        progress.finish();

        Ok(Some(RowTable::from_rows(table.into_rows())))
    }
}

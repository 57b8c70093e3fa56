//! Flat-file persistence of row tables
//!
//! Tables are written as comma separated values with the row index as the
//! first, unnamed column, the same layout a dataframe library produces.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::info;

use crate::errors::{FeatureError, FeatureResult};
use crate::table::{Record, RowTable, Value};

/// Output file written by the regular pipeline entry points
pub const FEATURES_FILE_NAME: &str = "features.csv";

/// Output file written by the simplified dataset entry point
pub const DATASET_FILE_NAME: &str = "dataset.csv";

/// Write a table into `dir/file_name` and return the absolute file path
///
/// Missing cells are written empty. Image cells cannot be represented in
/// a flat file and are rejected.
pub fn write_table(table: &RowTable, dir: &Path, file_name: &str) -> FeatureResult<PathBuf> {
    let csv_path = dir.join(file_name);
    let mut writer = csv::Writer::from_writer(File::create(&csv_path)?);

    let mut header = vec![String::new()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header)?;

    for (index, row) in table.rows().iter().enumerate() {
        let mut cells = Vec::with_capacity(header.len());
        cells.push(index.to_string());
        for column in table.columns() {
            let cell = match row.get(column) {
                None => String::new(),
                Some(Value::Image(_)) => {
                    return Err(FeatureError::InvalidColumnValue {
                        column: column.clone(),
                        row: index,
                        expected: "a value representable as text, found an image".to_string(),
                    })
                }
                Some(value) => value.to_string(),
            };
            cells.push(cell);
        }
        writer.write_record(&cells)?;
    }
    writer.flush()?;

    let csv_path = fs::canonicalize(&csv_path)?;
    info!("Saved: {}", csv_path.display());
    Ok(csv_path)
}

/// Read a table written by [`write_table`] or any CSV with a header row
///
/// A leading unnamed column is treated as the row index and dropped. Cell
/// types are inferred per cell: integers, then floats, then text. Empty
/// cells are left out of their row.
pub fn read_table<P: AsRef<Path>>(path: P) -> FeatureResult<RowTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FeatureError::NotFound { path: path.to_path_buf() });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let skip_index = headers.first().map_or(false, |h| h.is_empty());

    let mut table = RowTable::new();
    for result in reader.records() {
        let record = result?;
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .skip(if skip_index { 1 } else { 0 })
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name.clone(), Value::parse(cell)))
            .collect();
        table.push_row(row);
    }

    Ok(table)
}

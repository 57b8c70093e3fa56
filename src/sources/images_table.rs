//! Existing feature table matched to images
//!
//! Rows are matched to images either by file name (when the images
//! directory already holds images) or through an in-memory image column
//! whose arrays are saved into an empty images directory.

use std::fs;
use std::path::PathBuf;

use image::DynamicImage;
use log::{info, warn};

use crate::errors::{FeatureError, FeatureResult};
use crate::io::{list_image_files, load_image};
use crate::table::{RowTable, Value};
use crate::utils::progress::ProgressTracker;

use super::source_strategy::{DirectoryPolicy, RowSource, SourceContext};

/// A user table whose rows are paired with images
pub struct ImagesTableSource {
    table: RowTable,
    filename_column: Option<String>,
    image_column: Option<String>,
}

impl ImagesTableSource {
    /// # Arguments
    /// * `table` - The feature table
    /// * `filename_column` - Column of file names inside the images directory
    /// * `image_column` - Column of in-memory images to save
    pub fn new(table: RowTable, filename_column: Option<&str>, image_column: Option<&str>) -> Self {
        ImagesTableSource {
            table,
            filename_column: filename_column.map(str::to_string),
            image_column: image_column.map(str::to_string),
        }
    }

    /// Resolve every file name against the images already on disk
    fn match_files(&self, ctx: &SourceContext, column: &str, image_files: &[PathBuf]) -> FeatureResult<Vec<PathBuf>> {
        if !self.table.has_column(column) {
            return Err(FeatureError::missing_column(column, "filename column not found in table"));
        }

        let mut matched = Vec::with_capacity(self.table.len());
        for (row, cell) in self.table.column(column).enumerate() {
            let file_name = match cell {
                Some(Value::Text(name)) => name.clone(),
                Some(value @ (Value::Integer(_) | Value::Float(_))) => value.to_string(),
                _ => {
                    return Err(FeatureError::InvalidColumnValue {
                        column: column.to_string(),
                        row,
                        expected: "a file name".to_string(),
                    })
                }
            };
            let file_path = ctx.images_path.join(&file_name);
            if !image_files.contains(&file_path) {
                return Err(FeatureError::MissingReferencedFile {
                    file: file_name,
                    dir: ctx.images_path.clone(),
                });
            }
            matched.push(file_path);
        }
        Ok(matched)
    }

    /// Collect the arrays of the image column
    fn collect_images(&self, column: &str) -> FeatureResult<Vec<DynamicImage>> {
        if !self.table.has_column(column) {
            return Err(FeatureError::missing_column(column, "image column not found in table"));
        }
        self.table
            .column(column)
            .enumerate()
            .map(|(row, cell)| {
                cell.and_then(Value::as_image).cloned().ok_or_else(|| FeatureError::InvalidColumnValue {
                    column: column.to_string(),
                    row,
                    expected: "an image array".to_string(),
                })
            })
            .collect()
    }
}

impl RowSource for ImagesTableSource {
    fn name(&self) -> &str {
        "Matching table rows to images"
    }

    fn directory_policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::AllowExisting
    }

    fn resolve(&mut self, ctx: &SourceContext) -> FeatureResult<Option<RowTable>> {
        let image_files = list_image_files(&ctx.images_path)?;

        let table = if !image_files.is_empty() {
            info!("The images directory is not empty. Its images are matched with the filename column.");
            let column = self.filename_column.as_deref().ok_or_else(|| {
                FeatureError::missing_column(
                    "filename_column",
                    format!("a filename column is needed to match the images in {}", ctx.images_path.display()),
                )
            })?;
            if self.image_column.is_some() {
                warn!("The image column is ignored because a filename column was passed.");
            }

            let matched = self.match_files(ctx, column, &image_files)?;
            let mut table = std::mem::take(&mut self.table);
            let progress = ProgressTracker::new(table.len() as u64, "Matching table rows to images");
            for (row, image_file) in table.rows_mut().iter_mut().zip(&matched) {
                let image = load_image(image_file)?;
                ctx.attach_auxiliary(row, &fs::canonicalize(image_file)?, &image)?;
                progress.increment(1);
            }
            progress.finish();
            table
        } else {
            info!("The images directory is empty. The images of the image column are saved in it.");
            let column = self.image_column.as_deref().ok_or_else(|| {
                FeatureError::missing_column(
                    "image_column",
                    format!("an image column is needed to save images into {}", ctx.images_path.display()),
                )
            })?;
            if self.filename_column.is_some() {
                warn!("The filename column is ignored because an image column was passed.");
            }

            let images = self.collect_images(column)?;
            let mut table = std::mem::take(&mut self.table);
            let progress = ProgressTracker::new(table.len() as u64, "Saving table images");
            for (index, (row, image)) in table.rows_mut().iter_mut().zip(&images).enumerate() {
                ctx.persist_and_attach(row, index, image)?;
                progress.increment(1);
            }
            progress.finish();
            table
        };

        Ok(Some(RowTable::from_rows(table.into_rows())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ThumbnailEncoder;
    use crate::table::Record;
    use image::GrayImage;

    fn ctx(dir: &std::path::Path) -> SourceContext {
        SourceContext::new(dir, ThumbnailEncoder::new(8))
    }

    #[test]
    fn test_matches_file_names() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        GrayImage::new(4, 2).save(dir.path().join("b.png")).unwrap();
        let table = RowTable::from_rows(vec![
            Record::new().with("file", "b.png").with("score", 1.0),
            Record::new().with("file", "a.png").with("score", 2.0),
        ]);

        let out = ImagesTableSource::new(table, Some("file"), None).resolve(&ctx(dir.path())).unwrap().unwrap();
        let files: Vec<String> = out.column("image_file").map(|v| v.unwrap().to_string()).collect();
        assert!(files[0].ends_with("b.png"));
        assert!(files[1].ends_with("a.png"));
        assert!(out.has_column("thumbnail"));
    }

    #[test]
    fn test_unknown_file_name_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        let table = RowTable::from_rows(vec![Record::new().with("file", "zzz.png")]);

        let result = ImagesTableSource::new(table, Some("file"), None).resolve(&ctx(dir.path()));
        match result {
            Err(FeatureError::MissingReferencedFile { file, .. }) => assert_eq!(file, "zzz.png"),
            other => panic!("unexpected result: {:?}", other.map(|t| t.map(|t| t.len()))),
        }
    }

    #[test]
    fn test_populated_directory_needs_filename_column() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        let table = RowTable::from_rows(vec![Record::new().with("x", 1)]);

        let result = ImagesTableSource::new(table, None, Some("pixels")).resolve(&ctx(dir.path()));
        assert!(matches!(result, Err(FeatureError::MissingRequiredColumn { .. })));
    }

    #[test]
    fn test_empty_directory_saves_image_column() {
        let dir = tempfile::tempdir().unwrap();
        let table = RowTable::from_rows(vec![
            Record::new().with("pixels", DynamicImage::new_luma8(3, 3)).with("x", 1),
            Record::new().with("pixels", DynamicImage::new_rgb8(5, 2)).with("x", 2),
        ]);

        let out = ImagesTableSource::new(table, Some("ignored"), Some("pixels"))
            .resolve(&ctx(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(dir.path().join("000.png").exists());
        assert!(dir.path().join("001.png").exists());
    }

    #[test]
    fn test_empty_directory_needs_image_column() {
        let dir = tempfile::tempdir().unwrap();
        let table = RowTable::from_rows(vec![Record::new().with("file", "a.png")]);

        let result = ImagesTableSource::new(table, Some("file"), None).resolve(&ctx(dir.path()));
        assert!(matches!(result, Err(FeatureError::MissingRequiredColumn { .. })));
        assert!(!dir.path().join("000.png").exists());
    }
}

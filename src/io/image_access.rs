//! Image file access
//!
//! Opening and decoding image files, enumerating the recognized images of
//! a directory and preparing output directories.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use log::{debug, info};

use crate::errors::{FeatureError, FeatureResult};

/// File extensions recognized when scanning a directory
///
/// Matching is exact: `PNG` is not the same as `png`.
pub const VALID_IMAGE_FORMATS: [&str; 5] = ["tif", "tiff", "png", "jpeg", "jpg"];

/// Whether a path carries one of the recognized image extensions
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .map_or(false, |ext| VALID_IMAGE_FORMATS.contains(&ext))
}

/// Open and decode an image file
///
/// # Arguments
/// * `path` - Path to the image file
///
/// # Returns
/// The decoded image, `NotFound` if the path does not exist or `Decode`
/// if the file cannot be read as an image
pub fn load_image<P: AsRef<Path>>(path: P) -> FeatureResult<DynamicImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FeatureError::NotFound { path: path.to_path_buf() });
    }

    let decode_err = |source: image::ImageError| FeatureError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(decode_err)?;

    debug!("Loaded {} ({}x{}, {:?})", path.display(), image.width(), image.height(), image.color());
    Ok(image)
}

/// List the recognized image files directly inside a directory
///
/// Files are returned in the order the directory listing yields them;
/// subdirectories are not visited.
pub fn list_image_files<P: AsRef<Path>>(dir: P) -> FeatureResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(FeatureError::NotFound { path: dir.to_path_buf() });
    }

    let mut image_files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_image_extension(&path) {
            image_files.push(path);
        }
    }

    debug!("Found {} image files in {}", image_files.len(), dir.display());
    Ok(image_files)
}

/// Make sure the images directory exists, creating it when absent
///
/// # Arguments
/// * `dir` - The images directory
/// * `ensure_empty` - Refuse to continue if the directory already holds images
///
/// # Returns
/// The directory path, or `PrecautionaryRefusal` when `ensure_empty` is set
/// and recognized images are present
pub fn setup_images_path<P: AsRef<Path>>(dir: P, ensure_empty: bool) -> FeatureResult<PathBuf> {
    let images_path = dir.as_ref().to_path_buf();
    if !images_path.exists() {
        fs::create_dir_all(&images_path)?;
        info!("Created: {}", images_path.display());
    }

    if ensure_empty && !list_image_files(&images_path)?.is_empty() {
        return Err(FeatureError::PrecautionaryRefusal { dir: images_path });
    }

    Ok(images_path)
}

/// File name of the `index`-th image persisted by the pipeline
pub fn sequential_file_name(index: usize) -> String {
    format!("{:03}.png", index)
}

/// Save an image as PNG and return its absolute path
///
/// Images whose pixel type PNG cannot hold (32-bit float) are converted
/// to 16-bit RGBA first.
pub fn save_png(image: &DynamicImage, path: &Path) -> FeatureResult<PathBuf> {
    match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba16(image.to_rgba16()).save_with_format(path, image::ImageFormat::Png)?
        }
        _ => image.save_with_format(path, image::ImageFormat::Png)?,
    }
    debug!("Saved: {}", path.display());
    Ok(fs::canonicalize(path)?)
}

//! Labelled segmentation arrays
//!
//! A label image assigns each pixel an integer: 0 is background and every
//! positive value identifies one object. Objects are addressed by value
//! only, so pixels sharing a label form one object even when they are not
//! connected.

use std::collections::BTreeSet;

use image::{DynamicImage, GrayImage, Luma};

use crate::errors::{FeatureError, FeatureResult};

/// A 2-D array of object labels in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    /// Width of the array (columns)
    pub width: u32,
    /// Height of the array (rows)
    pub height: u32,
    labels: Vec<u32>,
}

impl LabelImage {
    /// Create a label image from raw row-major data
    ///
    /// # Arguments
    /// * `width` - Number of columns
    /// * `height` - Number of rows
    /// * `labels` - `width * height` label values
    pub fn from_raw(width: u32, height: u32, labels: Vec<u32>) -> FeatureResult<Self> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(FeatureError::DimensionMismatch {
                what: "label data".to_string(),
                expected: (width, height),
                actual: (labels.len() as u32, 1),
            });
        }
        Ok(LabelImage { width, height, labels })
    }

    /// Create a label image from rows of labels
    ///
    /// Every row must have the length of the first one.
    pub fn from_rows(rows: &[Vec<u32>]) -> FeatureResult<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() as u32 != width) {
            return Err(FeatureError::DimensionMismatch {
                what: format!("label row {}", index),
                expected: (width, 1),
                actual: (row.len() as u32, 1),
            });
        }
        let labels: Vec<u32> = rows.iter().flatten().copied().collect();
        Self::from_raw(width, height, labels)
    }

    /// Interpret the grey levels of a decoded image as labels
    ///
    /// 16-bit images keep their full range; everything else is read through
    /// its 8-bit luma channel.
    pub fn from_image(image: &DynamicImage) -> Self {
        let labels: Vec<u32> = match image {
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
                image.to_luma16().into_raw().into_iter().map(u32::from).collect()
            }
            _ => image.to_luma8().into_raw().into_iter().map(u32::from).collect(),
        };
        LabelImage {
            width: image.width(),
            height: image.height(),
            labels,
        }
    }

    /// Label at a pixel, or `None` out of bounds
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.labels.get(idx).copied()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Iterate `(x, y, label)` over every pixel
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width.max(1);
        self.labels
            .iter()
            .enumerate()
            .map(move |(i, &label)| ((i as u32) % width, (i as u32) / width, label))
    }

    /// Distinct positive labels in ascending order
    pub fn unique_labels(&self) -> BTreeSet<u32> {
        self.labels.iter().copied().filter(|&l| l > 0).collect()
    }

    /// Binary presence mask: 255 on any object, 0 on background
    pub fn presence_mask(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let on = self.get(x, y).map_or(false, |l| l > 0);
            Luma([if on { 255 } else { 0 }])
        })
    }
}

//! Per-object region measurement
//!
//! Measures every positive label of a label image: its label, a masked
//! bounding-box crop of the intensity image and any requested shape or
//! intensity statistics. Rows come out in ascending label order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, ImageBuffer, Pixel};
use log::debug;

use crate::errors::{FeatureError, FeatureResult};
use crate::table::{Record, RowTable, Value, CROP_COLUMN, LABEL_COLUMN};

use super::label_image::LabelImage;

/// Optional statistics a region measurement can add to each row
///
/// Names and column layouts follow the usual region-properties vocabulary:
/// multi-valued properties expand to `name-0`, `name-1`, ... in
/// (row, column) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionProperty {
    /// Number of pixels
    Area,
    /// `bbox-0..bbox-3`: min row, min col, max row, max col (exclusive)
    Bbox,
    /// `centroid-0`, `centroid-1`: mean row and column
    Centroid,
    /// Eccentricity of the ellipse with the same second moments
    Eccentricity,
    /// Area divided by bounding-box area
    Extent,
    /// Mean intensity under the mask
    IntensityMean,
    /// Minimum intensity under the mask
    IntensityMin,
    /// Maximum intensity under the mask
    IntensityMax,
}

impl RegionProperty {
    pub const ALL: [RegionProperty; 8] = [
        RegionProperty::Area,
        RegionProperty::Bbox,
        RegionProperty::Centroid,
        RegionProperty::Eccentricity,
        RegionProperty::Extent,
        RegionProperty::IntensityMean,
        RegionProperty::IntensityMin,
        RegionProperty::IntensityMax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RegionProperty::Area => "area",
            RegionProperty::Bbox => "bbox",
            RegionProperty::Centroid => "centroid",
            RegionProperty::Eccentricity => "eccentricity",
            RegionProperty::Extent => "extent",
            RegionProperty::IntensityMean => "intensity_mean",
            RegionProperty::IntensityMin => "intensity_min",
            RegionProperty::IntensityMax => "intensity_max",
        }
    }
}

impl fmt::Display for RegionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RegionProperty {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        RegionProperty::ALL
            .iter()
            .copied()
            .find(|p| p.name() == name)
            .ok_or_else(|| FeatureError::InvalidConfig(format!("Unknown region property: {}", name)))
    }
}

/// Pixel-aligned bounding box of one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    /// Column of the left edge
    pub x: u32,
    /// Row of the top edge
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Column just right of the box
    pub fn end_x(&self) -> u32 {
        self.x + self.width
    }

    /// Row just below the box
    pub fn end_y(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Running sums for one label
#[derive(Debug, Clone)]
struct Accumulator {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u64,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
    sum_i: f64,
    min_i: f64,
    max_i: f64,
}

impl Accumulator {
    fn new(x: u32, y: u32) -> Self {
        Accumulator {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            count: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_yy: 0.0,
            sum_xy: 0.0,
            sum_i: 0.0,
            min_i: f64::INFINITY,
            max_i: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, x: u32, y: u32, intensity: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.count += 1;
        let (fx, fy) = (x as f64, y as f64);
        self.sum_x += fx;
        self.sum_y += fy;
        self.sum_xx += fx * fx;
        self.sum_yy += fy * fy;
        self.sum_xy += fx * fy;
        self.sum_i += intensity;
        self.min_i = self.min_i.min(intensity);
        self.max_i = self.max_i.max(intensity);
    }

    fn crop_box(&self) -> CropBox {
        CropBox {
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
        }
    }

    fn centroid(&self) -> (f64, f64) {
        let n = self.count as f64;
        (self.sum_y / n, self.sum_x / n)
    }

    fn eccentricity(&self) -> f64 {
        let n = self.count as f64;
        let (cy, cx) = self.centroid();
        let var_y = self.sum_yy / n - cy * cy;
        let var_x = self.sum_xx / n - cx * cx;
        let cov = self.sum_xy / n - cx * cy;

        let half_trace = (var_y + var_x) / 2.0;
        let spread = (((var_y - var_x) / 2.0).powi(2) + cov * cov).sqrt();
        let major = half_trace + spread;
        let minor = (half_trace - spread).max(0.0);
        if major <= f64::EPSILON {
            0.0
        } else {
            (1.0 - minor / major).max(0.0).sqrt()
        }
    }
}

/// Measure every object of a label image
///
/// # Arguments
/// * `labels` - The label image
/// * `intensity` - Optional intensity image of the same size; when absent
///   the binary presence mask (objects at 255) is used instead
/// * `properties` - Additional statistics to compute
///
/// # Returns
/// One row per positive label with `label`, the requested properties and
/// the `image_intensity` crop, in ascending label order
pub fn measure_regions(
    labels: &LabelImage,
    intensity: Option<&DynamicImage>,
    properties: &[RegionProperty],
) -> FeatureResult<RowTable> {
    let source = match intensity {
        Some(image) => {
            let actual = (image.width(), image.height());
            if actual != labels.dimensions() {
                return Err(FeatureError::DimensionMismatch {
                    what: "intensity image".to_string(),
                    expected: labels.dimensions(),
                    actual,
                });
            }
            image.clone()
        }
        None => DynamicImage::ImageLuma8(labels.presence_mask()),
    };
    let plane = intensity_plane(&source);

    let mut objects: BTreeMap<u32, Accumulator> = BTreeMap::new();
    for (x, y, label) in labels.pixels() {
        if label == 0 {
            continue;
        }
        let value = plane[y as usize * labels.width as usize + x as usize];
        objects
            .entry(label)
            .or_insert_with(|| Accumulator::new(x, y))
            .add(x, y, value);
    }
    debug!("Measuring {} regions", objects.len());

    let mut requested: Vec<RegionProperty> = Vec::new();
    for property in properties {
        if !requested.contains(property) {
            requested.push(*property);
        }
    }

    let mut table = RowTable::new();
    for (label, acc) in &objects {
        let crop_box = acc.crop_box();
        let mut row = Record::new().with(LABEL_COLUMN, *label);
        for property in &requested {
            add_property(&mut row, *property, acc, &crop_box);
        }
        row.insert(CROP_COLUMN, crop_region(&source, labels, *label, &crop_box));
        table.push_row(row);
    }

    Ok(table)
}

fn add_property(row: &mut Record, property: RegionProperty, acc: &Accumulator, crop_box: &CropBox) {
    match property {
        RegionProperty::Area => {
            row.insert("area", Value::Integer(acc.count as i64));
        }
        RegionProperty::Bbox => {
            row.insert("bbox-0", crop_box.y);
            row.insert("bbox-1", crop_box.x);
            row.insert("bbox-2", crop_box.end_y());
            row.insert("bbox-3", crop_box.end_x());
        }
        RegionProperty::Centroid => {
            let (cy, cx) = acc.centroid();
            row.insert("centroid-0", cy);
            row.insert("centroid-1", cx);
        }
        RegionProperty::Eccentricity => {
            row.insert("eccentricity", acc.eccentricity());
        }
        RegionProperty::Extent => {
            row.insert("extent", acc.count as f64 / crop_box.area() as f64);
        }
        RegionProperty::IntensityMean => {
            row.insert("intensity_mean", acc.sum_i / acc.count as f64);
        }
        RegionProperty::IntensityMin => {
            row.insert("intensity_min", acc.min_i);
        }
        RegionProperty::IntensityMax => {
            row.insert("intensity_max", acc.max_i);
        }
    }
}

/// Grey level of every pixel, row-major
///
/// 16-bit sources keep their 16-bit scale, all others are read as 8-bit.
fn intensity_plane(image: &DynamicImage) -> Vec<f64> {
    match image {
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            image.to_luma16().into_raw().into_iter().map(f64::from).collect()
        }
        _ => image.to_luma8().into_raw().into_iter().map(f64::from).collect(),
    }
}

/// Crop the bounding box of one object, zeroing pixels of other labels
fn crop_region(source: &DynamicImage, labels: &LabelImage, label: u32, crop_box: &CropBox) -> DynamicImage {
    match source {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageLuma16(buf) => DynamicImage::ImageLuma16(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageLumaA16(buf) => DynamicImage::ImageLumaA16(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageRgb16(buf) => DynamicImage::ImageRgb16(masked_crop(buf, labels, label, crop_box)),
        DynamicImage::ImageRgba16(buf) => DynamicImage::ImageRgba16(masked_crop(buf, labels, label, crop_box)),
        other => DynamicImage::ImageRgba16(masked_crop(&other.to_rgba16(), labels, label, crop_box)),
    }
}

fn masked_crop<P: Pixel>(
    source: &ImageBuffer<P, Vec<P::Subpixel>>,
    labels: &LabelImage,
    label: u32,
    crop_box: &CropBox,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let mut crop: ImageBuffer<P, Vec<P::Subpixel>> = ImageBuffer::new(crop_box.width, crop_box.height);
    for (x, y, pixel) in crop.enumerate_pixels_mut() {
        let (sx, sy) = (crop_box.x + x, crop_box.y + y);
        if labels.get(sx, sy) == Some(label) {
            *pixel = *source.get_pixel(sx, sy);
        }
    }
    crop
}

//! Image transformations: thumbnails, label images and region measurement

pub mod label_image;
pub mod regions;
pub mod thumbnail;

pub use label_image::LabelImage;
pub use regions::{measure_regions, CropBox, RegionProperty};
pub use thumbnail::{decode_thumbnail, ThumbnailEncoder};

//! Letterboxed thumbnail encoding
//!
//! Thumbnails are square RGB previews: the image is resized to fit inside
//! the square with Lanczos resampling, centered and padded with black. The
//! result is stored as a base64 encoded PNG so it fits in a table cell.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::errors::{FeatureError, FeatureResult};

/// Encodes images into fixed-size embeddable previews
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailEncoder {
    size: u32,
}

impl ThumbnailEncoder {
    /// Create an encoder producing `size` x `size` thumbnails
    pub fn new(size: u32) -> Self {
        ThumbnailEncoder { size: size.max(1) }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resize and pad an image to the thumbnail square
    pub fn letterbox(&self, image: &DynamicImage) -> RgbImage {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let (fit_w, fit_h) = fit_within(width, height, self.size);

        let resized = if (fit_w, fit_h) == (width, height) {
            rgb
        } else {
            imageops::resize(&rgb, fit_w, fit_h, FilterType::Lanczos3)
        };

        let mut canvas = RgbImage::new(self.size, self.size);
        let x = (self.size - fit_w) / 2;
        let y = (self.size - fit_h) / 2;
        imageops::replace(&mut canvas, &resized, x as i64, y as i64);
        canvas
    }

    /// Produce the base64 PNG string of an image's thumbnail
    pub fn encode(&self, image: &DynamicImage) -> FeatureResult<String> {
        let thumbnail = self.letterbox(image);
        let mut png = Vec::new();
        thumbnail.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(STANDARD.encode(png))
    }
}

/// Decode a thumbnail string back into an image
pub fn decode_thumbnail(encoded: &str) -> FeatureResult<DynamicImage> {
    let png = STANDARD
        .decode(encoded.trim())
        .map_err(|e| FeatureError::InvalidThumbnail(format!("not valid base64: {}", e)))?;
    image::load_from_memory_with_format(&png, ImageFormat::Png)
        .map_err(|e| FeatureError::InvalidThumbnail(format!("not a PNG image: {}", e)))
}

/// Largest size with the same aspect ratio that fits in a `side` square
///
/// The long edge becomes `side`; the short edge is rounded and never
/// collapses below one pixel.
fn fit_within(width: u32, height: u32, side: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (side, side);
    }
    if width >= height {
        let h = (side as f64 * height as f64 / width as f64).round() as u32;
        (side, h.clamp(1, side))
    } else {
        let w = (side as f64 * width as f64 / height as f64).round() as u32;
        (w.clamp(1, side), side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within(100, 50, 64), (64, 32));
        assert_eq!(fit_within(50, 100, 64), (32, 64));
        assert_eq!(fit_within(10, 10, 64), (64, 64));
        assert_eq!(fit_within(1000, 1, 64), (64, 1));
    }

    #[test]
    fn test_letterbox_pads_with_black() {
        let wide = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 20, Luma([255])));
        let thumb = ThumbnailEncoder::new(16).letterbox(&wide);

        assert_eq!(thumb.dimensions(), (16, 16));
        // margins above and below, content in the middle band
        assert_eq!(thumb.get_pixel(8, 0).0, [0, 0, 0]);
        assert_eq!(thumb.get_pixel(8, 15).0, [0, 0, 0]);
        assert_eq!(thumb.get_pixel(8, 8).0, [255, 255, 255]);
    }

    #[test]
    fn test_encode_is_deterministic_and_decodable() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(30, 12, |x, y| Luma([(x * 7 + y) as u8])));
        let encoder = ThumbnailEncoder::new(24);

        let first = encoder.encode(&image).unwrap();
        let second = encoder.encode(&image).unwrap();
        assert_eq!(first, second);

        let decoded = decode_thumbnail(&first).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 24));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_thumbnail("not base64 !!").is_err());
    }
}

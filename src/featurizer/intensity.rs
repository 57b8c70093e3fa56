//! Grey-level statistics featurizer

use image::DynamicImage;

use crate::table::{Record, Value};

use super::{Featurizer, Params};

/// Min, max, mean and standard deviation of an image's grey levels
///
/// When a numeric `threshold` parameter is given, the number of pixels
/// strictly above it is reported as `above_threshold`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityFeaturizer;

impl IntensityFeaturizer {
    pub const THRESHOLD_PARAM: &'static str = "threshold";
}

impl Featurizer for IntensityFeaturizer {
    fn featurize(&self, image: &DynamicImage, params: &Params) -> Result<Record, String> {
        let threshold = match params.get(Self::THRESHOLD_PARAM) {
            None => None,
            Some(v) => Some(v.as_f64().ok_or_else(|| {
                format!("parameter `{}` must be numeric, got {}", Self::THRESHOLD_PARAM, v.kind())
            })?),
        };
        if let Some(unknown) = params.keys().find(|k| k.as_str() != Self::THRESHOLD_PARAM) {
            return Err(format!("unexpected parameter `{}`", unknown));
        }

        let grey = image.to_luma8();
        let pixels = grey.as_raw();
        if pixels.is_empty() {
            return Err("image has no pixels".to_string());
        }

        let n = pixels.len() as f64;
        let min = pixels.iter().copied().min().unwrap_or(0);
        let max = pixels.iter().copied().max().unwrap_or(0);
        let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
        let variance = pixels.iter().map(|&p| (p as f64 - mean).powi(2)).sum::<f64>() / n;

        let mut record = Record::new()
            .with("min", Value::Integer(min as i64))
            .with("max", Value::Integer(max as i64))
            .with("mean", mean)
            .with("std", variance.sqrt());
        if let Some(t) = threshold {
            let above = pixels.iter().filter(|&&p| p as f64 > t).count();
            record.insert("above_threshold", above);
        }
        Ok(record)
    }
}

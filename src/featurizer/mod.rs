//! Featurizer contract
//!
//! A featurizer turns one decoded image (plus named parameters) into a
//! record of features. Its keys become feature columns, so every call in
//! a run must return the same key set.

mod intensity;

use std::collections::BTreeMap;

use image::DynamicImage;

use crate::errors::{FeatureError, FeatureResult};
use crate::table::{Record, Value, AUXILIARY_COLUMNS};

pub use intensity::IntensityFeaturizer;

/// Named parameters forwarded to every featurizer call
pub type Params = BTreeMap<String, Value>;

/// Computes a feature record from an image
///
/// Returning `Err` means the featurizer could not honour the call (for
/// example a required parameter is missing); the run is aborted with a
/// contract violation naming the offending image.
pub trait Featurizer {
    fn featurize(&self, image: &DynamicImage, params: &Params) -> Result<Record, String>;
}

impl<F> Featurizer for F
where
    F: Fn(&DynamicImage, &Params) -> Result<Record, String>,
{
    fn featurize(&self, image: &DynamicImage, params: &Params) -> Result<Record, String> {
        self(image, params)
    }
}

/// Checks that every featurizer result of a run has the same key set
///
/// The first accepted record defines the expected keys.
#[derive(Debug, Default)]
pub struct KeySetGuard {
    expected: Option<Vec<String>>,
}

impl KeySetGuard {
    pub fn new() -> Self {
        KeySetGuard::default()
    }

    /// Run a featurizer and validate its output
    ///
    /// # Arguments
    /// * `featurizer` - The featurizer to call
    /// * `image` - Image passed as first argument
    /// * `params` - Named parameters
    /// * `context` - Description of the image, used in error messages
    pub fn featurize(
        &mut self,
        featurizer: &dyn Featurizer,
        image: &DynamicImage,
        params: &Params,
        context: &str,
    ) -> FeatureResult<Record> {
        let record = featurizer.featurize(image, params).map_err(|reason| {
            FeatureError::FeaturizerContractViolation {
                context: context.to_string(),
                reason,
            }
        })?;
        self.check(record, context)
    }

    fn check(&mut self, record: Record, context: &str) -> FeatureResult<Record> {
        if let Some(reserved) = record.keys().find(|k| AUXILIARY_COLUMNS.contains(k)) {
            return Err(FeatureError::FeaturizerContractViolation {
                context: context.to_string(),
                reason: format!("feature name `{}` is reserved for the pipeline", reserved),
            });
        }

        let expected = self
            .expected
            .get_or_insert_with(|| record.keys().map(str::to_string).collect());
        let same_keys = expected.len() == record.len() && record.keys().all(|k| expected.iter().any(|e| e == k));
        if !same_keys {
            return Err(FeatureError::FeaturizerContractViolation {
                context: context.to_string(),
                reason: format!(
                    "returned keys {:?}, expected the keys of the first image {:?}",
                    record.keys().collect::<Vec<_>>(),
                    expected
                ),
            });
        }
        Ok(record)
    }
}

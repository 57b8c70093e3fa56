//! Directory scan command
//!
//! Runs the grey-level statistics featurizer on every image of a directory.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::FeatureScope;
use crate::commands::command_traits::Command;
use crate::errors::{FeatureError, FeatureResult};
use crate::featurizer::{IntensityFeaturizer, Params};
use crate::table::Value;

use super::{images_dir_arg, report};

/// Command featurizing the images of a directory
pub struct ScanCommand<'a> {
    /// Directory of images to featurize
    images_dir: PathBuf,
    /// Optional pixel threshold forwarded to the featurizer
    threshold: Option<f64>,
    scope: &'a FeatureScope,
}

impl<'a> ScanCommand<'a> {
    /// Create a new scan command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `scope` - Configured pipeline
    pub fn new(args: &ArgMatches, scope: &'a FeatureScope) -> FeatureResult<Self> {
        let images_dir = images_dir_arg(args)?;

        let threshold = match args.get_one::<String>("threshold") {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .map_err(|_| FeatureError::InvalidConfig(format!("Invalid threshold: {}", raw)))?,
            ),
            None => None,
        };

        Ok(ScanCommand {
            images_dir,
            threshold,
            scope,
        })
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(t) = self.threshold {
            params.insert(IntensityFeaturizer::THRESHOLD_PARAM.to_string(), Value::Float(t));
        }
        params
    }
}

impl<'a> Command for ScanCommand<'a> {
    fn execute(&self) -> FeatureResult<()> {
        info!("Scanning images in {}", self.images_dir.display());
        let result = self
            .scope
            .apply_to_images(&IntensityFeaturizer, &self.images_dir, self.params())?;
        report(result);
        Ok(())
    }
}

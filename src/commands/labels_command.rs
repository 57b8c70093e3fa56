//! Label image command
//!
//! Measures the objects of a label image read from disk and saves one crop
//! per object into an empty images directory.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::FeatureScope;
use crate::commands::command_traits::Command;
use crate::errors::{FeatureError, FeatureResult};
use crate::featurizer::{Featurizer, IntensityFeaturizer, Params};
use crate::imaging::{LabelImage, RegionProperty};
use crate::io::load_image;

use super::{images_dir_arg, report};

/// Command turning a label image into per-object rows
pub struct LabelsCommand<'a> {
    images_dir: PathBuf,
    /// Label image file (integer pixels, 0 is background)
    labels_file: PathBuf,
    /// Optional intensity image of the same size
    intensity_file: Option<PathBuf>,
    /// Region properties to measure
    properties: Vec<RegionProperty>,
    /// Also run the grey-level statistics featurizer on every crop
    featurize: bool,
    scope: &'a FeatureScope,
}

impl<'a> LabelsCommand<'a> {
    /// Create a new labels command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `scope` - Configured pipeline
    pub fn new(args: &ArgMatches, scope: &'a FeatureScope) -> FeatureResult<Self> {
        let images_dir = images_dir_arg(args)?;
        let labels_file = args
            .get_one::<String>("labels")
            .map(PathBuf::from)
            .ok_or_else(|| FeatureError::InvalidConfig("Missing --labels file".to_string()))?;
        let intensity_file = args.get_one::<String>("intensity").map(PathBuf::from);

        let properties = match args.get_one::<String>("properties") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<RegionProperty>)
                .collect::<FeatureResult<Vec<_>>>()?,
            None => vec![RegionProperty::Area],
        };

        Ok(LabelsCommand {
            images_dir,
            labels_file,
            intensity_file,
            properties,
            featurize: args.get_flag("featurize"),
            scope,
        })
    }
}

impl<'a> Command for LabelsCommand<'a> {
    fn execute(&self) -> FeatureResult<()> {
        info!("Reading label image {}", self.labels_file.display());
        let labels = LabelImage::from_image(&load_image(&self.labels_file)?);
        info!("{} objects found", labels.unique_labels().len());

        let intensity = match &self.intensity_file {
            Some(path) => Some(load_image(path)?),
            None => None,
        };

        let statistics: &dyn Featurizer = &IntensityFeaturizer;
        let featurizer = if self.featurize {
            Some((statistics, Params::new()))
        } else {
            None
        };

        let result = self.scope.apply_to_label_image(
            &labels,
            &self.images_dir,
            intensity.as_ref(),
            &self.properties,
            featurizer,
        )?;
        report(result);
        Ok(())
    }
}

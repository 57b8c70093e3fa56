//! Existing table command
//!
//! Reads a CSV feature table and pairs its rows with the images named in
//! one of its columns.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::FeatureScope;
use crate::commands::command_traits::Command;
use crate::errors::{FeatureError, FeatureResult};
use crate::io::read_table;

use super::{images_dir_arg, report};

/// Command attaching thumbnails to a user feature table
pub struct TableCommand<'a> {
    images_dir: PathBuf,
    /// CSV file holding the features
    table_file: PathBuf,
    /// Column holding the image file names
    filename_column: String,
    scope: &'a FeatureScope,
}

impl<'a> TableCommand<'a> {
    /// Create a new table command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `scope` - Configured pipeline
    pub fn new(args: &ArgMatches, scope: &'a FeatureScope) -> FeatureResult<Self> {
        let images_dir = images_dir_arg(args)?;
        let table_file = args
            .get_one::<String>("table")
            .map(PathBuf::from)
            .ok_or_else(|| FeatureError::InvalidConfig("Missing --table file".to_string()))?;
        let filename_column = args
            .get_one::<String>("filename-column")
            .cloned()
            .ok_or_else(|| FeatureError::InvalidConfig("Missing --filename-column".to_string()))?;

        Ok(TableCommand {
            images_dir,
            table_file,
            filename_column,
            scope,
        })
    }
}

impl<'a> Command for TableCommand<'a> {
    fn execute(&self) -> FeatureResult<()> {
        let table = read_table(&self.table_file)?;
        info!("Read {} rows from {}", table.len(), self.table_file.display());

        let result = self.scope.apply_from_images_table(
            table,
            &self.images_dir,
            Some(&self.filename_column),
            None,
        )?;
        report(result);
        Ok(())
    }
}

//! CLI command implementations
//!
//! One command per subcommand of the command line tool, created by
//! `FeatureScopeCommandFactory` from the parsed arguments.

pub mod command_traits;
pub mod labels_command;
pub mod scan_command;
pub mod table_command;

pub use command_traits::{Command, CommandFactory};
pub use labels_command::LabelsCommand;
pub use scan_command::ScanCommand;
pub use table_command::TableCommand;

use std::path::PathBuf;

use clap::ArgMatches;

use crate::api::FeatureScope;
use crate::errors::{FeatureError, FeatureResult};

/// Factory for creating command instances based on CLI arguments
pub struct FeatureScopeCommandFactory;

impl FeatureScopeCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        FeatureScopeCommandFactory
    }
}

impl Default for FeatureScopeCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for FeatureScopeCommandFactory {
    fn create_command(&self, args: &ArgMatches, scope: &'a FeatureScope) -> FeatureResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("scan", sub)) => Ok(Box::new(ScanCommand::new(sub, scope)?)),
            Some(("labels", sub)) => Ok(Box::new(LabelsCommand::new(sub, scope)?)),
            Some(("table", sub)) => Ok(Box::new(TableCommand::new(sub, scope)?)),
            Some((other, _)) => Err(FeatureError::InvalidConfig(format!("Unknown command: {}", other))),
            None => Err(FeatureError::InvalidConfig("No command given. Use scan, labels or table".to_string())),
        }
    }
}

/// The images directory positional argument shared by every subcommand
pub(crate) fn images_dir_arg(args: &ArgMatches) -> FeatureResult<PathBuf> {
    args.get_one::<String>("images_dir")
        .map(PathBuf::from)
        .ok_or_else(|| FeatureError::InvalidConfig("Missing images directory".to_string()))
}

/// Report the outcome of a run
pub(crate) fn report(result: Option<PathBuf>) {
    match result {
        Some(path) => println!("Saved: {}", path.display()),
        None => println!("Nothing to save."),
    }
}

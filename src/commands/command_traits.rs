//! Command pattern interfaces
//!
//! Each subcommand of the command line tool is a `Command` built from the
//! parsed arguments by a `CommandFactory`.

use crate::api::FeatureScope;
use crate::errors::FeatureResult;

/// An executable command of the application
pub trait Command {
    /// Execute the command
    ///
    /// # Returns
    /// Result indicating success or an error
    fn execute(&self) -> FeatureResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory<'a> {
    /// Create a new Command instance based on CLI arguments
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `scope` - Configured pipeline the command runs on
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches, scope: &'a FeatureScope) -> FeatureResult<Box<dyn Command + 'a>>;
}

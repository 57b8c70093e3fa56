use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use log::{error, Level};
use std::process;

use featurescope::commands::{CommandFactory, FeatureScopeCommandFactory};
use featurescope::config::PipelineConfig;
use featurescope::errors::{FeatureError, FeatureResult};
use featurescope::utils::logger::Logger;
use featurescope::FeatureScope;

fn images_dir() -> Arg {
    Arg::new("images_dir")
        .help("Images directory (input images and output crops, thumbnails and table)")
        .required(true)
        .index(1)
}

fn build_cli() -> ClapCommand {
    ClapCommand::new("featurescope")
        .version("0.1.0")
        .about("Build normalized feature tables with embedded thumbnails for visual exploration")
        .subcommand_required(true)
        .arg(
            Arg::new("thumbnail-size")
                .long("thumbnail-size")
                .help("Side length of the square thumbnails in pixels")
                .value_name("PIXELS")
                .global(true),
        )
        .arg(
            Arg::new("margin")
                .long("margin")
                .help("Relative margin kept around normalized values, in [0, 1)")
                .value_name("FRACTION")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file with thumbnail_size and margin")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write the log to this file")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            ClapCommand::new("scan")
                .about("Compute grey-level statistics for every image of a directory")
                .arg(images_dir())
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .help("Also count the pixels above this grey level")
                        .value_name("LEVEL"),
                ),
        )
        .subcommand(
            ClapCommand::new("labels")
                .about("Measure the objects of a label image and save one crop per object")
                .arg(images_dir())
                .arg(
                    Arg::new("labels")
                        .long("labels")
                        .help("Label image file, 0 is background")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(
                    Arg::new("intensity")
                        .long("intensity")
                        .help("Intensity image cropped under each object")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("properties")
                        .long("properties")
                        .help("Comma separated region properties (area, bbox, centroid, eccentricity, extent, intensity_mean, intensity_min, intensity_max)")
                        .value_name("LIST"),
                )
                .arg(
                    Arg::new("featurize")
                        .long("featurize")
                        .help("Also compute grey-level statistics of every crop")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("table")
                .about("Attach thumbnails to an existing CSV feature table")
                .arg(images_dir())
                .arg(
                    Arg::new("table")
                        .long("table")
                        .help("CSV feature table")
                        .value_name("CSV")
                        .required(true),
                )
                .arg(
                    Arg::new("filename-column")
                        .long("filename-column")
                        .help("Column holding the image file names")
                        .value_name("COLUMN")
                        .required(true),
                ),
        )
}

/// Defaults, then environment, then config file, then flags
fn load_config(matches: &ArgMatches) -> FeatureResult<PipelineConfig> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(path) = matches.get_one::<String>("config") {
        config = PipelineConfig::from_toml_file(path)?;
    }
    if let Some(raw) = matches.get_one::<String>("thumbnail-size") {
        config.thumbnail_size = raw
            .parse()
            .map_err(|_| FeatureError::InvalidConfig(format!("Invalid thumbnail size: {}", raw)))?;
    }
    if let Some(raw) = matches.get_one::<String>("margin") {
        config.margin = raw
            .parse()
            .map_err(|_| FeatureError::InvalidConfig(format!("Invalid margin: {}", raw)))?;
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    let matches = build_cli().get_matches();
    // Global options propagate down to the subcommand matches
    let options = matches.subcommand().map_or(&matches, |(_, sub)| sub);

    let level = if options.get_flag("verbose") { Level::Debug } else { Level::Info };
    match options.get_one::<String>("log-file") {
        Some(log_file) => {
            if let Err(e) = Logger::init_global_logger(log_file, level) {
                eprintln!("Error setting up global logger: {}", e);
                process::exit(1);
            }
        }
        None => Logger::init_console_logger(level),
    }

    let config = match load_config(options) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let scope = FeatureScope::new(config);

    let factory = FeatureScopeCommandFactory::new();
    match factory.create_command(&matches, &scope) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}

use clap::{ArgAction, Parser};
use anyhow::Result;
use std::path::PathBuf;
use log::{debug, info};

use crate::trait_data::{InfoDictionary, PropertyValue, TraitSet};

/// Asset manager middleware command line
#[derive(Parser, Debug)]
#[command(name = "assetio")]
#[command(about = "Discover asset manager plugins, inspect them and resolve entity references")]
#[command(version, long_version = crate::version::LONG_VERSION)]
pub struct Args {
    /// List every available manager
    #[arg(short = 'l', long = "list-managers")]
    pub list_managers: bool,

    /// Show identifier, info and capabilities of a manager
    #[arg(long = "manager-info", value_name = "IDENTIFIER")]
    pub manager_info: Option<String>,

    /// Entity references to resolve
    #[arg(short = 'r', long = "resolve", value_name = "REFERENCE", action = ArgAction::Append)]
    pub resolve: Vec<String>,

    /// Traits to resolve - supports comma-separated values
    #[arg(short = 't', long = "traits", value_name = "TRAIT", action = ArgAction::Append)]
    pub traits: Vec<String>,

    /// Manager to use instead of the configured default manager
    #[arg(short = 'm', long = "manager", value_name = "IDENTIFIER")]
    pub manager: Option<String>,

    /// Manager setting as KEY=VALUE (repeatable)
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub settings: Vec<String>,

    /// Plugin search path, overriding $ASSETIO_PLUGIN_PATH
    #[arg(long = "plugin-path", value_name = "PATHS")]
    pub plugin_path: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (info level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json (default: config file, then text)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Requested traits, with comma-separated values split out
    pub fn trait_set(&self) -> TraitSet {
        self.traits
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }

    /// Settings given with `--setting`
    pub fn manager_settings(&self) -> Result<InfoDictionary> {
        self.settings.iter().map(|setting| parse_setting(setting)).collect()
    }
}

/// Parse `KEY=VALUE`, typing the value as bool, int, float or string in
/// that order of preference
pub fn parse_setting(setting: &str) -> Result<(String, PropertyValue)> {
    let (key, value) = setting
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid setting '{}': expected KEY=VALUE", setting))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow::anyhow!("Invalid setting '{}': empty key", setting));
    }

    let value = if let Ok(flag) = value.parse::<bool>() {
        PropertyValue::Bool(flag)
    } else if let Ok(int) = value.parse::<i64>() {
        PropertyValue::Int(int)
    } else if let Ok(float) = value.parse::<f64>() {
        PropertyValue::Float(float)
    } else {
        PropertyValue::Str(value.to_string())
    };
    Ok((key.to_string(), value))
}

pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    if let Some(format) = &args.log_format {
        match format.to_lowercase().as_str() {
            "text" | "json" => {}
            _ => return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Valid options: text, json", format
            )),
        }
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!("--log-file-level requires --log-file to be specified"));
    }

    if !args.traits.is_empty() && args.resolve.is_empty() {
        return Err(anyhow::anyhow!("--traits requires --resolve to be specified"));
    }

    if !args.resolve.is_empty() && args.trait_set().is_empty() {
        return Err(anyhow::anyhow!("--resolve requires at least one trait via --traits"));
    }

    args.manager_settings()?;

    info!("CLI arguments validated successfully");
    Ok(())
}

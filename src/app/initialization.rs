//! Application initialization and configuration

use std::ffi::OsString;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, LevelFilter};

use crate::context::{HostDescriptor, HostInterface};
use crate::host_api::ManagerFactory;
use crate::logger::{LogFacadeLogger, SharedLogger};
use crate::plugin_system::{
    BuiltinManagerFactory, HybridManagerFactory, PluginSystemManagerFactory, SharedManagerFactory,
};
use crate::{cli, config, logging};

pub const HOST_IDENTIFIER: &str = "org.assetio.cli";

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    match &args.config_file {
        Some(config_file) => {
            debug!("Loading configuration from explicit file: {}", config_file.display());
            config::ConfigManager::load_from_file(config_file.clone())
        }
        None => config::ConfigManager::load(),
    }
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug || args.verbose || args.quiet {
        logging::LogConfig::console_level_for(args.verbose, args.quiet, args.debug)
    } else {
        match config.get_log_level("logging", "console-level") {
            Ok(Some(level)) => level,
            Ok(None) => LevelFilter::Warn,
            Err(e) => {
                debug!("Invalid console-level in config, using default: {}", e);
                LevelFilter::Warn
            }
        }
    };

    let format = match &args.log_format {
        Some(format) => logging::LogFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?,
        None => config
            .get_value("logging", "format")
            .and_then(|format| logging::LogFormat::from_str(format).ok())
            .unwrap_or(logging::LogFormat::Text),
    };

    let mut log_config = logging::LogConfig { console_level, format, ..logging::LogConfig::default() };

    let log_file = args.log_file.clone().or_else(|| config.get_path("logging", "file"));
    if let Some(path) = log_file {
        let file_level = match &args.log_file_level {
            Some(level) => Some(logging::parse_log_level(level)?),
            None => config.get_log_level("logging", "file-level")?,
        };
        debug!("File logging enabled: {} (level: {:?})", path.display(), file_level);
        log_config = log_config.with_file(path, file_level);
    }

    Ok(log_config)
}

/// Plugin search path from the command line, the environment or the
/// config file, in that order
pub fn plugin_search_path(args: &cli::Args, config: &config::ConfigManager) -> Result<Option<OsString>> {
    if let Some(path) = &args.plugin_path {
        return Ok(Some(OsString::from(path)));
    }
    if let Some(path) = std::env::var_os(crate::plugin_system::PLUGIN_PATH_ENV_VAR) {
        return Ok(Some(path));
    }
    config.plugin_search_path()
}

/// Factory over native plugins, then the bundled managers. Plugins take
/// priority when both provide the same identifier.
pub fn build_implementation_factory(
    search_path: Option<OsString>,
    logger: SharedLogger,
) -> Result<SharedManagerFactory> {
    let plugins: SharedManagerFactory = match search_path {
        Some(paths) => Arc::new(PluginSystemManagerFactory::new(paths, Arc::clone(&logger))),
        None => Arc::new(PluginSystemManagerFactory::from_env(Arc::clone(&logger))),
    };
    let builtin: SharedManagerFactory = Arc::new(BuiltinManagerFactory::with_bundled_managers(Arc::clone(&logger)));

    let hybrid = HybridManagerFactory::make(vec![plugins, builtin], logger)?;
    Ok(Arc::new(hybrid))
}

pub fn create_manager_factory(args: &cli::Args, config: &config::ConfigManager) -> Result<ManagerFactory> {
    let logger = LogFacadeLogger::shared();
    let search_path = plugin_search_path(args, config)?;
    let implementations = build_implementation_factory(search_path, Arc::clone(&logger))?;

    let host: Arc<dyn HostInterface> = Arc::new(HostDescriptor::new(HOST_IDENTIFIER, "Assetio CLI"));
    Ok(ManagerFactory::new(host, implementations, logger))
}

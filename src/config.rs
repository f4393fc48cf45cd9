//! Configuration
//!
//! Two configuration sources are handled here:
//!
//! * the process configuration file, discovered via
//!   `$ASSETIO_CONFIG` → `<config dir>/assetio/config.toml` →
//!   `~/.assetio.toml` → `./.assetio.toml` and flattened to
//!   `section -> key -> value` strings ([`ConfigManager`]);
//! * the host's default manager, a TOML file named by
//!   `$ASSETIO_DEFAULT_CONFIG` ([`DefaultManagerConfig`]).

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use toml::Value;

use crate::errors::Error;
use crate::trait_data::{InfoDictionary, PropertyValue};

/// Environment variable naming the process configuration file
pub const CONFIG_ENV_VAR: &str = "ASSETIO_CONFIG";

/// Environment variable naming the default manager configuration file
pub const DEFAULT_CONFIG_ENV_VAR: &str = "ASSETIO_DEFAULT_CONFIG";

/// Token in default manager settings replaced by the config file's directory
pub const CONFIG_DIR_TOKEN: &str = "${config_dir}";

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self { config, config_file_path: None }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        debug!("No configuration file found, using empty configuration");
        Ok(Self::from_config(Configuration::new()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self { config, config_file_path: Some(path) })
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Get value from configuration, falling back to the `base` section
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.config
            .get(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.config.get("base").and_then(|s| s.get(key)))
    }

    /// Get boolean value with type conversion
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!("Invalid boolean value for {}.{}: {}", section, key, value)),
            },
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Plugin search path from `[plugins] path`. A TOML array of
    /// directories is joined with the platform delimiter.
    pub fn plugin_search_path(&self) -> Result<Option<OsString>> {
        let Some(value) = self.config.get("plugins").and_then(|s| s.get("path")) else {
            return Ok(None);
        };
        let reparsed = format!("path = {}", value).parse::<toml::Table>().ok();
        match reparsed.and_then(|mut table| table.remove("path")) {
            Some(Value::Array(items)) => {
                let directories: Vec<PathBuf> = items
                    .iter()
                    .filter_map(|item| item.as_str().map(PathBuf::from))
                    .collect();
                let joined = env::join_paths(directories).context("Invalid plugin search path in config")?;
                Ok(Some(joined))
            }
            _ => Ok(Some(OsString::from(value))),
        }
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        paths.push(PathBuf::from(env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("assetio").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".assetio.toml"));
    }

    paths.push(PathBuf::from("./.assetio.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let table: toml::Table = content.parse().context("Failed to parse TOML content")?;

    let mut config = Configuration::new();
    flatten_toml_table(&table, String::new(), &mut config);
    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) if subtable.values().any(|v| matches!(v, Value::Table(_))) => {
                flatten_toml_table(subtable, section_name, config);
            }
            Value::Table(subtable) => {
                let section_map = subtable
                    .iter()
                    .map(|(subkey, subvalue)| (subkey.clone(), toml_value_to_string(subvalue)))
                    .collect();
                config.insert(section_name, section_map);
            }
            _ => {
                // Top-level scalars land in the base section
                let section = if prefix.is_empty() { "base".to_string() } else { prefix.clone() };
                config.entry(section).or_default().insert(key.clone(), toml_value_to_string(value));
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// The host's default manager: which one to use and how to initialize it
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultManagerConfig {
    pub identifier: String,
    pub settings: InfoDictionary,
    /// File the configuration was read from
    pub path: PathBuf,
}

impl DefaultManagerConfig {
    /// Load the file named by [`DEFAULT_CONFIG_ENV_VAR`]. `None` when the
    /// variable is unset.
    pub fn from_env() -> crate::Result<Option<Self>> {
        match env::var_os(DEFAULT_CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)).map(Some),
            _ => Ok(None),
        }
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Could not read default manager config '{}': {}", path.display(), e))
        })?;

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()?.join(path)
        };
        let config_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut config = Self::parse(&content, &config_dir)?;
        config.path = absolute;
        Ok(config)
    }

    /// Parse configuration text. `config_dir` replaces
    /// [`CONFIG_DIR_TOKEN`] in string settings.
    pub fn parse(content: &str, config_dir: &Path) -> crate::Result<Self> {
        let document: toml::Table = content
            .parse()
            .map_err(|e| Error::configuration(format!("Invalid default manager config: {}", e)))?;

        let manager = document
            .get("manager")
            .and_then(Value::as_table)
            .ok_or_else(|| Error::configuration("Default manager config has no [manager] table"))?;

        let identifier = manager
            .get("identifier")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::configuration("Default manager config has no manager.identifier"))?
            .to_string();

        let mut settings = InfoDictionary::new();
        if let Some(table) = manager.get("settings") {
            let table = table
                .as_table()
                .ok_or_else(|| Error::configuration("manager.settings must be a table"))?;
            for (key, value) in table {
                settings.insert(key.clone(), setting_value(key, value, config_dir)?);
            }
        }

        Ok(Self { identifier, settings, path: PathBuf::new() })
    }
}

fn setting_value(key: &str, value: &Value, config_dir: &Path) -> crate::Result<PropertyValue> {
    match value {
        Value::String(s) => Ok(PropertyValue::Str(
            s.replace(CONFIG_DIR_TOKEN, &config_dir.to_string_lossy()),
        )),
        Value::Integer(i) => Ok(PropertyValue::Int(*i)),
        Value::Float(f) => Ok(PropertyValue::Float(*f)),
        Value::Boolean(b) => Ok(PropertyValue::Bool(*b)),
        other => Err(Error::configuration(format!(
            "Setting '{}' has unsupported type {}",
            key,
            other.type_str()
        ))),
    }
}

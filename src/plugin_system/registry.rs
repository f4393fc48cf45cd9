//! Plugin Registry
//!
//! Scans search paths for plugin libraries, instantiates the plugin each
//! one exports, and registers it by identifier.
//!
//! Directories are scanned left to right and the first registration of an
//! identifier wins. Which of two same-identifier libraries in one directory
//! wins depends on directory iteration order and is not defined.
//!
//! Libraries are never closed. [`PluginRegistry::reset`] forgets the
//! registered plugins but keeps every library that was opened, since
//! objects created from them may still be alive. A later scan reuses an
//! already open library rather than opening it again.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::logger::SharedLogger;

use super::native::{DylibLoader, NativeLibraryLoader, SharedLibrary};
use super::plugin::{from_raw_plugin, BoxedPlugin, PluginSystemPlugin};

/// Caller-supplied acceptance check run on each loaded plugin. `Err` holds
/// the reason for rejection.
pub type PluginValidator<'a> = &'a dyn Fn(&dyn PluginSystemPlugin) -> std::result::Result<(), String>;

/// A registered plugin
pub struct PluginRecord {
    pub identifier: String,
    pub path: PathBuf,
    pub plugin: BoxedPlugin,
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("identifier", &self.identifier)
            .field("path", &self.path)
            .finish()
    }
}

/// Registry of plugins loaded from native libraries
pub struct PluginRegistry {
    loader: Arc<dyn NativeLibraryLoader>,
    logger: SharedLogger,
    /// Registered plugins by identifier
    plugins: HashMap<String, PluginRecord>,
    /// Every library opened so far, kept for the registry's lifetime
    libraries: Vec<(PathBuf, SharedLibrary)>,
}

impl PluginRegistry {
    /// Create a registry that loads real shared libraries
    pub fn new(logger: SharedLogger) -> Self {
        Self::with_loader(Arc::new(DylibLoader::new()), logger)
    }

    /// Create a registry with a custom library loader
    pub fn with_loader(loader: Arc<dyn NativeLibraryLoader>, logger: SharedLogger) -> Self {
        Self {
            loader,
            logger,
            plugins: HashMap::new(),
            libraries: Vec::new(),
        }
    }

    /// Scan a platform-delimited list of directories (`:` on POSIX, `;` on
    /// Windows). Returns the number of plugins newly registered.
    pub fn scan(&mut self, search_paths: &OsStr, entry_point: &str, validate: PluginValidator<'_>) -> usize {
        let directories: Vec<PathBuf> = std::env::split_paths(search_paths)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        self.scan_directories(&directories, entry_point, validate)
    }

    /// Scan the given directories, left to right
    pub fn scan_directories(
        &mut self,
        directories: &[PathBuf],
        entry_point: &str,
        validate: PluginValidator<'_>,
    ) -> usize {
        let before = self.plugins.len();

        for directory in directories {
            let entries = match fs::read_dir(directory) {
                Ok(entries) => entries,
                Err(e) => {
                    self.logger.debug(&format!(
                        "PluginRegistry: Skipping '{}': not a searchable directory ({})",
                        directory.display(),
                        e
                    ));
                    continue;
                }
            };

            self.logger.debug(&format!("PluginRegistry: Searching '{}'", directory.display()));

            for entry in entries.flatten() {
                let path = entry.path();

                let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
                if !is_file {
                    self.logger.debug(&format!("PluginRegistry: Ignoring '{}': not a file", path.display()));
                    continue;
                }
                if !self.loader.is_candidate(&path) {
                    self.logger.debug(&format!(
                        "PluginRegistry: Ignoring '{}': not a shared library",
                        path.display()
                    ));
                    continue;
                }

                if let Err(reason) = self.load_candidate(&path, entry_point, validate) {
                    self.logger.warning(&format!("PluginRegistry: Skipping '{}': {}", path.display(), reason));
                }
            }
        }

        let registered = self.plugins.len() - before;
        self.logger.debug(&format!(
            "PluginRegistry: Scan complete, {} new plugin(s), {} total",
            registered,
            self.plugins.len()
        ));
        registered
    }

    /// Open one library, instantiate its plugin and register it
    fn load_candidate(
        &mut self,
        path: &Path,
        entry_point: &str,
        validate: PluginValidator<'_>,
    ) -> std::result::Result<(), String> {
        let library = match self.libraries.iter().find(|(opened, _)| opened == path) {
            Some((_, library)) => Arc::clone(library),
            None => {
                let library = self.loader.open(path).map_err(|e| format!("could not open library: {}", e))?;
                self.libraries.push((path.to_path_buf(), Arc::clone(&library)));
                library
            }
        };

        let entry = library
            .entry_point(entry_point)
            .map_err(|e| format!("entry point '{}' not found: {}", entry_point, e))?;

        // Neither call may unwind; see the entry point contract.
        let factory = unsafe { entry() };
        let raw = unsafe { factory() };
        let plugin = unsafe { from_raw_plugin(raw) }.ok_or_else(|| "plugin factory returned null".to_string())?;

        let identifier = match panic::catch_unwind(AssertUnwindSafe(|| plugin.identifier())) {
            Ok(Ok(identifier)) => identifier,
            Ok(Err(e)) => return Err(format!("error querying identifier: {}", e)),
            Err(_) => return Err("panic while querying identifier".to_string()),
        };

        validate(plugin.as_ref()).map_err(|reason| format!("plugin '{}' rejected: {}", identifier, reason))?;

        if let Some(existing) = self.plugins.get(&identifier) {
            return Err(format!(
                "plugin '{}' already registered from '{}'",
                identifier,
                existing.path.display()
            ));
        }

        self.logger.debug(&format!("PluginRegistry: Registered '{}' from '{}'", identifier, path.display()));
        self.plugins.insert(
            identifier.clone(),
            PluginRecord { identifier, path: path.to_path_buf(), plugin },
        );
        Ok(())
    }

    /// Registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.plugins.keys().cloned().collect();
        identifiers.sort();
        identifiers
    }

    /// Look up a registered plugin
    pub fn plugin(&self, identifier: &str) -> Result<&PluginRecord> {
        self.plugins
            .get(identifier)
            .ok_or_else(|| Error::input_validation(format!("Plugin '{}' is not registered", identifier)))
    }

    /// Forget every registered plugin. Opened libraries stay loaded.
    pub fn reset(&mut self) {
        self.logger.debug(&format!("PluginRegistry: Resetting ({} plugin(s))", self.plugins.len()));
        self.plugins.clear();
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Number of libraries opened over the registry's lifetime
    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }
}

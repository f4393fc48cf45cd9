//! Manager Implementation Factories
//!
//! A factory lists the manager identifiers it can provide and instantiates
//! fresh, uninitialized managers by identifier. Hosts only ever use these two
//! operations; see [`HybridManagerFactory`](super::HybridManagerFactory) for
//! combining several factories.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::compatibility::VersionCompatibilityChecker;
use crate::errors::{Error, Result};
use crate::logger::SharedLogger;
use crate::manager_api::BoxedManagerInterface;

use super::native::NativeLibraryLoader;
use super::plugin::{PluginSystemPlugin, MANAGER_PLUGIN_ENTRY_POINT};
use super::registry::PluginRegistry;

/// Environment variable holding the manager plugin search path
pub const PLUGIN_PATH_ENV_VAR: &str = "ASSETIO_PLUGIN_PATH";

/// Source of manager implementations
pub trait ManagerImplementationFactory: Send + Sync {
    /// Identifiers of the managers this factory can instantiate
    fn identifiers(&self) -> Result<Vec<String>>;

    /// A new, uninitialized manager. Every call returns an independent
    /// instance.
    fn instantiate(&self, identifier: &str) -> Result<BoxedManagerInterface>;
}

/// Shared factory handle
pub type SharedManagerFactory = Arc<dyn ManagerImplementationFactory>;

struct ScanState {
    registry: PluginRegistry,
    scanned: bool,
}

/// Factory backed by manager plugins loaded from native libraries.
///
/// Construction is cheap: the search paths are scanned on first use.
pub struct PluginSystemManagerFactory {
    search_paths: OsString,
    state: Mutex<ScanState>,
    compatibility: VersionCompatibilityChecker,
    logger: SharedLogger,
}

impl PluginSystemManagerFactory {
    pub fn new<P: Into<OsString>>(search_paths: P, logger: SharedLogger) -> Self {
        let registry = PluginRegistry::new(Arc::clone(&logger));
        Self::with_registry(search_paths.into(), registry, logger)
    }

    /// Use a custom library loader
    pub fn with_loader<P: Into<OsString>>(
        search_paths: P,
        loader: Arc<dyn NativeLibraryLoader>,
        logger: SharedLogger,
    ) -> Self {
        let registry = PluginRegistry::with_loader(loader, Arc::clone(&logger));
        Self::with_registry(search_paths.into(), registry, logger)
    }

    /// Search paths taken from [`PLUGIN_PATH_ENV_VAR`]. An unset variable
    /// yields a factory with no plugins.
    pub fn from_env(logger: SharedLogger) -> Self {
        let search_paths = match std::env::var_os(PLUGIN_PATH_ENV_VAR) {
            Some(paths) => paths,
            None => {
                logger.warning(&format!(
                    "PluginSystemManagerFactory: {} is not set; no manager plugins will be found",
                    PLUGIN_PATH_ENV_VAR
                ));
                OsString::new()
            }
        };
        Self::new(search_paths, logger)
    }

    fn with_registry(search_paths: OsString, registry: PluginRegistry, logger: SharedLogger) -> Self {
        Self {
            search_paths,
            state: Mutex::new(ScanState { registry, scanned: false }),
            compatibility: VersionCompatibilityChecker::current(),
            logger,
        }
    }

    /// Override the API version plugins are checked against
    pub fn with_compatibility(mut self, compatibility: VersionCompatibilityChecker) -> Self {
        self.compatibility = compatibility;
        self
    }

    pub fn search_paths(&self) -> &OsString {
        &self.search_paths
    }

    /// Forget scanned plugins; the next call scans again
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.registry.reset();
        state.scanned = false;
    }

    fn ensure_scanned(&self, state: &mut ScanState) {
        if state.scanned {
            return;
        }
        let compatibility = self.compatibility;
        let validate = move |plugin: &dyn PluginSystemPlugin| -> std::result::Result<(), String> {
            if plugin.as_manager_plugin().is_none() {
                return Err("not a manager plugin".to_string());
            }
            compatibility
                .check_plugin_compatibility(plugin.api_version())
                .map_err(|e| match e {
                    Error::Configuration { message } => message,
                    other => other.to_string(),
                })
        };
        state.registry.scan(&self.search_paths, MANAGER_PLUGIN_ENTRY_POINT, &validate);
        state.scanned = true;
    }
}

impl ManagerImplementationFactory for PluginSystemManagerFactory {
    fn identifiers(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        self.ensure_scanned(&mut state);
        Ok(state.registry.identifiers())
    }

    fn instantiate(&self, identifier: &str) -> Result<BoxedManagerInterface> {
        let mut state = self.state.lock();
        self.ensure_scanned(&mut state);

        let record = state.registry.plugin(identifier)?;
        let manager_plugin = record.plugin.as_manager_plugin().ok_or_else(|| {
            Error::input_validation(format!("Plugin '{}' is not a manager plugin", identifier))
        })?;

        self.logger.debug_api(&format!(
            "PluginSystemManagerFactory: Instantiating '{}' from '{}'",
            identifier,
            record.path.display()
        ));
        Ok(manager_plugin.interface())
    }
}

/// Constructor of an in-process manager
pub type ManagerConstructor = Arc<dyn Fn() -> BoxedManagerInterface + Send + Sync>;

/// Factory of managers compiled into the host
pub struct BuiltinManagerFactory {
    constructors: BTreeMap<String, ManagerConstructor>,
    logger: SharedLogger,
}

impl BuiltinManagerFactory {
    pub fn new(logger: SharedLogger) -> Self {
        Self { constructors: BTreeMap::new(), logger }
    }

    /// Factory providing the managers bundled with this crate
    pub fn with_bundled_managers(logger: SharedLogger) -> Self {
        let mut factory = Self::new(logger);
        factory.constructors.insert(
            crate::managers::library::LIBRARY_MANAGER_IDENTIFIER.to_string(),
            Arc::new(|| Box::new(crate::managers::LibraryManager::new()) as BoxedManagerInterface),
        );
        factory
    }

    /// Register a constructor. Identifiers must be unique.
    pub fn register<F>(&mut self, identifier: &str, constructor: F) -> Result<()>
    where
        F: Fn() -> BoxedManagerInterface + Send + Sync + 'static,
    {
        if self.constructors.contains_key(identifier) {
            return Err(Error::configuration(format!(
                "Builtin manager '{}' is already registered",
                identifier
            )));
        }
        self.logger.debug(&format!("BuiltinManagerFactory: Registered '{}'", identifier));
        self.constructors.insert(identifier.to_string(), Arc::new(constructor));
        Ok(())
    }
}

impl ManagerImplementationFactory for BuiltinManagerFactory {
    fn identifiers(&self) -> Result<Vec<String>> {
        Ok(self.constructors.keys().cloned().collect())
    }

    fn instantiate(&self, identifier: &str) -> Result<BoxedManagerInterface> {
        let constructor = self
            .constructors
            .get(identifier)
            .ok_or_else(|| Error::input_validation(format!("Builtin manager '{}' is not registered", identifier)))?;
        Ok(constructor())
    }
}

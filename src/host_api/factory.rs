//! Host Manager Factory
//!
//! Lists the managers available to a host and creates [`Manager`]s from
//! any [`ManagerImplementationFactory`], including the configured default
//! manager.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::DefaultManagerConfig;
use crate::context::{HostInterface, HostSession};
use crate::errors::Result;
use crate::logger::SharedLogger;
use crate::plugin_system::SharedManagerFactory;
use crate::trait_data::InfoDictionary;

use super::manager::Manager;

/// Summary of an available manager
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerDetail {
    pub identifier: String,
    pub display_name: String,
    pub info: InfoDictionary,
}

/// Creates host-facing managers
pub struct ManagerFactory {
    host_session: HostSession,
    factory: SharedManagerFactory,
}

impl ManagerFactory {
    pub fn new(host: Arc<dyn HostInterface>, factory: SharedManagerFactory, logger: SharedLogger) -> Self {
        Self { host_session: HostSession::new(host, logger), factory }
    }

    pub fn host_session(&self) -> &HostSession {
        &self.host_session
    }

    pub fn identifiers(&self) -> Result<Vec<String>> {
        self.factory.identifiers()
    }

    /// Details of every available manager. Each is instantiated, but not
    /// initialized, to query it.
    pub fn available_managers(&self) -> Result<BTreeMap<String, ManagerDetail>> {
        let mut details = BTreeMap::new();
        for identifier in self.factory.identifiers()? {
            let interface = self.factory.instantiate(&identifier)?;
            details.insert(
                identifier.clone(),
                ManagerDetail {
                    identifier,
                    display_name: interface.display_name(),
                    info: interface.info(),
                },
            );
        }
        Ok(details)
    }

    /// An uninitialized manager
    pub fn create_manager(&self, identifier: &str) -> Result<Manager> {
        let interface = self.factory.instantiate(identifier)?;
        Ok(Manager::new(interface, self.host_session.clone()))
    }

    /// Create and initialize a manager
    pub fn create_initialized_manager(&self, identifier: &str, settings: InfoDictionary) -> Result<Manager> {
        let mut manager = self.create_manager(identifier)?;
        manager.initialize(settings)?;
        Ok(manager)
    }

    /// The manager named by the default manager config file in
    /// `$ASSETIO_DEFAULT_CONFIG`, initialized with its settings. `None`
    /// when no default is configured.
    pub fn default_manager(&self) -> Result<Option<Manager>> {
        match DefaultManagerConfig::from_env()? {
            Some(config) => self.manager_from_config(&config).map(Some),
            None => {
                self.host_session
                    .logger()
                    .debug("ManagerFactory: No default manager configured");
                Ok(None)
            }
        }
    }

    /// The manager named by a default manager config file
    pub fn default_manager_from_file(&self, path: &Path) -> Result<Manager> {
        self.manager_from_config(&DefaultManagerConfig::load(path)?)
    }

    fn manager_from_config(&self, config: &DefaultManagerConfig) -> Result<Manager> {
        self.host_session.logger().debug(&format!(
            "ManagerFactory: Default manager '{}' from '{}'",
            config.identifier,
            config.path.display()
        ));
        self.create_initialized_manager(&config.identifier, config.settings.clone())
    }
}

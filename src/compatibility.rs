//! Version Compatibility Checker
//!
//! Validates the API version a plugin was built against.

use crate::errors::{Error, Result};
use crate::version::version_to_date_string;

/// Checker for plugin API version compatibility
#[derive(Debug, Clone, Copy)]
pub struct VersionCompatibilityChecker {
    /// Current API version
    api_version: u32,
}

impl VersionCompatibilityChecker {
    /// Create a new version compatibility checker
    pub fn new(api_version: u32) -> Self {
        Self { api_version }
    }

    /// Checker for the version this crate was built with
    pub fn current() -> Self {
        Self::new(crate::version::get_api_version())
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Check if a plugin API version is compatible
    pub fn is_api_compatible(&self, plugin_api_version: u32) -> bool {
        // Same major version (year) is compatible
        self.get_major_version(self.api_version) == self.get_major_version(plugin_api_version)
    }

    /// Get major version (year) from API version
    pub fn get_major_version(&self, api_version: u32) -> u32 {
        api_version / 10000
    }

    /// Check a plugin's API version against the host's
    pub fn check_plugin_compatibility(&self, plugin_api_version: u32) -> Result<()> {
        if !self.is_api_compatible(plugin_api_version) {
            return Err(Error::configuration(format!(
                "built against API version {} but the host uses {}",
                version_to_date_string(plugin_api_version),
                version_to_date_string(self.api_version)
            )));
        }
        Ok(())
    }
}

impl Default for VersionCompatibilityChecker {
    fn default() -> Self {
        Self::current()
    }
}

//! Tests for Plugin Registry
//!
//! Scanning, precedence between search path entries, and rejection of bad
//! candidates.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use super::mock_plugins::*;
use crate::logger::testing::RecordingLogger;
use crate::logger::{Severity, SharedLogger};
use crate::plugin_system::plugin::{PluginSystemPlugin, MANAGER_PLUGIN_ENTRY_POINT};
use crate::plugin_system::registry::PluginRegistry;

fn accept_all(_plugin: &dyn PluginSystemPlugin) -> std::result::Result<(), String> {
    Ok(())
}

fn registry_with(loader: FakeLoader) -> (PluginRegistry, Arc<RecordingLogger>) {
    let logger = RecordingLogger::new();
    let shared: SharedLogger = logger.clone();
    (PluginRegistry::with_loader(Arc::new(loader), shared), logger)
}

#[test]
fn test_scan_registers_plugins() {
    let dir = TempDir::new().unwrap();
    touch_libraries(dir.path(), &["pluginFoo", "pluginBar"]);

    let (mut registry, _logger) = registry_with(full_loader());
    let registered = registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all);

    assert_eq!(registered, 2);
    assert_eq!(registry.identifiers(), vec!["x.bar".to_string(), "x.foo".to_string()]);
    assert_eq!(registry.plugin("x.bar").unwrap().identifier, "x.bar");
}

#[test]
fn test_earlier_directory_wins() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let foo_a = touch_libraries(dir_a.path(), &["pluginFoo"]).remove(0);
    let foo_b = touch_libraries(dir_b.path(), &["pluginFoo2"]).remove(0);

    let search_path = std::env::join_paths([dir_a.path(), dir_b.path()]).unwrap();
    let (mut registry, logger) = registry_with(full_loader());
    registry.scan(&search_path, MANAGER_PLUGIN_ENTRY_POINT, &accept_all);

    assert_eq!(registry.identifiers(), vec!["x.foo".to_string()]);
    assert_eq!(registry.plugin("x.foo").unwrap().path, foo_a);
    assert!(logger.contains(Severity::Warning, &foo_b.display().to_string()));
    assert!(logger.contains(Severity::Warning, "already registered"));

    // Reversed search order reverses the winner
    let reversed = std::env::join_paths([dir_b.path(), dir_a.path()]).unwrap();
    let (mut registry, _logger) = registry_with(full_loader());
    registry.scan(&reversed, MANAGER_PLUGIN_ENTRY_POINT, &accept_all);
    assert_eq!(registry.plugin("x.foo").unwrap().path, foo_b);
}

#[test]
fn test_rescan_registers_nothing_new() {
    let dir = TempDir::new().unwrap();
    touch_libraries(dir.path(), &["pluginFoo", "pluginBar"]);

    let (mut registry, _logger) = registry_with(full_loader());
    assert_eq!(registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all), 2);
    let first = registry.identifiers();
    let first_path = registry.plugin("x.foo").unwrap().path.clone();

    assert_eq!(registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all), 0);
    assert_eq!(registry.identifiers(), first);
    assert_eq!(registry.plugin("x.foo").unwrap().path, first_path);
    assert_eq!(registry.library_count(), 2);
}

#[test]
fn test_bad_candidates_are_skipped() {
    let dir = TempDir::new().unwrap();
    touch_libraries(
        dir.path(),
        &[
            "pluginFoo",
            "missingSymbol",
            "null",
            "failingIdentifier",
            "panickingIdentifier",
            "corrupt",
        ],
    );
    fs::write(dir.path().join("README.txt"), b"docs").unwrap();
    fs::create_dir(dir.path().join(library_file_name("nested"))).unwrap();

    let loader = full_loader();
    let (mut registry, logger) = registry_with(loader);
    let registered = registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all);

    assert_eq!(registered, 1);
    assert_eq!(registry.identifiers(), vec!["x.foo".to_string()]);

    assert!(logger.contains(Severity::Warning, "entry point"));
    assert!(logger.contains(Severity::Warning, "returned null"));
    assert!(logger.contains(Severity::Warning, "identifier unavailable"));
    assert!(logger.contains(Severity::Warning, "panic while querying identifier"));
    assert!(logger.contains(Severity::Warning, "could not open library"));
    assert!(logger.contains(Severity::Debug, "README.txt"));
    assert!(logger.contains(Severity::Debug, "not a file"));

    // The directory and README are never opened; every library file is
    assert_eq!(registry.library_count(), 5);
}

#[test]
fn test_validator_rejection() {
    let dir = TempDir::new().unwrap();
    touch_libraries(dir.path(), &["pluginFoo", "nonManager"]);

    let managers_only = |plugin: &dyn PluginSystemPlugin| -> std::result::Result<(), String> {
        plugin.as_manager_plugin().map(|_| ()).ok_or_else(|| "not a manager plugin".to_string())
    };

    let (mut registry, logger) = registry_with(full_loader());
    registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &managers_only);

    assert_eq!(registry.identifiers(), vec!["x.foo".to_string()]);
    assert!(logger.contains(Severity::Warning, "plugin 'x.other' rejected: not a manager plugin"));
}

#[test]
fn test_reset_keeps_libraries_loaded() {
    let dir = TempDir::new().unwrap();
    touch_libraries(dir.path(), &["pluginFoo", "pluginBar"]);

    let (mut registry, _logger) = registry_with(full_loader());
    registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all);
    assert_eq!(registry.library_count(), 2);

    registry.reset();
    assert_eq!(registry.plugin_count(), 0);
    assert_eq!(registry.library_count(), 2);

    let error = registry.plugin("x.foo").unwrap_err();
    assert!(error.is_precondition_error());
    assert!(!error.is_configuration_error());

    // A fresh scan registers the plugins again
    assert_eq!(registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all), 2);
}

#[test]
fn test_rescan_after_reset_reuses_open_libraries() {
    let dir = TempDir::new().unwrap();
    touch_libraries(dir.path(), &["pluginFoo", "pluginBar"]);

    let loader = Arc::new(full_loader());
    let mut registry = PluginRegistry::with_loader(loader.clone(), crate::logger::LogFacadeLogger::shared());

    for _ in 0..3 {
        registry.reset();
        assert_eq!(registry.scan(dir.path().as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all), 2);
    }

    assert_eq!(loader.opened().len(), 2);
    assert_eq!(registry.library_count(), 2);
    assert_eq!(registry.identifiers(), vec!["x.bar".to_string(), "x.foo".to_string()]);
}

#[test]
fn test_empty_and_missing_search_paths() {
    let (mut registry, logger) = registry_with(full_loader());

    assert_eq!(registry.scan(std::ffi::OsStr::new(""), MANAGER_PLUGIN_ENTRY_POINT, &accept_all), 0);

    let missing = TempDir::new().unwrap().path().join("gone");
    assert_eq!(registry.scan(missing.as_os_str(), MANAGER_PLUGIN_ENTRY_POINT, &accept_all), 0);
    assert!(logger.contains(Severity::Debug, "not a searchable directory"));
    assert!(registry.identifiers().is_empty());
}

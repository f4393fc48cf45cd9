//! Plugin System
//!
//! Discovery of manager plugins in native libraries, and composition of
//! manager implementations from several sources.

pub mod composite;
pub mod factory;
pub mod hybrid;
pub mod native;
pub mod plugin;
pub mod registry;

#[cfg(test)]
mod tests;

pub use composite::CompositeManagerInterface;
pub use factory::{
    BuiltinManagerFactory, ManagerConstructor, ManagerImplementationFactory, PluginSystemManagerFactory,
    SharedManagerFactory, PLUGIN_PATH_ENV_VAR,
};
pub use hybrid::HybridManagerFactory;
pub use native::{DylibLoader, NativeLibrary, NativeLibraryLoader, SharedLibrary, SHARED_LIBRARY_EXTENSION};
pub use plugin::{
    from_raw_plugin, into_raw_plugin, BoxedPlugin, ManagerPlugin, PluginEntryPointFn, PluginFactoryFn,
    PluginSystemPlugin, RawPluginPtr, MANAGER_PLUGIN_ENTRY_POINT,
};
pub use registry::{PluginRecord, PluginRegistry, PluginValidator};

//! Plugin Traits and Entry Point Contract
//!
//! A plugin library exports one C-linkage function whose name depends on the
//! plugin kind ([`MANAGER_PLUGIN_ENTRY_POINT`] for manager plugins). It takes
//! no arguments and returns a [`PluginFactoryFn`]; calling that factory
//! yields an owned plugin instance as a [`RawPluginPtr`].
//!
//! Neither function may unwind. Nothing is caught across this boundary, so
//! plugin authors must not let a panic escape either call. The
//! [`export_manager_plugin!`](crate::export_manager_plugin) macro generates
//! both functions.
//!
//! Plugins hand trait objects across the boundary, so plugin and host must
//! be built with the same compiler and a compatible version of this crate.
//! The API version reported by [`PluginSystemPlugin::api_version`] is
//! checked at load time.

use std::ffi::c_void;

use crate::errors::Result;
use crate::manager_api::BoxedManagerInterface;

/// Name of the entry point exported by manager plugin libraries
pub const MANAGER_PLUGIN_ENTRY_POINT: &str = "assetio_manager_plugin";

/// Raw pointer to a heap allocated [`BoxedPlugin`]
pub type RawPluginPtr = *mut c_void;

/// Function signature of the plugin factory
pub type PluginFactoryFn = unsafe extern "C" fn() -> RawPluginPtr;

/// Function signature of the exported entry point
pub type PluginEntryPointFn = unsafe extern "C" fn() -> PluginFactoryFn;

/// Base trait of every plugin
pub trait PluginSystemPlugin: Send + Sync {
    /// Unique identifier the plugin is registered under
    fn identifier(&self) -> Result<String>;

    /// API version the plugin was compiled against. The default body is
    /// compiled into the plugin, so it reports the plugin's build.
    fn api_version(&self) -> u32 {
        crate::version::API_VERSION
    }

    /// Cast to ManagerPlugin if this plugin implements that trait
    fn as_manager_plugin(&self) -> Option<&dyn ManagerPlugin> {
        None
    }
}

/// Plugin providing manager implementations
pub trait ManagerPlugin: PluginSystemPlugin {
    /// A fresh, uninitialized manager instance on every call
    fn interface(&self) -> BoxedManagerInterface;
}

/// Owned plugin instance
pub type BoxedPlugin = Box<dyn PluginSystemPlugin>;

/// Move a plugin onto the heap behind a thin pointer suitable for returning
/// from a [`PluginFactoryFn`]
pub fn into_raw_plugin(plugin: BoxedPlugin) -> RawPluginPtr {
    Box::into_raw(Box::new(plugin)) as RawPluginPtr
}

/// Take ownership of a pointer produced by [`into_raw_plugin`].
///
/// # Safety
///
/// `ptr` must be null or have been returned by [`into_raw_plugin`] and not
/// yet reclaimed.
pub unsafe fn from_raw_plugin(ptr: RawPluginPtr) -> Option<BoxedPlugin> {
    if ptr.is_null() {
        return None;
    }
    Some(*Box::from_raw(ptr as *mut BoxedPlugin))
}

/// Declare the manager plugin entry point of a plugin library.
///
/// ```rust,ignore
/// use assetio::plugin_system::{ManagerPlugin, PluginSystemPlugin};
///
/// struct MyPlugin;
///
/// impl PluginSystemPlugin for MyPlugin {
///     fn identifier(&self) -> assetio::Result<String> { Ok("org.example.my".into()) }
///     fn as_manager_plugin(&self) -> Option<&dyn ManagerPlugin> { Some(self) }
/// }
///
/// impl ManagerPlugin for MyPlugin {
///     fn interface(&self) -> assetio::manager_api::BoxedManagerInterface { Box::new(MyManager::new()) }
/// }
///
/// assetio::export_manager_plugin!(MyPlugin, || MyPlugin);
/// ```
#[macro_export]
macro_rules! export_manager_plugin {
    ($plugin_type:ty, $constructor:expr) => {
        unsafe extern "C" fn __assetio_manager_plugin_factory() -> $crate::plugin_system::RawPluginPtr {
            let plugin: $plugin_type = ($constructor)();
            $crate::plugin_system::into_raw_plugin(::std::boxed::Box::new(plugin))
        }

        #[no_mangle]
        pub unsafe extern "C" fn assetio_manager_plugin() -> $crate::plugin_system::PluginFactoryFn {
            __assetio_manager_plugin_factory
        }
    };
}

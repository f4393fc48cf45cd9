//! Native library loading using libloading.
//!
//! The loader reports failures as human-readable strings rather than
//! errors: a bad candidate in a search path is an expected condition that
//! the registry logs and skips.

use std::mem::ManuallyDrop;
use std::path::Path;
use std::sync::Arc;

use libloading::{Library, Symbol};

use super::plugin::PluginEntryPointFn;

/// File extension of shared libraries on this platform
pub const SHARED_LIBRARY_EXTENSION: &str = std::env::consts::DLL_EXTENSION;

/// Check if a path carries the platform's shared library extension
pub fn has_shared_library_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SHARED_LIBRARY_EXTENSION)
}

/// An opened library
pub trait NativeLibrary: Send + Sync {
    /// Look up a plugin entry point by symbol name
    fn entry_point(&self, symbol: &str) -> Result<PluginEntryPointFn, String>;
}

/// Shared handle to an opened library
pub type SharedLibrary = Arc<dyn NativeLibrary>;

/// Opens candidate libraries for the registry
pub trait NativeLibraryLoader: Send + Sync {
    fn open(&self, path: &Path) -> Result<SharedLibrary, String>;

    /// Check if a file is worth opening
    fn is_candidate(&self, path: &Path) -> bool {
        has_shared_library_extension(path)
    }
}

/// Loader for real shared libraries (`dlopen`/`LoadLibrary`)
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl DylibLoader {
    pub fn new() -> Self {
        Self
    }
}

impl NativeLibraryLoader for DylibLoader {
    fn open(&self, path: &Path) -> Result<SharedLibrary, String> {
        // Loading runs the library's initialisers; only trusted paths should
        // be on the search path.
        let library = unsafe { Library::new(path) }.map_err(|e| e.to_string())?;
        Ok(Arc::new(DylibLibrary { library: ManuallyDrop::new(library) }))
    }
}

/// A library that is never closed.
///
/// Objects created by a plugin carry code and vtables that live in its
/// library, and they may outlive the registry that loaded it.
struct DylibLibrary {
    library: ManuallyDrop<Library>,
}

impl NativeLibrary for DylibLibrary {
    fn entry_point(&self, symbol: &str) -> Result<PluginEntryPointFn, String> {
        let entry: Symbol<PluginEntryPointFn> =
            unsafe { self.library.get(symbol.as_bytes()) }.map_err(|e| e.to_string())?;
        Ok(*entry)
    }
}

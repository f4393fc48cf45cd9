//! Bundled Managers
//!
//! Managers compiled into the crate and offered through
//! [`BuiltinManagerFactory::with_bundled_managers`](crate::plugin_system::BuiltinManagerFactory::with_bundled_managers).

pub mod library;

pub use library::{LibraryData, LibraryManager, LIBRARY_MANAGER_IDENTIFIER};

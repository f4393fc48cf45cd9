//! Asset manager middleware
//!
//! Hosts talk to asset managers through [`host_api::Manager`]. Managers are
//! discovered as native plugins ([`plugin_system::PluginSystemManagerFactory`]),
//! compiled in ([`plugin_system::BuiltinManagerFactory`]), or composed from
//! several sources ([`plugin_system::HybridManagerFactory`]). Every manager
//! implements [`manager_api::ManagerInterface`], a batch protocol with
//! per-element success and error callbacks.

pub mod access;
pub mod app;
pub mod cli;
pub mod compatibility;
pub mod config;
pub mod context;
pub mod entity_reference;
pub mod errors;
pub mod host_api;
pub mod logger;
pub mod logging;
pub mod manager_api;
pub mod managers;
pub mod plugin_system;
pub mod trait_data;
pub mod version;

pub use access::{
    DefaultEntityAccess, EntityTraitsAccess, PolicyAccess, PublishingAccess, RelationsAccess,
    ResolveAccess,
};
pub use context::{Context, HostDescriptor, HostInterface, HostSession, ManagerState, ManagerStateHandle};
pub use entity_reference::EntityReference;
pub use errors::{BatchElementError, Error, ErrorCode, Result};
pub use host_api::{BatchResult, Manager, ManagerFactory};
pub use logger::{LogFacadeLogger, LoggerInterface, Severity, SharedLogger};
pub use manager_api::{BoxedManagerInterface, Capability, CapabilitySet, ManagerInterface};
pub use trait_data::{trait_set, InfoDictionary, PropertyValue, TraitSet, TraitsData};

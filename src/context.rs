//! Call Context and Host Session

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::logger::{LoggerInterface, SharedLogger};
use crate::trait_data::{InfoDictionary, TraitsData};

/// Describes the host application to managers
pub trait HostInterface: Send + Sync {
    fn identifier(&self) -> String;

    fn display_name(&self) -> String;

    fn info(&self) -> InfoDictionary {
        InfoDictionary::new()
    }
}

/// Simple value-based [`HostInterface`]
#[derive(Debug, Clone)]
pub struct HostDescriptor {
    pub identifier: String,
    pub display_name: String,
    pub info: InfoDictionary,
}

impl HostDescriptor {
    pub fn new<S: Into<String>, D: Into<String>>(identifier: S, display_name: D) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            info: InfoDictionary::new(),
        }
    }
}

impl HostInterface for HostDescriptor {
    fn identifier(&self) -> String {
        self.identifier.clone()
    }

    fn display_name(&self) -> String {
        self.display_name.clone()
    }

    fn info(&self) -> InfoDictionary {
        self.info.clone()
    }
}

/// Per-host state passed to every manager call
#[derive(Clone)]
pub struct HostSession {
    host: Arc<dyn HostInterface>,
    logger: SharedLogger,
}

impl HostSession {
    pub fn new(host: Arc<dyn HostInterface>, logger: SharedLogger) -> Self {
        Self { host, logger }
    }

    pub fn host(&self) -> &dyn HostInterface {
        self.host.as_ref()
    }

    pub fn logger(&self) -> &dyn LoggerInterface {
        self.logger.as_ref()
    }

    pub fn shared_logger(&self) -> SharedLogger {
        Arc::clone(&self.logger)
    }
}

impl fmt::Debug for HostSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSession")
            .field("host", &self.host.identifier())
            .finish()
    }
}

/// Opaque manager-defined state carried by a [`Context`]
pub trait ManagerState: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Shared manager state handle
pub type ManagerStateHandle = Arc<dyn ManagerState>;

/// Calling context for a batch operation
#[derive(Clone, Default)]
pub struct Context {
    /// Describes the host-side situation of the call
    pub locale: TraitsData,
    /// State created by the manager via `create_state`
    pub manager_state: Option<ManagerStateHandle>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(locale: TraitsData) -> Self {
        Self { locale, manager_state: None }
    }

    /// Downcast the manager state to a concrete type
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.manager_state
            .as_ref()
            .and_then(|state| state.as_any().downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("locale", &self.locale)
            .field("has_manager_state", &self.manager_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Token(u32);

    impl ManagerState for Token {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_state_downcast() {
        let mut context = Context::new();
        assert!(context.state::<Token>().is_none());
        context.manager_state = Some(Arc::new(Token(7)));
        assert_eq!(context.state::<Token>().map(|t| t.0), Some(7));
        assert!(context.state::<String>().is_none());
    }
}

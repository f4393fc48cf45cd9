//! Diagnostics Boundary
//!
//! Discovery and composition decisions are reported through a
//! [`LoggerInterface`]. Reporting is advisory and never alters control flow.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Log severity, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    DebugApi,
    Debug,
    Info,
    Progress,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::DebugApi => "debugApi",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Progress => "progress",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// The `log` crate level a severity is emitted at
    pub fn log_level(&self) -> log::Level {
        match self {
            Severity::DebugApi => log::Level::Trace,
            Severity::Debug => log::Level::Debug,
            Severity::Info | Severity::Progress => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error | Severity::Critical => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Leveled logger used by the plugin system and handed to managers via the
/// host session
pub trait LoggerInterface: Send + Sync {
    fn log(&self, severity: Severity, message: &str);

    /// Check if messages of the given severity will be recorded. Callers may
    /// use this to skip building expensive messages.
    fn is_severity_logged(&self, _severity: Severity) -> bool {
        true
    }

    fn debug_api(&self, message: &str) {
        self.log(Severity::DebugApi, message);
    }

    fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    fn progress(&self, message: &str) {
        self.log(Severity::Progress, message);
    }

    fn warning(&self, message: &str) {
        self.log(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    fn critical(&self, message: &str) {
        self.log(Severity::Critical, message);
    }
}

/// Shared logger handle
pub type SharedLogger = Arc<dyn LoggerInterface>;

/// Forwards to the `log` facade, so messages end up in whatever backend the
/// process installed (see [`crate::logging`])
#[derive(Debug, Clone)]
pub struct LogFacadeLogger {
    target: String,
}

impl LogFacadeLogger {
    pub fn new() -> Self {
        Self::with_target("assetio")
    }

    pub fn with_target<S: Into<String>>(target: S) -> Self {
        Self { target: target.into() }
    }

    /// Convenience constructor for the shared handle most APIs take
    pub fn shared() -> SharedLogger {
        Arc::new(Self::new())
    }
}

impl Default for LogFacadeLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerInterface for LogFacadeLogger {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Critical => log::log!(target: &self.target, log::Level::Error, "CRITICAL: {}", message),
            Severity::Progress => log::log!(target: &self.target, log::Level::Info, "progress: {}", message),
            other => log::log!(target: &self.target, other.log_level(), "{}", message),
        }
    }

    fn is_severity_logged(&self, severity: Severity) -> bool {
        severity.log_level() <= log::max_level()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::DebugApi < Severity::Debug);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(Severity::Critical.log_level(), log::Level::Error);
        assert_eq!(Severity::Progress.log_level(), log::Level::Info);
    }

    #[test]
    fn test_convenience_methods_route_severity() {
        let logger = RecordingLogger::new();
        logger.warning("duplicate plugin");
        logger.debug("skipping file");
        assert!(logger.contains(Severity::Warning, "duplicate"));
        assert!(logger.contains(Severity::Debug, "skipping"));
        assert_eq!(logger.messages().len(), 2);
    }
}

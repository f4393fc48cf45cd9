//! Application orchestration module

pub mod execution;
pub mod initialization;

pub use execution::run_command;
pub use initialization::{configure_logging, create_manager_factory, load_configuration};

//! Host API
//!
//! The host side of the middleware: creating managers and calling them.

pub mod factory;
pub mod manager;

pub use factory::{ManagerDetail, ManagerFactory};
pub use manager::{BatchResult, Manager};

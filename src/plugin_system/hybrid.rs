//! Hybrid Manager Factory
//!
//! Combines several factories into one. When more than one child factory
//! provides an identifier, the instances are wrapped in a
//! [`CompositeManagerInterface`] whose priority order is the order the
//! factories were given in.

use std::collections::BTreeSet;

use crate::errors::{Error, Result};
use crate::logger::SharedLogger;
use crate::manager_api::BoxedManagerInterface;

use super::composite::CompositeManagerInterface;
use super::factory::{ManagerImplementationFactory, SharedManagerFactory};

/// Factory composing child factories in priority order
pub struct HybridManagerFactory {
    factories: Vec<SharedManagerFactory>,
    logger: SharedLogger,
}

impl HybridManagerFactory {
    /// Compose `factories`, highest priority first. At least one factory is
    /// required.
    pub fn make(factories: Vec<SharedManagerFactory>, logger: SharedLogger) -> Result<Self> {
        if factories.is_empty() {
            return Err(Error::configuration("HybridManagerFactory requires at least one child factory"));
        }
        Ok(Self { factories, logger })
    }

    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }
}

impl ManagerImplementationFactory for HybridManagerFactory {
    fn identifiers(&self) -> Result<Vec<String>> {
        let mut identifiers = BTreeSet::new();
        for factory in &self.factories {
            identifiers.extend(factory.identifiers()?);
        }
        Ok(identifiers.into_iter().collect())
    }

    fn instantiate(&self, identifier: &str) -> Result<BoxedManagerInterface> {
        let mut matches: Vec<BoxedManagerInterface> = Vec::new();
        for factory in &self.factories {
            if factory.identifiers()?.iter().any(|id| id == identifier) {
                matches.push(factory.instantiate(identifier)?);
            }
        }

        match matches.len() {
            0 => Err(Error::input_validation(format!(
                "Manager '{}' is not provided by any factory",
                identifier
            ))),
            1 => {
                self.logger.debug_api(&format!(
                    "HybridManagerFactory: '{}' provided by a single factory",
                    identifier
                ));
                Ok(matches.remove(0))
            }
            count => {
                self.logger.debug(&format!(
                    "HybridManagerFactory: Composing {} implementations of '{}'",
                    count, identifier
                ));
                Ok(Box::new(CompositeManagerInterface::new(matches)?))
            }
        }
    }
}

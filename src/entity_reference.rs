//! Entity References

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, validated string identifying an entity known to a manager.
///
/// Hosts obtain references through
/// [`Manager::create_entity_reference`](crate::host_api::Manager::create_entity_reference),
/// which checks the string with the owning manager first. Manager
/// implementations construct references directly for strings they have
/// generated themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityReference(String);

/// Ordered list of references, one per batch element
pub type EntityReferences = Vec<EntityReference>;

impl EntityReference {
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

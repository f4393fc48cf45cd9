//! Manager Capabilities
//!
//! A manager advertises optional features as [`Capability`] values. The set
//! is fixed once `initialize` returns, so callers may cache it as a
//! [`CapabilitySet`].

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Optional feature of a manager implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    StatefulContexts,
    CustomTerminology,
    Resolution,
    Publishing,
    RelationshipQueries,
    ExistenceQueries,
    DefaultEntityReferences,
    EntityReferenceIdentification,
    ManagementPolicyQueries,
    EntityTraitIntrospection,
}

impl Capability {
    /// Number of capabilities
    pub const COUNT: usize = 10;

    /// Every capability, in priority order
    pub const ALL: [Capability; Capability::COUNT] = [
        Capability::StatefulContexts,
        Capability::CustomTerminology,
        Capability::Resolution,
        Capability::Publishing,
        Capability::RelationshipQueries,
        Capability::ExistenceQueries,
        Capability::DefaultEntityReferences,
        Capability::EntityReferenceIdentification,
        Capability::ManagementPolicyQueries,
        Capability::EntityTraitIntrospection,
    ];

    /// Capabilities every manager must provide to be usable by a host
    pub const REQUIRED: [Capability; 3] = [
        Capability::EntityReferenceIdentification,
        Capability::ManagementPolicyQueries,
        Capability::EntityTraitIntrospection,
    ];

    /// Position in [`Capability::ALL`], usable as a dense array index
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Stable label used in diagnostics and configuration
    pub fn label(&self) -> &'static str {
        match self {
            Capability::StatefulContexts => "statefulContexts",
            Capability::CustomTerminology => "customTerminology",
            Capability::Resolution => "resolution",
            Capability::Publishing => "publishing",
            Capability::RelationshipQueries => "relationshipQueries",
            Capability::ExistenceQueries => "existenceQueries",
            Capability::DefaultEntityReferences => "defaultEntityReferences",
            Capability::EntityReferenceIdentification => "entityReferenceIdentification",
            Capability::ManagementPolicyQueries => "managementPolicyQueries",
            Capability::EntityTraitIntrospection => "entityTraitIntrospection",
        }
    }

    pub fn flag(&self) -> CapabilitySet {
        CapabilitySet::from_bits_truncate(1 << self.index())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

bitflags! {
    /// Combinable set of capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CapabilitySet: u32 {
        const STATEFUL_CONTEXTS = 1 << 0;
        const CUSTOM_TERMINOLOGY = 1 << 1;
        const RESOLUTION = 1 << 2;
        const PUBLISHING = 1 << 3;
        const RELATIONSHIP_QUERIES = 1 << 4;
        const EXISTENCE_QUERIES = 1 << 5;
        const DEFAULT_ENTITY_REFERENCES = 1 << 6;
        const ENTITY_REFERENCE_IDENTIFICATION = 1 << 7;
        const MANAGEMENT_POLICY_QUERIES = 1 << 8;
        const ENTITY_TRAIT_INTROSPECTION = 1 << 9;
    }
}

impl CapabilitySet {
    /// Build a set from a capability predicate, typically
    /// `|c| interface.has_capability(c)`
    pub fn collect<F: Fn(Capability) -> bool>(has_capability: F) -> Self {
        Capability::ALL
            .iter()
            .filter(|c| has_capability(**c))
            .fold(CapabilitySet::empty(), |set, c| set | c.flag())
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.contains(capability.flag())
    }

    /// Capabilities of the set, in priority order
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL.iter().filter(|c| self.has(**c)).copied().collect()
    }
}

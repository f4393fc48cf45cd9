//! Composite Manager Interface
//!
//! Several implementations of one logical manager, held in priority order.
//! Each capability-gated operation is routed to the first child that
//! declared the capability when the composite was initialized. Operations
//! with no bound child fall back to the protocol defaults.

use std::fmt;

use crate::access::{
    DefaultEntityAccess, EntityTraitsAccess, PolicyAccess, PublishingAccess, RelationsAccess,
    ResolveAccess,
};
use crate::context::{Context, HostSession, ManagerStateHandle};
use crate::entity_reference::EntityReference;
use crate::errors::{Error, Result};
use crate::manager_api::{
    defaults, BoxedManagerInterface, BoxedPager, Capability, ErrorCallback, ManagerInterface, StrMap,
    SuccessCallback,
};
use crate::trait_data::{InfoDictionary, TraitSet, TraitsData};

/// Capability to child index
type CapabilityMap = [Option<usize>; Capability::COUNT];

/// Manager interface dispatching to prioritized children
pub struct CompositeManagerInterface {
    children: Vec<BoxedManagerInterface>,
    /// Set once, by the first `initialize`
    capability_map: Option<CapabilityMap>,
}

impl CompositeManagerInterface {
    /// Children are given highest priority first
    pub fn new(children: Vec<BoxedManagerInterface>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::configuration("A composite manager needs at least one child"));
        }
        Ok(Self { children, capability_map: None })
    }

    pub fn children(&self) -> &[BoxedManagerInterface] {
        &self.children
    }

    /// Index of the child an operation gated by `capability` is routed to.
    /// `None` before initialization or when no child declared it.
    pub fn bound_child(&self, capability: Capability) -> Option<usize> {
        self.capability_map.as_ref().and_then(|map| map[capability.index()])
    }

    fn bound(&self, capability: Capability) -> Option<&dyn ManagerInterface> {
        self.bound_child(capability).map(|idx| self.children[idx].as_ref())
    }

    fn primary(&self) -> &dyn ManagerInterface {
        self.children[0].as_ref()
    }

    fn build_capability_map(&self, host_session: &HostSession) -> CapabilityMap {
        let logger = host_session.logger();
        let mut map: CapabilityMap = [None; Capability::COUNT];

        for capability in Capability::ALL {
            map[capability.index()] = self.children.iter().position(|child| child.has_capability(capability));

            match map[capability.index()] {
                Some(idx) => logger.debug_api(&format!(
                    "CompositeManagerInterface: '{}' bound to child {} of {}",
                    capability,
                    idx,
                    self.children.len()
                )),
                None => logger.debug_api(&format!(
                    "CompositeManagerInterface: '{}' not provided by any child",
                    capability
                )),
            }
        }
        map
    }
}

impl fmt::Debug for CompositeManagerInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeManagerInterface")
            .field("children", &self.children.len())
            .field("capability_map", &self.capability_map)
            .finish()
    }
}

/// Merge dictionaries, earlier entries winning on key collision
fn merge_first_wins(dictionaries: impl Iterator<Item = InfoDictionary>) -> InfoDictionary {
    let mut merged = InfoDictionary::new();
    for dictionary in dictionaries {
        for (key, value) in dictionary {
            merged.entry(key).or_insert(value);
        }
    }
    merged
}

impl ManagerInterface for CompositeManagerInterface {
    fn identifier(&self) -> String {
        self.primary().identifier()
    }

    fn display_name(&self) -> String {
        self.primary().display_name()
    }

    fn info(&self) -> InfoDictionary {
        merge_first_wins(self.children.iter().map(|child| child.info()))
    }

    fn settings(&self, host_session: &HostSession) -> Result<InfoDictionary> {
        let mut all = Vec::with_capacity(self.children.len());
        for child in &self.children {
            all.push(child.settings(host_session)?);
        }
        Ok(merge_first_wins(all.into_iter()))
    }

    fn initialize(&mut self, settings: InfoDictionary, host_session: &HostSession) -> Result<()> {
        for child in self.children.iter_mut() {
            child.initialize(settings.clone(), host_session)?;
        }
        if self.capability_map.is_none() {
            self.capability_map = Some(self.build_capability_map(host_session));
        }
        Ok(())
    }

    fn flush_caches(&self, host_session: &HostSession) -> Result<()> {
        for child in &self.children {
            child.flush_caches(host_session)?;
        }
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.bound_child(capability).is_some()
    }

    fn management_policy(
        &self,
        trait_sets: &[TraitSet],
        access: PolicyAccess,
        context: &Context,
        host_session: &HostSession,
    ) -> Result<Vec<TraitsData>> {
        match self.bound(Capability::ManagementPolicyQueries) {
            Some(child) => child.management_policy(trait_sets, access, context, host_session),
            None => Err(defaults::not_implemented(&self.identifier(), "management_policy")),
        }
    }

    fn is_entity_reference_string(&self, candidate: &str, host_session: &HostSession) -> bool {
        match self.bound(Capability::EntityReferenceIdentification) {
            Some(child) => child.is_entity_reference_string(candidate, host_session),
            None => false,
        }
    }

    fn entity_exists(
        &self,
        entity_references: &[EntityReference],
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, bool>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::ExistenceQueries) {
            Some(child) => child.entity_exists(entity_references, context, host_session, success, error),
            None => defaults::entity_exists(entity_references, context, host_session, success, error),
        }
    }

    fn entity_traits(
        &self,
        entity_references: &[EntityReference],
        access: EntityTraitsAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, TraitSet>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::EntityTraitIntrospection) {
            Some(child) => child.entity_traits(entity_references, access, context, host_session, success, error),
            None => Err(defaults::not_implemented(&self.identifier(), "entity_traits")),
        }
    }

    fn resolve(
        &self,
        entity_references: &[EntityReference],
        trait_set: &TraitSet,
        access: ResolveAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, TraitsData>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::Resolution) {
            Some(child) => {
                child.resolve(entity_references, trait_set, access, context, host_session, success, error)
            }
            None => Err(defaults::not_implemented(&self.identifier(), "resolve")),
        }
    }

    fn default_entity_reference(
        &self,
        trait_sets: &[TraitSet],
        access: DefaultEntityAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, Option<EntityReference>>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::DefaultEntityReferences) {
            Some(child) => {
                child.default_entity_reference(trait_sets, access, context, host_session, success, error)
            }
            None => defaults::default_entity_reference(trait_sets, access, context, host_session, success, error),
        }
    }

    fn get_with_relationship(
        &self,
        entity_references: &[EntityReference],
        relationship_traits_data: &TraitsData,
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, BoxedPager>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::RelationshipQueries) {
            Some(child) => child.get_with_relationship(
                entity_references,
                relationship_traits_data,
                result_trait_set,
                page_size,
                access,
                context,
                host_session,
                success,
                error,
            ),
            None => defaults::get_with_relationship(
                entity_references,
                relationship_traits_data,
                result_trait_set,
                page_size,
                access,
                context,
                host_session,
                success,
                error,
            ),
        }
    }

    fn get_with_relationships(
        &self,
        entity_reference: &EntityReference,
        relationship_traits_datas: &[TraitsData],
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, BoxedPager>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::RelationshipQueries) {
            Some(child) => child.get_with_relationships(
                entity_reference,
                relationship_traits_datas,
                result_trait_set,
                page_size,
                access,
                context,
                host_session,
                success,
                error,
            ),
            None => defaults::get_with_relationships(
                entity_reference,
                relationship_traits_datas,
                result_trait_set,
                page_size,
                access,
                context,
                host_session,
                success,
                error,
            ),
        }
    }

    fn preflight(
        &self,
        entity_references: &[EntityReference],
        traits_hints: &[TraitsData],
        access: PublishingAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, EntityReference>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::Publishing) {
            Some(child) => {
                child.preflight(entity_references, traits_hints, access, context, host_session, success, error)
            }
            None => Err(defaults::not_implemented(&self.identifier(), "preflight")),
        }
    }

    fn register(
        &self,
        entity_references: &[EntityReference],
        traits_datas: &[TraitsData],
        access: PublishingAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, EntityReference>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        match self.bound(Capability::Publishing) {
            Some(child) => {
                child.register(entity_references, traits_datas, access, context, host_session, success, error)
            }
            None => Err(defaults::not_implemented(&self.identifier(), "register")),
        }
    }

    fn update_terminology(&self, terms: StrMap, host_session: &HostSession) -> Result<StrMap> {
        match self.bound(Capability::CustomTerminology) {
            Some(child) => child.update_terminology(terms, host_session),
            None => defaults::update_terminology(terms, host_session),
        }
    }

    fn create_state(&self, host_session: &HostSession) -> Result<ManagerStateHandle> {
        match self.bound(Capability::StatefulContexts) {
            Some(child) => child.create_state(host_session),
            None => Err(defaults::not_implemented(&self.identifier(), "create_state")),
        }
    }

    fn create_child_state(
        &self,
        parent_state: &ManagerStateHandle,
        host_session: &HostSession,
    ) -> Result<ManagerStateHandle> {
        match self.bound(Capability::StatefulContexts) {
            Some(child) => child.create_child_state(parent_state, host_session),
            None => Err(defaults::not_implemented(&self.identifier(), "create_child_state")),
        }
    }

    fn persistence_token_for_state(
        &self,
        state: &ManagerStateHandle,
        host_session: &HostSession,
    ) -> Result<String> {
        match self.bound(Capability::StatefulContexts) {
            Some(child) => child.persistence_token_for_state(state, host_session),
            None => Err(defaults::not_implemented(&self.identifier(), "persistence_token_for_state")),
        }
    }

    fn state_from_persistence_token(
        &self,
        token: &str,
        host_session: &HostSession,
    ) -> Result<ManagerStateHandle> {
        match self.bound(Capability::StatefulContexts) {
            Some(child) => child.state_from_persistence_token(token, host_session),
            None => Err(defaults::not_implemented(&self.identifier(), "state_from_persistence_token")),
        }
    }
}

//! The Manager Interface
//!
//! Every batch operation takes an ordered list of inputs and two callbacks.
//! Implementations must call exactly one of `success` or `error` for every
//! input index, at most once per index, in any order. A condition that
//! prevents the whole batch from proceeding is reported by calling `error`
//! for every index; a returned `Err` is reserved for catastrophic failures
//! that are not tied to any element.

use std::collections::BTreeMap;

use crate::access::{
    DefaultEntityAccess, EntityTraitsAccess, PolicyAccess, PublishingAccess, RelationsAccess,
    ResolveAccess,
};
use crate::context::{Context, HostSession, ManagerStateHandle};
use crate::entity_reference::EntityReference;
use crate::errors::{BatchElementError, Result};
use crate::manager_api::capability::Capability;
use crate::manager_api::defaults;
use crate::manager_api::pager::BoxedPager;
use crate::trait_data::{InfoDictionary, TraitSet, TraitsData};

/// Per-element success callback
pub type SuccessCallback<'a, T> = &'a mut dyn FnMut(usize, T);

/// Per-element error callback
pub type ErrorCallback<'a> = &'a mut dyn FnMut(usize, BatchElementError);

/// Terminology substitution map
pub type StrMap = BTreeMap<String, String>;

/// Info key under which a manager may advertise a prefix that all of its
/// entity references start with. Hosts use it to validate reference
/// strings without a call into the manager.
pub const INFO_KEY_ENTITY_REFERENCES_MATCH_PREFIX: &str = "entityReferencesMatchPrefix";

/// Interface implemented by asset manager plugins.
///
/// Once `initialize` has returned, every method may be called concurrently
/// from several threads. `initialize` itself is never called concurrently
/// with anything else on the same instance.
///
/// Methods gated by a [`Capability`] have default bodies implementing the
/// protocol's fallback behaviour; see [`defaults`].
#[allow(clippy::too_many_arguments)]
pub trait ManagerInterface: Send + Sync {
    /// Unique, reverse-DNS style identifier
    fn identifier(&self) -> String;

    fn display_name(&self) -> String;

    fn info(&self) -> InfoDictionary {
        InfoDictionary::new()
    }

    /// Current settings, as accepted by `initialize`
    fn settings(&self, _host_session: &HostSession) -> Result<InfoDictionary> {
        Ok(InfoDictionary::new())
    }

    /// Prepare the manager for use. The capability set must be final once
    /// this returns.
    fn initialize(&mut self, settings: InfoDictionary, host_session: &HostSession) -> Result<()>;

    fn flush_caches(&self, _host_session: &HostSession) -> Result<()> {
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool;

    // Capability: ManagementPolicyQueries

    fn management_policy(
        &self,
        _trait_sets: &[TraitSet],
        _access: PolicyAccess,
        _context: &Context,
        _host_session: &HostSession,
    ) -> Result<Vec<TraitsData>> {
        Err(defaults::not_implemented(&self.identifier(), "management_policy"))
    }

    // Capability: EntityReferenceIdentification

    fn is_entity_reference_string(&self, _candidate: &str, _host_session: &HostSession) -> bool {
        false
    }

    // Capability: ExistenceQueries

    fn entity_exists(
        &self,
        entity_references: &[EntityReference],
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, bool>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        defaults::entity_exists(entity_references, context, host_session, success, error)
    }

    // Capability: EntityTraitIntrospection

    fn entity_traits(
        &self,
        _entity_references: &[EntityReference],
        _access: EntityTraitsAccess,
        _context: &Context,
        _host_session: &HostSession,
        _success: SuccessCallback<'_, TraitSet>,
        _error: ErrorCallback<'_>,
    ) -> Result<()> {
        Err(defaults::not_implemented(&self.identifier(), "entity_traits"))
    }

    // Capability: Resolution

    fn resolve(
        &self,
        _entity_references: &[EntityReference],
        _trait_set: &TraitSet,
        _access: ResolveAccess,
        _context: &Context,
        _host_session: &HostSession,
        _success: SuccessCallback<'_, TraitsData>,
        _error: ErrorCallback<'_>,
    ) -> Result<()> {
        Err(defaults::not_implemented(&self.identifier(), "resolve"))
    }

    // Capability: DefaultEntityReferences

    fn default_entity_reference(
        &self,
        trait_sets: &[TraitSet],
        access: DefaultEntityAccess,
        context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, Option<EntityReference>>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        defaults::default_entity_reference(trait_sets, access, context, host_session, success, error)
    }

    // Capability: RelationshipQueries

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
        defaults::get_with_relationship(
            entity_references,
            relationship_traits_data,
            result_trait_set,
            page_size,
            access,
            context,
            host_session,
            success,
            error,
        )
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
        defaults::get_with_relationships(
            entity_reference,
            relationship_traits_datas,
            result_trait_set,
            page_size,
            access,
            context,
            host_session,
            success,
            error,
        )
    }

    // Capability: Publishing

    fn preflight(
        &self,
        _entity_references: &[EntityReference],
        _traits_hints: &[TraitsData],
        _access: PublishingAccess,
        _context: &Context,
        _host_session: &HostSession,
        _success: SuccessCallback<'_, EntityReference>,
        _error: ErrorCallback<'_>,
    ) -> Result<()> {
        Err(defaults::not_implemented(&self.identifier(), "preflight"))
    }

    fn register(
        &self,
        _entity_references: &[EntityReference],
        _traits_datas: &[TraitsData],
        _access: PublishingAccess,
        _context: &Context,
        _host_session: &HostSession,
        _success: SuccessCallback<'_, EntityReference>,
        _error: ErrorCallback<'_>,
    ) -> Result<()> {
        Err(defaults::not_implemented(&self.identifier(), "register"))
    }

    // Capability: CustomTerminology

    fn update_terminology(&self, terms: StrMap, host_session: &HostSession) -> Result<StrMap> {
        defaults::update_terminology(terms, host_session)
    }

    // Capability: StatefulContexts

    fn create_state(&self, _host_session: &HostSession) -> Result<ManagerStateHandle> {
        Err(defaults::not_implemented(&self.identifier(), "create_state"))
    }

    fn create_child_state(
        &self,
        _parent_state: &ManagerStateHandle,
        _host_session: &HostSession,
    ) -> Result<ManagerStateHandle> {
        Err(defaults::not_implemented(&self.identifier(), "create_child_state"))
    }

    fn persistence_token_for_state(
        &self,
        _state: &ManagerStateHandle,
        _host_session: &HostSession,
    ) -> Result<String> {
        Err(defaults::not_implemented(&self.identifier(), "persistence_token_for_state"))
    }

    fn state_from_persistence_token(
        &self,
        _token: &str,
        _host_session: &HostSession,
    ) -> Result<ManagerStateHandle> {
        Err(defaults::not_implemented(&self.identifier(), "state_from_persistence_token"))
    }
}

/// Owned manager interface handle
pub type BoxedManagerInterface = Box<dyn ManagerInterface>;

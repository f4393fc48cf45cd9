//! Host Manager
//!
//! [`Manager`] is what a host talks to. It wraps one manager interface
//! together with the host session, validates the manager at
//! initialization, and offers three calling styles for each batch
//! operation:
//!
//! * callback passthrough, identical to [`ManagerInterface`];
//! * `*_batch`, collecting one `Result` per input in input order;
//! * single-element forms that promote an element error to
//!   [`Error::BatchElement`].

use std::cell::RefCell;

use crate::access::{
    DefaultEntityAccess, EntityTraitsAccess, PolicyAccess, PublishingAccess, RelationsAccess,
    ResolveAccess,
};
use crate::context::{Context, HostSession};
use crate::entity_reference::EntityReference;
use crate::errors::{BatchElementError, Error, Result};
use crate::manager_api::{
    BoxedManagerInterface, BoxedPager, Capability, CapabilitySet, ErrorCallback, ManagerInterface, StrMap,
    SuccessCallback, INFO_KEY_ENTITY_REFERENCES_MATCH_PREFIX,
};
use crate::trait_data::{InfoDictionary, TraitSet, TraitsData};

/// Outcome of one batch element
pub type BatchResult<T> = std::result::Result<T, BatchElementError>;

/// Run a batch call and gather exactly one result per input index
fn collect_batch<T, F>(len: usize, operation: &str, call: F) -> Result<Vec<BatchResult<T>>>
where
    F: FnOnce(SuccessCallback<'_, T>, ErrorCallback<'_>) -> Result<()>,
{
    let slots: RefCell<Vec<Option<BatchResult<T>>>> = RefCell::new((0..len).map(|_| None).collect());
    let violation: RefCell<Option<String>> = RefCell::new(None);

    let deliver = |idx: usize, result: BatchResult<T>| {
        let mut slots = slots.borrow_mut();
        match slots.get_mut(idx) {
            Some(slot) if slot.is_none() => *slot = Some(result),
            Some(_) => {
                violation.borrow_mut().get_or_insert_with(|| format!("index {} reported twice", idx));
            }
            None => {
                violation
                    .borrow_mut()
                    .get_or_insert_with(|| format!("index {} out of range for {} input(s)", idx, len));
            }
        }
    };

    call(
        &mut |idx: usize, value: T| deliver(idx, Ok(value)),
        &mut |idx: usize, error: BatchElementError| deliver(idx, Err(error)),
    )?;

    if let Some(problem) = violation.into_inner() {
        return Err(Error::unhandled(format!("Manager broke the batch contract in '{}': {}", operation, problem)));
    }

    slots
        .into_inner()
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.ok_or_else(|| Error::unhandled(format!("Manager reported no result for index {} in '{}'", idx, operation)))
        })
        .collect()
}

/// Take the only result of a single-element batch
fn single<T>(mut results: Vec<BatchResult<T>>) -> Result<T> {
    match results.pop() {
        Some(Ok(value)) => Ok(value),
        Some(Err(error)) => Err(Error::batch_element(0, error)),
        None => Err(Error::unhandled("Manager returned no result")),
    }
}

/// Host-facing manager
pub struct Manager {
    interface: BoxedManagerInterface,
    host_session: HostSession,
    capabilities: CapabilitySet,
    entity_reference_prefix: Option<String>,
    initialized: bool,
}

impl Manager {
    pub fn new(interface: BoxedManagerInterface, host_session: HostSession) -> Self {
        Self {
            interface,
            host_session,
            capabilities: CapabilitySet::empty(),
            entity_reference_prefix: None,
            initialized: false,
        }
    }

    pub fn identifier(&self) -> String {
        self.interface.identifier()
    }

    pub fn display_name(&self) -> String {
        self.interface.display_name()
    }

    pub fn info(&self) -> InfoDictionary {
        self.interface.info()
    }

    pub fn settings(&self) -> Result<InfoDictionary> {
        self.interface.settings(&self.host_session)
    }

    pub fn host_session(&self) -> &HostSession {
        &self.host_session
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize the manager and check it provides every capability a
    /// host depends on
    pub fn initialize(&mut self, settings: InfoDictionary) -> Result<()> {
        let logger = self.host_session.logger();
        logger.debug_api(&format!("Manager: Initializing '{}'", self.interface.identifier()));

        self.interface.initialize(settings, &self.host_session)?;

        let interface = &self.interface;
        let capabilities = CapabilitySet::collect(|c| interface.has_capability(c));
        let missing: Vec<&str> = Capability::REQUIRED
            .iter()
            .filter(|c| !capabilities.has(**c))
            .map(Capability::label)
            .collect();
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "Manager '{}' does not support the required capabilities: {}",
                interface.identifier(),
                missing.join(", ")
            )));
        }

        self.capabilities = capabilities;
        self.entity_reference_prefix = interface
            .info()
            .get(INFO_KEY_ENTITY_REFERENCES_MATCH_PREFIX)
            .and_then(|v| v.as_str().map(str::to_string));
        self.initialized = true;

        logger.debug(&format!(
            "Manager: '{}' initialized with capabilities [{}]",
            interface.identifier(),
            capabilities.capabilities().iter().map(Capability::label).collect::<Vec<_>>().join(", ")
        ));
        Ok(())
    }

    pub fn flush_caches(&self) -> Result<()> {
        self.interface.flush_caches(&self.host_session)
    }

    /// Capabilities recorded at initialization
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn update_terminology(&self, terms: StrMap) -> Result<StrMap> {
        self.interface.update_terminology(terms, &self.host_session)
    }

    /// A new context, carrying fresh manager state when supported
    pub fn create_context(&self) -> Result<Context> {
        let mut context = Context::new();
        if self.has_capability(Capability::StatefulContexts) {
            context.manager_state = Some(self.interface.create_state(&self.host_session)?);
        }
        Ok(context)
    }

    /// A context sharing the parent's locale, with derived manager state
    pub fn create_child_context(&self, parent: &Context) -> Result<Context> {
        let mut context = Context::with_locale(parent.locale.clone());
        if let Some(state) = &parent.manager_state {
            if self.has_capability(Capability::StatefulContexts) {
                context.manager_state = Some(self.interface.create_child_state(state, &self.host_session)?);
            }
        }
        Ok(context)
    }

    /// Token from which [`Manager::context_from_persistence_token`] can
    /// restore the context's state. Empty without state.
    pub fn persistence_token_for_context(&self, context: &Context) -> Result<String> {
        match &context.manager_state {
            Some(state) if self.has_capability(Capability::StatefulContexts) => {
                self.interface.persistence_token_for_state(state, &self.host_session)
            }
            _ => Ok(String::new()),
        }
    }

    pub fn context_from_persistence_token(&self, token: &str) -> Result<Context> {
        let mut context = Context::new();
        if !token.is_empty() && self.has_capability(Capability::StatefulContexts) {
            context.manager_state = Some(self.interface.state_from_persistence_token(token, &self.host_session)?);
        }
        Ok(context)
    }

    /// Check if a string is an entity reference of this manager. A
    /// manager advertising a reference prefix is not consulted.
    pub fn is_entity_reference_string(&self, candidate: &str) -> bool {
        match &self.entity_reference_prefix {
            Some(prefix) => candidate.starts_with(prefix.as_str()),
            None => self.interface.is_entity_reference_string(candidate, &self.host_session),
        }
    }

    pub fn create_entity_reference(&self, candidate: &str) -> Result<EntityReference> {
        self.create_entity_reference_if_valid(candidate).ok_or_else(|| {
            Error::input_validation(format!(
                "'{}' is not a valid entity reference for '{}'",
                candidate,
                self.interface.identifier()
            ))
        })
    }

    pub fn create_entity_reference_if_valid(&self, candidate: &str) -> Option<EntityReference> {
        self.is_entity_reference_string(candidate)
            .then(|| EntityReference::new(candidate))
    }

    pub fn management_policy(
        &self,
        trait_sets: &[TraitSet],
        access: PolicyAccess,
        context: &Context,
    ) -> Result<Vec<TraitsData>> {
        let policies = self
            .interface
            .management_policy(trait_sets, access, context, &self.host_session)?;
        if policies.len() != trait_sets.len() {
            return Err(Error::unhandled(format!(
                "Manager returned {} policies for {} trait sets",
                policies.len(),
                trait_sets.len()
            )));
        }
        Ok(policies)
    }

    // Existence

    pub fn entity_exists(
        &self,
        entity_references: &[EntityReference],
        context: &Context,
        success: SuccessCallback<'_, bool>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        self.interface
            .entity_exists(entity_references, context, &self.host_session, success, error)
    }

    pub fn entity_exists_batch(
        &self,
        entity_references: &[EntityReference],
        context: &Context,
    ) -> Result<Vec<BatchResult<bool>>> {
        collect_batch(entity_references.len(), "entity_exists", |success, error| {
            self.entity_exists(entity_references, context, success, error)
        })
    }

    pub fn entity_exists_one(&self, entity_reference: &EntityReference, context: &Context) -> Result<bool> {
        single(self.entity_exists_batch(std::slice::from_ref(entity_reference), context)?)
    }

    // Trait introspection

    pub fn entity_traits(
        &self,
        entity_references: &[EntityReference],
        access: EntityTraitsAccess,
        context: &Context,
        success: SuccessCallback<'_, TraitSet>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        self.interface
            .entity_traits(entity_references, access, context, &self.host_session, success, error)
    }

    pub fn entity_traits_batch(
        &self,
        entity_references: &[EntityReference],
        access: EntityTraitsAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<TraitSet>>> {
        collect_batch(entity_references.len(), "entity_traits", |success, error| {
            self.entity_traits(entity_references, access, context, success, error)
        })
    }

    pub fn entity_traits_one(
        &self,
        entity_reference: &EntityReference,
        access: EntityTraitsAccess,
        context: &Context,
    ) -> Result<TraitSet> {
        single(self.entity_traits_batch(std::slice::from_ref(entity_reference), access, context)?)
    }

    // Resolution

    pub fn resolve(
        &self,
        entity_references: &[EntityReference],
        trait_set: &TraitSet,
        access: ResolveAccess,
        context: &Context,
        success: SuccessCallback<'_, TraitsData>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        self.interface
            .resolve(entity_references, trait_set, access, context, &self.host_session, success, error)
    }

    pub fn resolve_batch(
        &self,
        entity_references: &[EntityReference],
        trait_set: &TraitSet,
        access: ResolveAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<TraitsData>>> {
        collect_batch(entity_references.len(), "resolve", |success, error| {
            self.resolve(entity_references, trait_set, access, context, success, error)
        })
    }

    pub fn resolve_one(
        &self,
        entity_reference: &EntityReference,
        trait_set: &TraitSet,
        access: ResolveAccess,
        context: &Context,
    ) -> Result<TraitsData> {
        single(self.resolve_batch(std::slice::from_ref(entity_reference), trait_set, access, context)?)
    }

    // Default entity references

    pub fn default_entity_reference(
        &self,
        trait_sets: &[TraitSet],
        access: DefaultEntityAccess,
        context: &Context,
        success: SuccessCallback<'_, Option<EntityReference>>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        self.interface
            .default_entity_reference(trait_sets, access, context, &self.host_session, success, error)
    }

    pub fn default_entity_reference_batch(
        &self,
        trait_sets: &[TraitSet],
        access: DefaultEntityAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<Option<EntityReference>>>> {
        collect_batch(trait_sets.len(), "default_entity_reference", |success, error| {
            self.default_entity_reference(trait_sets, access, context, success, error)
        })
    }

    // Relationships

    #[allow(clippy::too_many_arguments)]
    pub fn get_with_relationship(
        &self,
        entity_references: &[EntityReference],
        relationship_traits_data: &TraitsData,
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        context: &Context,
        success: SuccessCallback<'_, BoxedPager>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        self.interface.get_with_relationship(
            entity_references,
            relationship_traits_data,
            result_trait_set,
            page_size,
            access,
            context,
            &self.host_session,
            success,
            error,
        )
    }

    pub fn get_with_relationship_batch(
        &self,
        entity_references: &[EntityReference],
        relationship_traits_data: &TraitsData,
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<BoxedPager>>> {
        collect_batch(entity_references.len(), "get_with_relationship", |success, error| {
            self.get_with_relationship(
                entity_references,
                relationship_traits_data,
                result_trait_set,
                page_size,
                access,
                context,
                success,
                error,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn get_with_relationships(
        &self,
        entity_reference: &EntityReference,
        relationship_traits_datas: &[TraitsData],
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        context: &Context,
        success: SuccessCallback<'_, BoxedPager>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        self.interface.get_with_relationships(
            entity_reference,
            relationship_traits_datas,
            result_trait_set,
            page_size,
            access,
            context,
            &self.host_session,
            success,
            error,
        )
    }

    pub fn get_with_relationships_batch(
        &self,
        entity_reference: &EntityReference,
        relationship_traits_datas: &[TraitsData],
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<BoxedPager>>> {
        collect_batch(relationship_traits_datas.len(), "get_with_relationships", |success, error| {
            self.get_with_relationships(
                entity_reference,
                relationship_traits_datas,
                result_trait_set,
                page_size,
                access,
                context,
                success,
                error,
            )
        })
    }

    // Publishing

    pub fn preflight(
        &self,
        entity_references: &[EntityReference],
        traits_hints: &[TraitsData],
        access: PublishingAccess,
        context: &Context,
        success: SuccessCallback<'_, EntityReference>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        Self::check_lengths(entity_references.len(), traits_hints.len(), "preflight")?;
        self.interface
            .preflight(entity_references, traits_hints, access, context, &self.host_session, success, error)
    }

    pub fn preflight_batch(
        &self,
        entity_references: &[EntityReference],
        traits_hints: &[TraitsData],
        access: PublishingAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<EntityReference>>> {
        collect_batch(entity_references.len(), "preflight", |success, error| {
            self.preflight(entity_references, traits_hints, access, context, success, error)
        })
    }

    pub fn preflight_one(
        &self,
        entity_reference: &EntityReference,
        traits_hint: &TraitsData,
        access: PublishingAccess,
        context: &Context,
    ) -> Result<EntityReference> {
        single(self.preflight_batch(
            std::slice::from_ref(entity_reference),
            std::slice::from_ref(traits_hint),
            access,
            context,
        )?)
    }

    pub fn register(
        &self,
        entity_references: &[EntityReference],
        traits_datas: &[TraitsData],
        access: PublishingAccess,
        context: &Context,
        success: SuccessCallback<'_, EntityReference>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        Self::check_lengths(entity_references.len(), traits_datas.len(), "register")?;
        self.interface
            .register(entity_references, traits_datas, access, context, &self.host_session, success, error)
    }

    pub fn register_batch(
        &self,
        entity_references: &[EntityReference],
        traits_datas: &[TraitsData],
        access: PublishingAccess,
        context: &Context,
    ) -> Result<Vec<BatchResult<EntityReference>>> {
        collect_batch(entity_references.len(), "register", |success, error| {
            self.register(entity_references, traits_datas, access, context, success, error)
        })
    }

    pub fn register_one(
        &self,
        entity_reference: &EntityReference,
        traits_data: &TraitsData,
        access: PublishingAccess,
        context: &Context,
    ) -> Result<EntityReference> {
        single(self.register_batch(
            std::slice::from_ref(entity_reference),
            std::slice::from_ref(traits_data),
            access,
            context,
        )?)
    }

    fn check_lengths(references: usize, datas: usize, operation: &str) -> Result<()> {
        if references != datas {
            return Err(Error::input_validation(format!(
                "'{}' needs one traits data per entity reference ({} references, {} traits datas)",
                operation, references, datas
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("identifier", &self.interface.identifier())
            .field("capabilities", &self.capabilities)
            .field("initialized", &self.initialized)
            .finish()
    }
}

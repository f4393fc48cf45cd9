//! Property tests for the batch calling convention and composite dispatch

use std::sync::Arc;

use proptest::prelude::*;

use assetio::errors::BatchElementError;
use assetio::host_api::Manager;
use assetio::manager_api::{ErrorCallback, SuccessCallback};
use assetio::plugin_system::{BuiltinManagerFactory, HybridManagerFactory, ManagerImplementationFactory, SharedManagerFactory};
use assetio::{
    trait_set, BoxedManagerInterface, Capability, CapabilitySet, Context, EntityReference, Error, ErrorCode,
    HostDescriptor, HostSession, InfoDictionary, LogFacadeLogger, ManagerInterface, PropertyValue, ResolveAccess,
    TraitSet, TraitsData,
};

fn host_session() -> HostSession {
    HostSession::new(Arc::new(HostDescriptor::new("test.host", "Test Host")), LogFacadeLogger::shared())
}

fn references(count: usize) -> Vec<EntityReference> {
    (0..count).map(|i| EntityReference::new(format!("tag:///{}", i))).collect()
}

/// Answers `resolve` in a scripted order with scripted outcomes
struct ScriptedManager {
    outcomes: Vec<bool>,
    order: Vec<usize>,
    repeat_first: bool,
}

impl ManagerInterface for ScriptedManager {
    fn identifier(&self) -> String {
        "test.scripted".to_string()
    }

    fn display_name(&self) -> String {
        "Scripted".to_string()
    }

    fn initialize(&mut self, _settings: InfoDictionary, _host_session: &HostSession) -> assetio::Result<()> {
        Ok(())
    }

    fn has_capability(&self, _capability: Capability) -> bool {
        true
    }

    fn is_entity_reference_string(&self, candidate: &str, _host_session: &HostSession) -> bool {
        candidate.starts_with("tag:///")
    }

    fn management_policy(
        &self,
        trait_sets: &[TraitSet],
        _access: assetio::PolicyAccess,
        _context: &Context,
        _host_session: &HostSession,
    ) -> assetio::Result<Vec<TraitsData>> {
        Ok(vec![TraitsData::new(); trait_sets.len()])
    }

    fn resolve(
        &self,
        entity_references: &[EntityReference],
        _trait_set: &TraitSet,
        _access: ResolveAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, TraitsData>,
        error: ErrorCallback<'_>,
    ) -> assetio::Result<()> {
        for &idx in &self.order {
            if self.outcomes[idx] {
                let mut data = TraitsData::new();
                data.set_trait_property("tagged", "reference", entity_references[idx].as_str());
                success(idx, data);
            } else {
                error(idx, BatchElementError::new(ErrorCode::EntityResolutionError, entity_references[idx].as_str()));
            }
        }
        if self.repeat_first && !self.order.is_empty() {
            success(self.order[0], TraitsData::new());
        }
        Ok(())
    }
}

fn scripted_manager(outcomes: Vec<bool>, order: Vec<usize>, repeat_first: bool) -> Manager {
    let mut manager = Manager::new(Box::new(ScriptedManager { outcomes, order, repeat_first }), host_session());
    manager.initialize(InfoDictionary::new()).expect("initialize");
    manager
}

/// Reports which child it is through every resolved value
struct TaggedManager {
    tag: i64,
    capabilities: CapabilitySet,
}

impl ManagerInterface for TaggedManager {
    fn identifier(&self) -> String {
        "test.tagged".to_string()
    }

    fn display_name(&self) -> String {
        format!("Tagged {}", self.tag)
    }

    fn initialize(&mut self, _settings: InfoDictionary, _host_session: &HostSession) -> assetio::Result<()> {
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    fn resolve(
        &self,
        entity_references: &[EntityReference],
        _trait_set: &TraitSet,
        _access: ResolveAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, TraitsData>,
        _error: ErrorCallback<'_>,
    ) -> assetio::Result<()> {
        for idx in 0..entity_references.len() {
            let mut data = TraitsData::new();
            data.set_trait_property("tagged", "by", self.tag);
            success(idx, data);
        }
        Ok(())
    }
}

fn tagged_factory(tag: i64, capabilities: CapabilitySet) -> SharedManagerFactory {
    let mut factory = BuiltinManagerFactory::new(LogFacadeLogger::shared());
    factory
        .register("test.tagged", move || Box::new(TaggedManager { tag, capabilities }) as BoxedManagerInterface)
        .expect("register");
    Arc::new(factory)
}

fn outcomes_and_order() -> impl Strategy<Value = (Vec<bool>, Vec<usize>)> {
    prop::collection::vec(any::<bool>(), 0..24).prop_flat_map(|outcomes| {
        let order: Vec<usize> = (0..outcomes.len()).collect();
        (Just(outcomes), Just(order).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn batch_results_follow_input_order((outcomes, order) in outcomes_and_order()) {
        let manager = scripted_manager(outcomes.clone(), order, false);
        let refs = references(outcomes.len());

        let results = manager
            .resolve_batch(&refs, &trait_set(["tagged"]), ResolveAccess::Read, &Context::new())
            .unwrap();

        prop_assert_eq!(results.len(), outcomes.len());
        for (idx, (result, expected_ok)) in results.iter().zip(&outcomes).enumerate() {
            let expected = PropertyValue::from(refs[idx].as_str());
            match result {
                Ok(data) => {
                    prop_assert!(*expected_ok);
                    prop_assert_eq!(data.get_trait_property("tagged", "reference").unwrap(), Some(&expected));
                }
                Err(error) => {
                    prop_assert!(!*expected_ok);
                    prop_assert_eq!(error.code, ErrorCode::EntityResolutionError);
                    prop_assert_eq!(&error.message, refs[idx].as_str());
                }
            }
        }
    }

    #[test]
    fn duplicate_reports_break_the_batch((outcomes, order) in outcomes_and_order()) {
        prop_assume!(!outcomes.is_empty());
        let manager = scripted_manager(outcomes.clone(), order, true);

        let result = manager.resolve_batch(
            &references(outcomes.len()),
            &trait_set(["tagged"]),
            ResolveAccess::Read,
            &Context::new(),
        );
        prop_assert!(matches!(result, Err(Error::Unhandled { .. })), "assertion failed: matches!(result, Err(Error::Unhandled {{ .. }}))");
    }

    #[test]
    fn missing_reports_break_the_batch((outcomes, order) in outcomes_and_order()) {
        prop_assume!(!outcomes.is_empty());
        let mut order = order;
        order.pop();
        let manager = scripted_manager(outcomes.clone(), order, false);

        let result = manager.resolve_batch(
            &references(outcomes.len()),
            &trait_set(["tagged"]),
            ResolveAccess::Read,
            &Context::new(),
        );
        prop_assert!(matches!(result, Err(Error::Unhandled { .. })), "assertion failed: matches!(result, Err(Error::Unhandled {{ .. }}))");
    }

    #[test]
    fn composite_resolves_through_first_capable_child(
        bits in prop::collection::vec(0u32..(1 << Capability::COUNT), 2..5)
    ) {
        let factories: Vec<SharedManagerFactory> = bits
            .iter()
            .enumerate()
            .map(|(tag, bits)| tagged_factory(tag as i64, CapabilitySet::from_bits_truncate(*bits)))
            .collect();
        let hybrid = HybridManagerFactory::make(factories, LogFacadeLogger::shared()).unwrap();
        let session = host_session();

        let mut composite = hybrid.instantiate("test.tagged").unwrap();
        composite.initialize(InfoDictionary::new(), &session).unwrap();

        let expected_child = bits
            .iter()
            .position(|bits| CapabilitySet::from_bits_truncate(*bits).has(Capability::Resolution));

        for capability in Capability::ALL {
            let any_child = bits.iter().any(|b| CapabilitySet::from_bits_truncate(*b).has(capability));
            prop_assert_eq!(composite.has_capability(capability), any_child);
        }

        let mut resolved_by = Vec::new();
        let mut errors = Vec::new();
        let outcome = composite.resolve(
            &references(3),
            &trait_set(["tagged"]),
            ResolveAccess::Read,
            &Context::new(),
            &session,
            &mut |idx: usize, data: TraitsData| {
                resolved_by.push((idx, data.get_trait_property("tagged", "by").unwrap().cloned()))
            },
            &mut |idx: usize, error: BatchElementError| errors.push((idx, error)),
        );

        match expected_child {
            Some(child) => {
                prop_assert!(outcome.is_ok());
                prop_assert!(errors.is_empty());
                prop_assert_eq!(resolved_by.len(), 3);
                for (_, by) in &resolved_by {
                    prop_assert_eq!(by, &Some(PropertyValue::Int(child as i64)));
                }
            }
            None => {
                prop_assert!(matches!(outcome, Err(Error::NotImplemented { .. })), "assertion failed: matches!(outcome, Err(Error::NotImplemented {{ .. }}))");
                prop_assert!(resolved_by.is_empty());
            }
        }
    }
}

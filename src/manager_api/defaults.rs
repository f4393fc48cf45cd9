//! Protocol Fallbacks
//!
//! Behaviour of capability-gated operations when the implementation does not
//! provide them. These are shared by the [`ManagerInterface`] default
//! methods and by composite dispatch when no child declares a capability.
//!
//! [`ManagerInterface`]: crate::manager_api::ManagerInterface

use crate::access::{DefaultEntityAccess, RelationsAccess};
use crate::context::{Context, HostSession};
use crate::entity_reference::EntityReference;
use crate::errors::{Error, Result};
use crate::manager_api::interface::{ErrorCallback, StrMap, SuccessCallback};
use crate::manager_api::pager::{BoxedPager, EmptyPager};
use crate::trait_data::{TraitSet, TraitsData};

/// Error raised by operations that have no fallback
pub fn not_implemented(identifier: &str, operation: &str) -> Error {
    Error::not_implemented(format!("'{}' is not implemented by '{}'", operation, identifier))
}

/// Existence queries without the capability report nothing
pub fn entity_exists(
    _entity_references: &[EntityReference],
    _context: &Context,
    _host_session: &HostSession,
    _success: SuccessCallback<'_, bool>,
    _error: ErrorCallback<'_>,
) -> Result<()> {
    Ok(())
}

/// No default entity for any trait set
pub fn default_entity_reference(
    trait_sets: &[TraitSet],
    _access: DefaultEntityAccess,
    _context: &Context,
    _host_session: &HostSession,
    success: SuccessCallback<'_, Option<EntityReference>>,
    _error: ErrorCallback<'_>,
) -> Result<()> {
    for idx in 0..trait_sets.len() {
        success(idx, None);
    }
    Ok(())
}

/// An always-empty pager for every input reference
#[allow(clippy::too_many_arguments)]
pub fn get_with_relationship(
    entity_references: &[EntityReference],
    _relationship_traits_data: &TraitsData,
    _result_trait_set: &TraitSet,
    _page_size: usize,
    _access: RelationsAccess,
    _context: &Context,
    _host_session: &HostSession,
    success: SuccessCallback<'_, BoxedPager>,
    _error: ErrorCallback<'_>,
) -> Result<()> {
    for idx in 0..entity_references.len() {
        success(idx, Box::new(EmptyPager));
    }
    Ok(())
}

/// An always-empty pager for every input relationship
#[allow(clippy::too_many_arguments)]
pub fn get_with_relationships(
    _entity_reference: &EntityReference,
    relationship_traits_datas: &[TraitsData],
    _result_trait_set: &TraitSet,
    _page_size: usize,
    _access: RelationsAccess,
    _context: &Context,
    _host_session: &HostSession,
    success: SuccessCallback<'_, BoxedPager>,
    _error: ErrorCallback<'_>,
) -> Result<()> {
    for idx in 0..relationship_traits_datas.len() {
        success(idx, Box::new(EmptyPager));
    }
    Ok(())
}

/// Terminology passes through unchanged
pub fn update_terminology(terms: StrMap, _host_session: &HostSession) -> Result<StrMap> {
    Ok(terms)
}

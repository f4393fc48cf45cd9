//! Library Manager
//!
//! An in-process manager over a JSON library of entities. Each entity has a
//! name and a list of versions, each version a [`TraitsData`]. References
//! take the form `lib:///<name>` (latest version) or `lib:///<name>?v=<n>`
//! (versions count from 1).
//!
//! ```json
//! {
//!   "entities": { "cat": [ { "assetio.locatable": { "location": "file:///cat.png" } } ] },
//!   "relationships": [
//!     { "from": "cat", "relationship": { "assetio.proxy": {} }, "to": ["cat_small"] }
//!   ],
//!   "defaults": [ { "traits": ["assetio.image"], "access": "read", "entity": "cat" } ],
//!   "terminology": { "asset": "sprite" }
//! }
//! ```
//!
//! Settings accepted by `initialize`:
//!
//! | key | type | meaning |
//! |---|---|---|
//! | `library_path` | string | JSON library file; registrations are written back |
//! | `read_only` | bool | reject publishing and write policy queries |
//! | `policy_trait` | string | trait added to every managed policy |

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::access::{
    DefaultEntityAccess, EntityTraitsAccess, PolicyAccess, PublishingAccess, RelationsAccess,
    ResolveAccess,
};
use crate::context::{Context, HostSession, ManagerState, ManagerStateHandle};
use crate::entity_reference::EntityReference;
use crate::errors::{BatchElementError, Error, ErrorCode, Result};
use crate::manager_api::{
    BoxedPager, Capability, ErrorCallback, ManagerInterface, StrMap, SuccessCallback, VecPager,
    INFO_KEY_ENTITY_REFERENCES_MATCH_PREFIX,
};
use crate::trait_data::{InfoDictionary, PropertyValue, TraitSet, TraitsData};

pub const LIBRARY_MANAGER_IDENTIFIER: &str = "org.assetio.library";

/// Prefix of every reference issued by the library manager
pub const ENTITY_REFERENCE_PREFIX: &str = "lib:///";

const SETTING_LIBRARY_PATH: &str = "library_path";
const SETTING_READ_ONLY: &str = "read_only";
const SETTING_POLICY_TRAIT: &str = "policy_trait";

const STATE_TOKEN_PREFIX: &str = "state:";

/// A relationship from one entity to others
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub from: String,
    pub relationship: TraitsData,
    #[serde(default)]
    pub to: Vec<String>,
}

/// Default entity for a trait set. Without `access` the record applies to
/// every access mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultRecord {
    pub traits: TraitSet,
    #[serde(default)]
    pub access: Option<DefaultEntityAccess>,
    pub entity: String,
}

/// Contents of a library file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryData {
    /// Entity name -> versions, oldest first
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<TraitsData>>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
    #[serde(default)]
    pub defaults: Vec<DefaultRecord>,
    #[serde(default)]
    pub terminology: StrMap,
}

impl LibraryData {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Could not read library '{}': {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::configuration(format!("Invalid library '{}': {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Data of the referenced version, if it exists
    fn lookup(&self, reference: &ParsedReference) -> Option<&TraitsData> {
        let versions = self.entities.get(&reference.name)?;
        match reference.version {
            Some(version) => version.checked_sub(1).and_then(|idx| versions.get(idx)),
            None => versions.last(),
        }
    }

    /// Latest data of a named entity
    fn latest(&self, name: &str) -> Option<&TraitsData> {
        self.entities.get(name).and_then(|versions| versions.last())
    }
}

/// Components of a library reference
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedReference {
    name: String,
    version: Option<usize>,
}

fn parse_reference(reference: &str) -> std::result::Result<ParsedReference, BatchElementError> {
    let malformed = |why: &str| {
        BatchElementError::new(ErrorCode::MalformedEntityReference, format!("'{}' {}", reference, why))
    };

    let body = reference.strip_prefix(ENTITY_REFERENCE_PREFIX).ok_or_else(|| {
        BatchElementError::new(
            ErrorCode::InvalidEntityReference,
            format!("'{}' is not a library reference", reference),
        )
    })?;

    let (name, version) = match body.split_once('?') {
        Some((name, query)) => {
            let version = query
                .strip_prefix("v=")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| malformed("has an invalid version query"))?;
            (name, Some(version))
        }
        None => (body, None),
    };

    if name.is_empty() {
        return Err(malformed("names no entity"));
    }
    Ok(ParsedReference { name: name.to_string(), version })
}

fn make_reference(name: &str, version: Option<usize>) -> EntityReference {
    match version {
        Some(version) => EntityReference::new(format!("{}{}?v={}", ENTITY_REFERENCE_PREFIX, name, version)),
        None => EntityReference::new(format!("{}{}", ENTITY_REFERENCE_PREFIX, name)),
    }
}

fn access_error(operation: &str, access: &dyn std::fmt::Display) -> BatchElementError {
    BatchElementError::new(
        ErrorCode::EntityAccessError,
        format!("'{}' access is not supported for {}", access, operation),
    )
}

fn unknown_entity(reference: &EntityReference) -> BatchElementError {
    BatchElementError::new(ErrorCode::EntityResolutionError, format!("Entity '{}' not found", reference))
}

/// Context state of the library manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryState {
    pub id: u64,
    pub parent: Option<u64>,
}

impl ManagerState for LibraryState {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Manager over a JSON entity library
pub struct LibraryManager {
    library: RwLock<LibraryData>,
    library_path: Option<PathBuf>,
    read_only: bool,
    policy_trait: Option<String>,
    next_state: AtomicU64,
}

impl Default for LibraryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryManager {
    pub fn new() -> Self {
        Self::with_library(LibraryData::default())
    }

    /// Manager over in-memory data. `initialize` replaces it only when a
    /// `library_path` setting is given.
    pub fn with_library(library: LibraryData) -> Self {
        Self {
            library: RwLock::new(library),
            library_path: None,
            read_only: false,
            policy_trait: None,
            next_state: AtomicU64::new(1),
        }
    }

    fn apply_settings(&mut self, settings: &InfoDictionary) -> Result<()> {
        let mut library_path = None;
        let mut read_only = false;
        let mut policy_trait = None;

        for (key, value) in settings {
            match (key.as_str(), value) {
                (SETTING_LIBRARY_PATH, PropertyValue::Str(path)) => library_path = Some(PathBuf::from(path)),
                (SETTING_READ_ONLY, PropertyValue::Bool(flag)) => read_only = *flag,
                (SETTING_POLICY_TRAIT, PropertyValue::Str(trait_id)) => {
                    policy_trait = Some(trait_id.clone()).filter(|t| !t.is_empty())
                }
                (SETTING_LIBRARY_PATH | SETTING_READ_ONLY | SETTING_POLICY_TRAIT, other) => {
                    return Err(Error::input_validation(format!(
                        "Setting '{}' has the wrong type ({})",
                        key,
                        other.type_name()
                    )))
                }
                _ => return Err(Error::input_validation(format!("Unknown setting '{}'", key))),
            }
        }

        if let Some(path) = &library_path {
            *self.library.get_mut() = LibraryData::load(path)?;
        }
        self.library_path = library_path;
        self.read_only = read_only;
        self.policy_trait = policy_trait;
        Ok(())
    }

    /// Policy for one trait set against the current library
    fn policy_for(&self, library: &LibraryData, trait_set: &TraitSet) -> TraitsData {
        let mut policy = TraitsData::new();
        if trait_set.is_empty() {
            return policy;
        }

        let matching = library
            .entities
            .values()
            .filter_map(|versions| versions.last())
            .find(|data| data.has_traits(trait_set));

        if let Some(data) = matching {
            for trait_id in trait_set.iter().filter(|t| data.has_properties(t)) {
                policy.add_trait(trait_id);
            }
            if let Some(policy_trait) = &self.policy_trait {
                policy.add_trait(policy_trait);
            }
        }
        policy
    }

    /// References related to `name` through `relationship`, restricted to
    /// targets carrying `result_trait_set`
    fn related(
        &self,
        library: &LibraryData,
        name: &str,
        relationship: &TraitsData,
        result_trait_set: &TraitSet,
    ) -> Vec<EntityReference> {
        library
            .relationships
            .iter()
            .filter(|record| record.from == name && relationship_matches(&record.relationship, relationship))
            .flat_map(|record| record.to.iter())
            .filter(|target| {
                result_trait_set.is_empty()
                    || library
                        .latest(target)
                        .map(|data| data.has_traits(result_trait_set))
                        .unwrap_or(false)
            })
            .map(|target| make_reference(target, None))
            .collect()
    }

    fn persist(&self, library: &LibraryData, host_session: &HostSession) -> Result<()> {
        if let Some(path) = &self.library_path {
            library.save(path)?;
            host_session
                .logger()
                .debug(&format!("LibraryManager: Saved library to '{}'", path.display()));
        }
        Ok(())
    }

    fn state_id(state: &ManagerStateHandle) -> Result<&LibraryState> {
        state
            .as_any()
            .downcast_ref::<LibraryState>()
            .ok_or_else(|| Error::input_validation("State was not created by the library manager"))
    }

    fn new_state(&self, parent: Option<u64>) -> ManagerStateHandle {
        let id = self.next_state.fetch_add(1, Ordering::Relaxed);
        std::sync::Arc::new(LibraryState { id, parent })
    }
}

fn check_batch_lengths(operation: &str, references: usize, datas: usize) -> Result<()> {
    if references != datas {
        return Err(Error::input_validation(format!(
            "{}: {} entity references but {} traits datas",
            operation, references, datas
        )));
    }
    Ok(())
}

/// A stored relationship matches a query when it has every queried trait
/// and every queried property value
fn relationship_matches(stored: &TraitsData, query: &TraitsData) -> bool {
    query.iter().all(|(trait_id, properties)| {
        stored.has_trait(trait_id)
            && properties.iter().all(|(key, value)| {
                matches!(stored.get_trait_property(trait_id, key), Ok(Some(stored_value)) if stored_value == value)
            })
    })
}

impl ManagerInterface for LibraryManager {
    fn identifier(&self) -> String {
        LIBRARY_MANAGER_IDENTIFIER.to_string()
    }

    fn display_name(&self) -> String {
        "Assetio Library".to_string()
    }

    fn info(&self) -> InfoDictionary {
        let mut info = InfoDictionary::new();
        info.insert(
            INFO_KEY_ENTITY_REFERENCES_MATCH_PREFIX.to_string(),
            PropertyValue::from(ENTITY_REFERENCE_PREFIX),
        );
        info
    }

    fn settings(&self, _host_session: &HostSession) -> Result<InfoDictionary> {
        let mut settings = InfoDictionary::new();
        if let Some(path) = &self.library_path {
            settings.insert(SETTING_LIBRARY_PATH.to_string(), PropertyValue::from(path.to_string_lossy().as_ref()));
        }
        settings.insert(SETTING_READ_ONLY.to_string(), PropertyValue::from(self.read_only));
        if let Some(policy_trait) = &self.policy_trait {
            settings.insert(SETTING_POLICY_TRAIT.to_string(), PropertyValue::from(policy_trait.as_str()));
        }
        Ok(settings)
    }

    fn initialize(&mut self, settings: InfoDictionary, host_session: &HostSession) -> Result<()> {
        self.apply_settings(&settings)?;
        host_session.logger().debug(&format!(
            "LibraryManager: {} entities, read_only={}",
            self.library.read().entities.len(),
            self.read_only
        ));
        Ok(())
    }

    fn flush_caches(&self, host_session: &HostSession) -> Result<()> {
        if let Some(path) = &self.library_path {
            *self.library.write() = LibraryData::load(path)?;
            host_session
                .logger()
                .debug(&format!("LibraryManager: Reloaded '{}'", path.display()));
        }
        Ok(())
    }

    fn has_capability(&self, _capability: Capability) -> bool {
        true
    }

    fn management_policy(
        &self,
        trait_sets: &[TraitSet],
        access: PolicyAccess,
        _context: &Context,
        _host_session: &HostSession,
    ) -> Result<Vec<TraitsData>> {
        let managed = match access {
            PolicyAccess::Read => true,
            PolicyAccess::Write | PolicyAccess::CreateRelated => !self.read_only,
            PolicyAccess::Required | PolicyAccess::ManagerDriven => false,
        };
        if !managed {
            return Ok(vec![TraitsData::new(); trait_sets.len()]);
        }

        let library = self.library.read();
        Ok(trait_sets.iter().map(|set| self.policy_for(&library, set)).collect())
    }

    fn is_entity_reference_string(&self, candidate: &str, _host_session: &HostSession) -> bool {
        candidate.starts_with(ENTITY_REFERENCE_PREFIX)
    }

    fn entity_exists(
        &self,
        entity_references: &[EntityReference],
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, bool>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        let library = self.library.read();
        for (idx, reference) in entity_references.iter().enumerate() {
            match parse_reference(reference.as_str()) {
                Ok(parsed) => success(idx, library.lookup(&parsed).is_some()),
                Err(e) => error(idx, e),
            }
        }
        Ok(())
    }

    fn entity_traits(
        &self,
        entity_references: &[EntityReference],
        access: EntityTraitsAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, TraitSet>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        if access == EntityTraitsAccess::Write && self.read_only {
            for idx in 0..entity_references.len() {
                error(idx, access_error("entity_traits", &access));
            }
            return Ok(());
        }

        let library = self.library.read();
        for (idx, reference) in entity_references.iter().enumerate() {
            let parsed = match parse_reference(reference.as_str()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    error(idx, e);
                    continue;
                }
            };
            match (library.lookup(&parsed), access) {
                (Some(data), _) => success(idx, data.trait_set()),
                // Anything may be written to a new entity
                (None, EntityTraitsAccess::Write) => success(idx, TraitSet::new()),
                (None, EntityTraitsAccess::Read) => error(idx, unknown_entity(reference)),
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        entity_references: &[EntityReference],
        trait_set: &TraitSet,
        access: ResolveAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, TraitsData>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        if access != ResolveAccess::Read {
            for idx in 0..entity_references.len() {
                error(idx, access_error("resolve", &access));
            }
            return Ok(());
        }

        let library = self.library.read();
        for (idx, reference) in entity_references.iter().enumerate() {
            match parse_reference(reference.as_str()) {
                Ok(parsed) => match library.lookup(&parsed) {
                    Some(data) => success(idx, data.filtered(trait_set)),
                    None => error(idx, unknown_entity(reference)),
                },
                Err(e) => error(idx, e),
            }
        }
        Ok(())
    }

    fn default_entity_reference(
        &self,
        trait_sets: &[TraitSet],
        access: DefaultEntityAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, Option<EntityReference>>,
        _error: ErrorCallback<'_>,
    ) -> Result<()> {
        let library = self.library.read();
        for (idx, trait_set) in trait_sets.iter().enumerate() {
            let entity = library
                .defaults
                .iter()
                .find(|record| &record.traits == trait_set && record.access.map_or(true, |a| a == access))
                .map(|record| make_reference(&record.entity, None));
            success(idx, entity);
        }
        Ok(())
    }

    fn get_with_relationship(
        &self,
        entity_references: &[EntityReference],
        relationship_traits_data: &TraitsData,
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, BoxedPager>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        if access != RelationsAccess::Read {
            for idx in 0..entity_references.len() {
                error(idx, access_error("get_with_relationship", &access));
            }
            return Ok(());
        }

        let library = self.library.read();
        for (idx, reference) in entity_references.iter().enumerate() {
            match parse_reference(reference.as_str()) {
                Ok(parsed) if library.lookup(&parsed).is_some() => {
                    let related = self.related(&library, &parsed.name, relationship_traits_data, result_trait_set);
                    success(idx, Box::new(VecPager::new(related, page_size)));
                }
                Ok(_) => error(idx, unknown_entity(reference)),
                Err(e) => error(idx, e),
            }
        }
        Ok(())
    }

    fn get_with_relationships(
        &self,
        entity_reference: &EntityReference,
        relationship_traits_datas: &[TraitsData],
        result_trait_set: &TraitSet,
        page_size: usize,
        access: RelationsAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, BoxedPager>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        let library = self.library.read();
        let target = if access != RelationsAccess::Read {
            Err(access_error("get_with_relationships", &access))
        } else {
            parse_reference(entity_reference.as_str()).and_then(|parsed| match library.lookup(&parsed) {
                Some(_) => Ok(parsed.name),
                None => Err(unknown_entity(entity_reference)),
            })
        };

        match target {
            Ok(name) => {
                for (idx, relationship) in relationship_traits_datas.iter().enumerate() {
                    let related = self.related(&library, &name, relationship, result_trait_set);
                    success(idx, Box::new(VecPager::new(related, page_size)));
                }
            }
            Err(failure) => {
                for idx in 0..relationship_traits_datas.len() {
                    error(idx, failure.clone());
                }
            }
        }
        Ok(())
    }

    fn preflight(
        &self,
        entity_references: &[EntityReference],
        traits_hints: &[TraitsData],
        access: PublishingAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, EntityReference>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        check_batch_lengths("preflight", entity_references.len(), traits_hints.len())?;
        if self.read_only || access != PublishingAccess::Write {
            for idx in 0..entity_references.len() {
                error(idx, access_error("preflight", &access));
            }
            return Ok(());
        }

        for (idx, (reference, hint)) in entity_references.iter().zip(traits_hints).enumerate() {
            match parse_reference(reference.as_str()) {
                Ok(_) if hint.is_empty() => error(
                    idx,
                    BatchElementError::new(ErrorCode::InvalidPreflightHint, "Traits hint carries no traits"),
                ),
                Ok(parsed) => success(idx, make_reference(&parsed.name, None)),
                Err(e) => error(idx, e),
            }
        }
        Ok(())
    }

    fn register(
        &self,
        entity_references: &[EntityReference],
        traits_datas: &[TraitsData],
        access: PublishingAccess,
        _context: &Context,
        host_session: &HostSession,
        success: SuccessCallback<'_, EntityReference>,
        error: ErrorCallback<'_>,
    ) -> Result<()> {
        check_batch_lengths("register", entity_references.len(), traits_datas.len())?;
        if self.read_only || access != PublishingAccess::Write {
            for idx in 0..entity_references.len() {
                error(idx, access_error("register", &access));
            }
            return Ok(());
        }

        let mut library = self.library.write();
        // Staged so a failed save leaves the library untouched
        let mut staged = library.clone();
        let mut outcomes = Vec::with_capacity(entity_references.len());
        let mut changed = false;
        for (reference, data) in entity_references.iter().zip(traits_datas) {
            let outcome = match parse_reference(reference.as_str()) {
                Ok(_) if data.is_empty() => Err(BatchElementError::new(
                    ErrorCode::InvalidTraitSet,
                    "Cannot register an entity without traits",
                )),
                Ok(parsed) => {
                    let versions = staged.entities.entry(parsed.name.clone()).or_default();
                    versions.push(data.clone());
                    changed = true;
                    Ok(make_reference(&parsed.name, Some(versions.len())))
                }
                Err(e) => Err(e),
            };
            outcomes.push(outcome);
        }

        // Nothing is reported unless the save succeeds
        if changed {
            self.persist(&staged, host_session)?;
            *library = staged;
        }
        drop(library);

        for (idx, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(reference) => success(idx, reference),
                Err(e) => error(idx, e),
            }
        }
        Ok(())
    }

    fn update_terminology(&self, mut terms: StrMap, _host_session: &HostSession) -> Result<StrMap> {
        let library = self.library.read();
        for (term, replacement) in terms.iter_mut() {
            if let Some(custom) = library.terminology.get(term) {
                *replacement = custom.clone();
            }
        }
        Ok(terms)
    }

    fn create_state(&self, _host_session: &HostSession) -> Result<ManagerStateHandle> {
        Ok(self.new_state(None))
    }

    fn create_child_state(
        &self,
        parent_state: &ManagerStateHandle,
        _host_session: &HostSession,
    ) -> Result<ManagerStateHandle> {
        let parent = Self::state_id(parent_state)?;
        Ok(self.new_state(Some(parent.id)))
    }

    fn persistence_token_for_state(
        &self,
        state: &ManagerStateHandle,
        _host_session: &HostSession,
    ) -> Result<String> {
        let state = Self::state_id(state)?;
        Ok(format!("{}{}", STATE_TOKEN_PREFIX, state.id))
    }

    fn state_from_persistence_token(
        &self,
        token: &str,
        _host_session: &HostSession,
    ) -> Result<ManagerStateHandle> {
        let id = token
            .strip_prefix(STATE_TOKEN_PREFIX)
            .and_then(|id| id.parse::<u64>().ok())
            .ok_or_else(|| Error::input_validation(format!("Invalid persistence token '{}'", token)))?;
        Ok(std::sync::Arc::new(LibraryState { id, parent: None }))
    }
}

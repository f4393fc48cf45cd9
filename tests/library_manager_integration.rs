use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use assetio::host_api::{Manager, ManagerFactory};
use assetio::managers::{LibraryData, LIBRARY_MANAGER_IDENTIFIER};
use assetio::plugin_system::{BuiltinManagerFactory, SharedManagerFactory};
use assetio::{
    trait_set, Capability, DefaultEntityAccess, EntityReference, EntityTraitsAccess, Error, ErrorCode,
    HostDescriptor, InfoDictionary, LogFacadeLogger, PolicyAccess, PropertyValue, PublishingAccess,
    RelationsAccess, ResolveAccess, TraitSet, TraitsData,
};

const LIBRARY_JSON: &str = r#"{
  "entities": {
    "cat": [
      { "assetio.image": {}, "assetio.locatable": { "location": "file:///cat_v1.png" } },
      { "assetio.image": {}, "assetio.locatable": { "location": "file:///cat_v2.png" } }
    ],
    "cat_small": [
      { "assetio.image": {}, "assetio.locatable": { "location": "file:///cat_small.png" } }
    ],
    "cat_notes": [
      { "assetio.text": {}, "assetio.locatable": { "location": "file:///cat.txt" } }
    ]
  },
  "relationships": [
    { "from": "cat", "relationship": { "assetio.related": {} }, "to": ["cat_small", "cat_notes"] }
  ],
  "defaults": [
    { "traits": ["assetio.image"], "access": "read", "entity": "cat" },
    { "traits": ["assetio.image"], "entity": "cat_small" }
  ],
  "terminology": { "asset": "sprite" }
}"#;

fn manager_factory() -> ManagerFactory {
    let logger = LogFacadeLogger::shared();
    let implementations: SharedManagerFactory =
        Arc::new(BuiltinManagerFactory::with_bundled_managers(Arc::clone(&logger)));
    ManagerFactory::new(Arc::new(HostDescriptor::new("test.host", "Test Host")), implementations, logger)
}

fn write_library(dir: &Path) -> String {
    let path = dir.join("library.json");
    fs::write(&path, LIBRARY_JSON).expect("Failed to write library");
    path.to_string_lossy().into_owned()
}

fn library_manager(library_path: &str, extra: &[(&str, PropertyValue)]) -> Manager {
    let mut settings = InfoDictionary::new();
    settings.insert("library_path".to_string(), PropertyValue::from(library_path));
    for (key, value) in extra {
        settings.insert(key.to_string(), value.clone());
    }
    manager_factory()
        .create_initialized_manager(LIBRARY_MANAGER_IDENTIFIER, settings)
        .expect("Failed to create library manager")
}

fn location(data: &TraitsData) -> Option<&PropertyValue> {
    data.get_trait_property("assetio.locatable", "location").ok().flatten()
}

#[test]
fn test_library_manager_is_listed() {
    let managers = manager_factory().available_managers().unwrap();
    let detail = &managers[LIBRARY_MANAGER_IDENTIFIER];
    assert_eq!(detail.display_name, "Assetio Library");
    assert_eq!(
        detail.info.get("entityReferencesMatchPrefix"),
        Some(&PropertyValue::from("lib:///"))
    );
}

#[test]
fn test_library_manager_provides_every_capability() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);
    for capability in Capability::ALL {
        assert!(manager.has_capability(capability), "{:?}", capability);
    }
}

#[test]
fn test_reference_identification_uses_prefix() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);

    assert!(manager.is_entity_reference_string("lib:///cat"));
    assert!(!manager.is_entity_reference_string("file:///cat.png"));
    assert!(manager.create_entity_reference("lib:///anything").is_ok());

    let err = manager.create_entity_reference("cat").unwrap_err();
    assert!(matches!(err, Error::InputValidation { .. }));
}

#[test]
fn test_resolve_latest_and_pinned_versions() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);
    let context = manager.create_context().unwrap();
    let traits = trait_set(["assetio.locatable"]);

    let references: Vec<EntityReference> = ["lib:///cat", "lib:///cat?v=1", "lib:///cat?v=9", "lib:///cat?v=one"]
        .into_iter()
        .map(EntityReference::new)
        .collect();
    let results = manager
        .resolve_batch(&references, &traits, ResolveAccess::Read, &context)
        .unwrap();

    assert_eq!(location(results[0].as_ref().unwrap()), Some(&PropertyValue::from("file:///cat_v2.png")));
    assert_eq!(location(results[1].as_ref().unwrap()), Some(&PropertyValue::from("file:///cat_v1.png")));
    assert_eq!(results[2].as_ref().unwrap_err().code, ErrorCode::EntityResolutionError);
    assert_eq!(results[3].as_ref().unwrap_err().code, ErrorCode::MalformedEntityReference);

    // Only the requested traits come back
    assert!(!results[0].as_ref().unwrap().has_trait("assetio.image"));
}

#[test]
fn test_resolve_manager_driven_is_an_access_error() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);
    let context = manager.create_context().unwrap();

    let err = manager
        .resolve_one(
            &EntityReference::new("lib:///cat"),
            &trait_set(["assetio.locatable"]),
            ResolveAccess::ManagerDriven,
            &context,
        )
        .unwrap_err();
    match err {
        Error::BatchElement { index, error } => {
            assert_eq!(index, 0);
            assert_eq!(error.code, ErrorCode::EntityAccessError);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_existence_and_traits() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);
    let context = manager.create_context().unwrap();

    assert!(manager.entity_exists_one(&EntityReference::new("lib:///cat"), &context).unwrap());
    assert!(!manager.entity_exists_one(&EntityReference::new("lib:///dog"), &context).unwrap());

    let traits = manager
        .entity_traits_one(&EntityReference::new("lib:///cat_notes"), EntityTraitsAccess::Read, &context)
        .unwrap();
    assert_eq!(traits, trait_set(["assetio.locatable", "assetio.text"]));

    // Unknown entities accept any traits for writing
    let writable = manager
        .entity_traits_one(&EntityReference::new("lib:///dog"), EntityTraitsAccess::Write, &context)
        .unwrap();
    assert!(writable.is_empty());
}

#[test]
fn test_default_entity_reference_respects_access() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);
    let context = manager.create_context().unwrap();
    let sets = vec![trait_set(["assetio.image"]), trait_set(["assetio.video"])];

    let read = manager
        .default_entity_reference_batch(&sets, DefaultEntityAccess::Read, &context)
        .unwrap();
    assert_eq!(read[0].as_ref().unwrap(), &Some(EntityReference::new("lib:///cat")));
    assert_eq!(read[1].as_ref().unwrap(), &None);

    let write = manager
        .default_entity_reference_batch(&sets, DefaultEntityAccess::Write, &context)
        .unwrap();
    assert_eq!(write[0].as_ref().unwrap(), &Some(EntityReference::new("lib:///cat_small")));
}

#[test]
fn test_relationships_are_paged_and_filtered() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);
    let context = manager.create_context().unwrap();
    let session = manager.host_session();
    let related = TraitsData::with_traits(&trait_set(["assetio.related"]));

    let mut results = manager
        .get_with_relationship_batch(
            &[EntityReference::new("lib:///cat")],
            &related,
            &TraitSet::new(),
            1,
            RelationsAccess::Read,
            &context,
        )
        .unwrap();
    let pager = results[0].as_mut().unwrap();

    let mut seen = pager.get(session).unwrap();
    assert!(pager.has_next(session).unwrap());
    pager.next(session).unwrap();
    seen.extend(pager.get(session).unwrap());
    assert!(!pager.has_next(session).unwrap());
    assert_eq!(
        seen,
        vec![EntityReference::new("lib:///cat_small"), EntityReference::new("lib:///cat_notes")]
    );

    let mut images_only = manager
        .get_with_relationships_batch(
            &EntityReference::new("lib:///cat"),
            &[related.clone(), TraitsData::with_traits(&trait_set(["assetio.unrelated"]))],
            &trait_set(["assetio.image"]),
            10,
            RelationsAccess::Read,
            &context,
        )
        .unwrap();
    assert_eq!(
        images_only[0].as_mut().unwrap().get(session).unwrap(),
        vec![EntityReference::new("lib:///cat_small")]
    );
    assert!(images_only[1].as_mut().unwrap().get(session).unwrap().is_empty());

    let write = manager
        .get_with_relationship_batch(
            &[EntityReference::new("lib:///cat")],
            &related,
            &trait_set(["assetio.image"]),
            10,
            RelationsAccess::Write,
            &context,
        )
        .unwrap();
    assert_eq!(write[0].as_ref().err().map(|e| e.code), Some(ErrorCode::EntityAccessError));
}

#[test]
fn test_publish_appends_versions_and_persists() {
    let dir = tempdir().unwrap();
    let library_path = write_library(dir.path());
    let manager = library_manager(&library_path, &[]);
    let context = manager.create_context().unwrap();

    let mut data = TraitsData::new();
    data.set_trait_property("assetio.locatable", "location", "file:///cat_v3.png");

    let working = manager
        .preflight_one(&EntityReference::new("lib:///cat?v=1"), &data, PublishingAccess::Write, &context)
        .unwrap();
    assert_eq!(working, EntityReference::new("lib:///cat"));

    let published = manager
        .register_one(&working, &data, PublishingAccess::Write, &context)
        .unwrap();
    assert_eq!(published, EntityReference::new("lib:///cat?v=3"));

    let resolved = manager
        .resolve_one(&working, &trait_set(["assetio.locatable"]), ResolveAccess::Read, &context)
        .unwrap();
    assert_eq!(location(&resolved), Some(&PropertyValue::from("file:///cat_v3.png")));

    // Written back to disk
    let on_disk: LibraryData = serde_json::from_str(&fs::read_to_string(&library_path).unwrap()).unwrap();
    assert_eq!(on_disk.entities["cat"].len(), 3);

    let brand_new = manager
        .register_one(&EntityReference::new("lib:///dog"), &data, PublishingAccess::Write, &context)
        .unwrap();
    assert_eq!(brand_new, EntityReference::new("lib:///dog?v=1"));
}

#[test]
fn test_publishing_rejections() {
    let dir = tempdir().unwrap();
    let library_path = write_library(dir.path());
    let manager = library_manager(&library_path, &[]);
    let context = manager.create_context().unwrap();
    let data = TraitsData::with_traits(&trait_set(["assetio.image"]));

    let hints = manager
        .preflight_batch(&[EntityReference::new("lib:///cat")], &[TraitsData::new()], PublishingAccess::Write, &context)
        .unwrap();
    assert_eq!(hints[0].as_ref().unwrap_err().code, ErrorCode::InvalidPreflightHint);

    let related = manager
        .register_batch(&[EntityReference::new("lib:///cat")], &[data.clone()], PublishingAccess::CreateRelated, &context)
        .unwrap();
    assert_eq!(related[0].as_ref().unwrap_err().code, ErrorCode::EntityAccessError);

    let mismatched = manager.register_batch(&[EntityReference::new("lib:///cat")], &[], PublishingAccess::Write, &context);
    assert!(matches!(mismatched, Err(Error::InputValidation { .. })));

    let read_only = library_manager(&library_path, &[("read_only", PropertyValue::from(true))]);
    let results = read_only
        .register_batch(&[EntityReference::new("lib:///cat")], &[data], PublishingAccess::Write, &context)
        .unwrap();
    assert_eq!(results[0].as_ref().unwrap_err().code, ErrorCode::EntityAccessError);
}

#[test]
fn test_flush_caches_reloads_library() {
    let dir = tempdir().unwrap();
    let library_path = write_library(dir.path());
    let manager = library_manager(&library_path, &[]);
    let context = manager.create_context().unwrap();
    let dog = EntityReference::new("lib:///dog");

    assert!(!manager.entity_exists_one(&dog, &context).unwrap());

    let mut library: LibraryData = serde_json::from_str(LIBRARY_JSON).unwrap();
    library.entities.insert("dog".to_string(), vec![TraitsData::with_traits(&trait_set(["assetio.image"]))]);
    library.save(Path::new(&library_path)).unwrap();

    assert!(!manager.entity_exists_one(&dog, &context).unwrap());
    manager.flush_caches().unwrap();
    assert!(manager.entity_exists_one(&dog, &context).unwrap());
}

#[test]
fn test_management_policy() {
    let dir = tempdir().unwrap();
    let manager = library_manager(
        &write_library(dir.path()),
        &[("policy_trait", PropertyValue::from("assetio.managed"))],
    );
    let context = manager.create_context().unwrap();

    let policies = manager
        .management_policy(
            &[trait_set(["assetio.image", "assetio.locatable"]), trait_set(["assetio.video"])],
            PolicyAccess::Read,
            &context,
        )
        .unwrap();
    assert_eq!(policies[0].trait_set(), trait_set(["assetio.locatable", "assetio.managed"]));
    assert!(policies[1].is_empty());
}

#[test]
fn test_terminology_and_contexts() {
    let dir = tempdir().unwrap();
    let manager = library_manager(&write_library(dir.path()), &[]);

    let terms = [("asset".to_string(), "asset".to_string())].into_iter().collect();
    assert_eq!(manager.update_terminology(terms).unwrap()["asset"], "sprite");

    let context = manager.create_context().unwrap();
    assert!(context.manager_state.is_some());
    let child = manager.create_child_context(&context).unwrap();
    assert!(child.manager_state.is_some());

    let token = manager.persistence_token_for_context(&child).unwrap();
    assert!(!token.is_empty());
    let restored = manager.context_from_persistence_token(&token).unwrap();
    assert_eq!(manager.persistence_token_for_context(&restored).unwrap(), token);
}

#[test]
fn test_invalid_settings_fail_initialization() {
    let mut settings = InfoDictionary::new();
    settings.insert("library_path".to_string(), PropertyValue::from("/nonexistent/library.json"));
    let err = manager_factory()
        .create_initialized_manager(LIBRARY_MANAGER_IDENTIFIER, settings)
        .unwrap_err();
    assert!(err.is_configuration_error());
}

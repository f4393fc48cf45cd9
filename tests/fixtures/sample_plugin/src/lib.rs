//! Minimal manager plugin loaded from disk by the native plugin tests.
//!
//! Resolves `sample:///<name>` to a location under `file:///sample/`.

use assetio::manager_api::{BoxedManagerInterface, ErrorCallback, SuccessCallback};
use assetio::plugin_system::{ManagerPlugin, PluginSystemPlugin};
use assetio::{
    BatchElementError, Capability, Context, EntityReference, ErrorCode, HostSession, InfoDictionary,
    ManagerInterface, ResolveAccess, TraitSet, TraitsData,
};

pub const SAMPLE_IDENTIFIER: &str = "org.assetio.sample";
const PREFIX: &str = "sample:///";

#[derive(Default)]
struct SampleManager {
    settings: InfoDictionary,
}

impl ManagerInterface for SampleManager {
    fn identifier(&self) -> String {
        SAMPLE_IDENTIFIER.to_string()
    }

    fn display_name(&self) -> String {
        "Sample Plugin".to_string()
    }

    fn settings(&self, _host_session: &HostSession) -> assetio::Result<InfoDictionary> {
        Ok(self.settings.clone())
    }

    fn initialize(&mut self, settings: InfoDictionary, _host_session: &HostSession) -> assetio::Result<()> {
        self.settings = settings;
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool {
        matches!(capability, Capability::EntityReferenceIdentification | Capability::Resolution)
    }

    fn is_entity_reference_string(&self, candidate: &str, _host_session: &HostSession) -> bool {
        candidate.starts_with(PREFIX)
    }

    fn resolve(
        &self,
        entity_references: &[EntityReference],
        _trait_set: &TraitSet,
        access: ResolveAccess,
        _context: &Context,
        _host_session: &HostSession,
        success: SuccessCallback<'_, TraitsData>,
        error: ErrorCallback<'_>,
    ) -> assetio::Result<()> {
        for (idx, reference) in entity_references.iter().enumerate() {
            match reference.as_str().strip_prefix(PREFIX) {
                Some(name) if access == ResolveAccess::Read && !name.is_empty() => {
                    let mut data = TraitsData::new();
                    data.set_trait_property("assetio.locatable", "location", format!("file:///sample/{}", name));
                    success(idx, data);
                }
                _ => error(
                    idx,
                    BatchElementError::new(ErrorCode::EntityResolutionError, reference.as_str()),
                ),
            }
        }
        Ok(())
    }
}

struct SamplePlugin;

impl PluginSystemPlugin for SamplePlugin {
    fn identifier(&self) -> assetio::Result<String> {
        Ok(SAMPLE_IDENTIFIER.to_string())
    }

    fn as_manager_plugin(&self) -> Option<&dyn ManagerPlugin> {
        Some(self)
    }
}

impl ManagerPlugin for SamplePlugin {
    fn interface(&self) -> BoxedManagerInterface {
        Box::new(SampleManager::default())
    }
}

assetio::export_manager_plugin!(SamplePlugin, || SamplePlugin);

//! API Version
//!
//! Build-time API version read from Cargo.toml metadata
//! (`package.metadata.assetio.api_version`).

// Include the build-generated API version constant
include!(concat!(env!("OUT_DIR"), "/version_api.rs"));

/// Package version followed by the plugin API date, as shown by `--version`
pub const LONG_VERSION: &str = env!("ASSETIO_LONG_VERSION");

/// Get the current API version
///
/// To increment the API version:
/// 1. Edit Cargo.toml: package.metadata.assetio.api_version = NEW_VERSION
/// 2. Commit the change to source control
/// 3. Build - new version will be used
///
/// Version format: YYYYMMDD (e.g., 20261018 = 18 October 2026)
pub fn get_api_version() -> u32 {
    API_VERSION
}

/// Convert a YYYYMMDD version to a YYYY-MM-DD string
pub fn version_to_date_string(version: u32) -> String {
    let year = version / 10000;
    let month = (version % 10000) / 100;
    let day = version % 100;
    format!("{year:04}-{month:02}-{day:02}")
}

use std::env;
use std::fs;
use std::path::Path;

/// Read `package.metadata.assetio.api_version` and check it is a plausible YYYYMMDD date
fn read_api_version(manifest: &Path) -> u32 {
    let content = fs::read_to_string(manifest).expect("Failed to read Cargo.toml");
    let cargo_toml: toml::Value = content.parse().expect("Failed to parse Cargo.toml");

    let raw = cargo_toml
        .get("package")
        .and_then(|p| p.get("metadata"))
        .and_then(|m| m.get("assetio"))
        .and_then(|a| a.get("api_version"))
        .and_then(|v| v.as_integer())
        .expect("Failed to find package.metadata.assetio.api_version in Cargo.toml");

    let version = u32::try_from(raw).expect("api_version must be a positive YYYYMMDD integer");
    let (month, day) = ((version % 10000) / 100, version % 100);
    if !(19700000..=99991231).contains(&version) || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        panic!("api_version {} is not a YYYYMMDD date", version);
    }
    version
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");

    let api_version = read_api_version(&Path::new(&manifest_dir).join("Cargo.toml"));

    fs::write(
        Path::new(&out_dir).join("version_api.rs"),
        format!(
            "// Generated from package.metadata.assetio.api_version\n\
             pub const API_VERSION: u32 = {};\n",
            api_version
        ),
    )
    .expect("Failed to write version_api.rs");

    // Shown by `assetio --version`
    let package_version = env::var("CARGO_PKG_VERSION").expect("CARGO_PKG_VERSION not set");
    println!(
        "cargo:rustc-env=ASSETIO_LONG_VERSION={} (plugin API {:04}-{:02}-{:02})",
        package_version,
        api_version / 10000,
        (api_version % 10000) / 100,
        api_version % 100
    );

    println!("cargo:rerun-if-changed=Cargo.toml");
}

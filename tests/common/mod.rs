//! Shared test utilities

#![allow(dead_code)]

use pdp_cli::api::HttpEntityApi;
use pdp_cli::client::HttpClient;
use pdp_cli::entity::Product;
use pdp_cli::fs::OsFileSystem;
use pdp_cli::project::Project;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cached binary path for the pdp CLI to avoid repeated lookups
#[allow(deprecated)]
pub static PDP_BIN: std::sync::LazyLock<PathBuf> =
    std::sync::LazyLock::new(|| assert_cmd::cargo::cargo_bin("pdp"));

/// Test helper to create a command with the cached binary, isolated from the
/// caller's environment
pub fn pdp_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(&*PDP_BIN);
    cmd.env_remove("PDP_PROJECT")
        .env_remove("PDP_LOG")
        .env_remove("PDP_INGESTION_URL")
        .env_remove("PDP_DISCOVERY_URL")
        .env_remove("PDP_CORE_URL")
        .env_remove("PDP_STAGING_URL");
    cmd
}

/// Writes `content` as pretty JSON to `<root>/<relative>`.
pub fn write_json(root: &Path, relative: &str, content: &Value) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(content).unwrap()).unwrap();
}

pub fn read_json(root: &Path, relative: &str) -> Value {
    serde_json::from_str(&std::fs::read_to_string(root.join(relative)).unwrap()).unwrap()
}

pub fn project(root: &Path) -> Project<OsFileSystem> {
    Project::new(root)
}

/// An API client sending every product to `base_url`.
pub fn api_for(base_url: &str) -> HttpEntityApi {
    Product::ALL.iter().fold(
        HttpEntityApi::new(HttpClient::new(Duration::from_secs(5)).unwrap(), 100),
        |api, product| api.with_base_url(*product, base_url),
    )
}

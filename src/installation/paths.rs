// src/installation/paths.rs
//! Fixed locations of installation metadata relative to the base directory

use std::path::{Path, PathBuf};

/// Directory holding installation metadata
pub const METADATA_DIR: &str = ".installation";
/// Directory holding the provisioning descriptor
pub const PROVISIONING_DIR: &str = ".galleon";

pub fn metadata_dir(base: &Path) -> PathBuf {
    base.join(METADATA_DIR)
}

pub fn manifest_file(base: &Path) -> PathBuf {
    metadata_dir(base).join("manifest.toml")
}

pub fn channels_file(base: &Path) -> PathBuf {
    metadata_dir(base).join("channels.toml")
}

pub fn manifest_versions_file(base: &Path) -> PathBuf {
    metadata_dir(base).join("manifest-versions.toml")
}

pub fn history_file(base: &Path) -> PathBuf {
    metadata_dir(base).join("history.json")
}

pub fn config_file(base: &Path) -> PathBuf {
    metadata_dir(base).join("cairn.toml")
}

pub fn marker_file(base: &Path) -> PathBuf {
    metadata_dir(base).join("candidate.json")
}

pub fn cache_dir(base: &Path) -> PathBuf {
    metadata_dir(base).join(".cache")
}

pub fn provisioning_file(base: &Path) -> PathBuf {
    base.join(PROVISIONING_DIR).join("provisioning.toml")
}

pub fn modules_dir(base: &Path) -> PathBuf {
    base.join("modules")
}

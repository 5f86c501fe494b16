// src/channel/mod.rs

//! Channels: prioritized sources of artifacts
//!
//! A channel groups one or more repositories and may carry a manifest that
//! restricts which versions the channel offers. Channel priority is the
//! position in the channel list; the first channel able to satisfy a request
//! wins.
//!
//! # Example channels.toml
//!
//! ```toml
//! [[channel]]
//! name = "server-base"
//! repositories = [{ id = "central", url = "file:///srv/repo" }]
//!
//! [channel.manifest.maven]
//! group_id = "org.example.channels"
//! artifact_id = "server-base"
//!
//! [[channel]]
//! name = "patches"
//! repositories = [{ id = "patches", url = "/srv/patches" }]
//! manifest = { url = "file:///srv/patches/manifest.toml" }
//! ```

mod manifest;
mod session;
mod source;

pub use manifest::{
    ChannelManifest, ManifestVersionRecord, MavenManifestEntry, OpenManifestEntry, Stream,
    UrlManifestEntry, MANIFEST_CLASSIFIER, MANIFEST_EXTENSION,
};
pub use session::{ChannelSession, FoundArtifact};
pub use source::{ArtifactSource, FilesystemSource};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A repository backing a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub url: String,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Local directory for `file:` URLs and bare paths
    pub fn local_path(&self) -> Option<PathBuf> {
        local_path(&self.url)
    }
}

/// Map `file://`, `file:` and bare paths to a filesystem path
pub(crate) fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Some(PathBuf::from(rest));
    }
    if let Some(rest) = url.strip_prefix("file:") {
        return Some(PathBuf::from(rest));
    }
    if url.contains("://") {
        return None;
    }
    Some(PathBuf::from(url))
}

/// A manifest artifact published in the channel's repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenManifestRef {
    pub group_id: String,
    pub artifact_id: String,
    /// Pinned manifest version; latest available when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Where a channel's manifest comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestRef {
    Maven(MavenManifestRef),
    Url(String),
}

/// A prioritized artifact source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestRef>,
}

impl Channel {
    pub fn new(name: impl Into<String>, repositories: Vec<Repository>) -> Self {
        Self {
            name: name.into(),
            description: None,
            repositories,
            manifest: None,
        }
    }

    pub fn with_manifest(mut self, manifest: ManifestRef) -> Self {
        self.manifest = Some(manifest);
        self
    }
}

/// On-disk channel list (`channels.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsFile {
    #[serde(default, rename = "channel")]
    pub channels: Vec<Channel>,
}

impl ChannelsFile {
    pub fn load(path: &Path) -> Result<Vec<Channel>> {
        let content = fs::read_to_string(path)?;
        let file: ChannelsFile = toml::from_str(&content)?;
        Ok(file.channels)
    }

    pub fn to_toml(channels: &[Channel]) -> Result<String> {
        let file = ChannelsFile {
            channels: channels.to_vec(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }
}

// src/channel/manifest.rs

//! Channel manifests and manifest version records.
//!
//! A manifest lists *streams*: for each `group_id:artifact_id` either a fixed
//! version or a regular expression describing acceptable versions. A stream
//! with artifact id `*` covers every artifact of its group.

use crate::coordinate::ArtifactKey;
use crate::error::{Error, Result};
use crate::version::Version;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Classifier under which manifests are published in a repository
pub const MANIFEST_CLASSIFIER: &str = "manifest";
/// Extension under which manifests are published in a repository
pub const MANIFEST_EXTENSION: &str = "toml";

const SCHEMA_VERSION: &str = "1.0.0";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Allowed versions for one artifact (or one group, with `*`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_pattern: Option<String>,
    /// `version_pattern` compiled when the manifest is parsed
    #[serde(skip)]
    matcher: Option<Regex>,
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.version == other.version
            && self.version_pattern == other.version_pattern
    }
}

impl Eq for Stream {}

fn anchored(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}

impl Stream {
    pub fn pinned(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: Some(version.into()),
            version_pattern: None,
            matcher: None,
        }
    }

    /// Whether `version` is acceptable for this stream
    pub fn allows(&self, version: &Version) -> Result<bool> {
        if let Some(ref pinned) = self.version {
            return Ok(Version::parse(pinned)? == *version);
        }
        match (&self.matcher, &self.version_pattern) {
            (Some(re), _) => Ok(re.is_match(version.as_str())),
            (None, Some(pattern)) => Ok(anchored(pattern)?.is_match(version.as_str())),
            (None, None) => Ok(false),
        }
    }

    /// Check the constraint and compile a version pattern
    fn prepare(&mut self) -> Result<()> {
        match (&self.version, &self.version_pattern) {
            (Some(_), Some(_)) | (None, None) => Err(Error::InvalidManifest(format!(
                "stream {}:{} must define exactly one of version or version_pattern",
                self.group_id, self.artifact_id
            ))),
            (Some(v), None) => Version::parse(v).map(|_| ()),
            (None, Some(p)) => {
                self.matcher = Some(anchored(p)?);
                Ok(())
            }
        }
    }
}

/// The set of streams a channel offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "stream")]
    pub streams: Vec<Stream>,
}

impl Default for ChannelManifest {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: None,
            id: None,
            description: None,
            streams: Vec::new(),
        }
    }
}

impl ChannelManifest {
    pub fn parse(content: &str) -> Result<Self> {
        let mut manifest: ChannelManifest = toml::from_str(content)?;
        for stream in &mut manifest.streams {
            stream.prepare()?;
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Stream for an artifact; an exact artifact id beats a `*` stream
    pub fn find_stream(&self, group_id: &str, artifact_id: &str) -> Option<&Stream> {
        self.streams
            .iter()
            .find(|s| s.group_id == group_id && s.artifact_id == artifact_id)
            .or_else(|| {
                self.streams
                    .iter()
                    .find(|s| s.group_id == group_id && s.artifact_id == "*")
            })
    }

    /// Pin `key` to `version`, adding a stream when none exists
    pub fn update_version(&mut self, key: &ArtifactKey, version: &str) {
        match self
            .streams
            .iter_mut()
            .find(|s| s.group_id == key.group_id && s.artifact_id == key.artifact_id)
        {
            Some(stream) => {
                stream.version = Some(version.to_string());
                stream.version_pattern = None;
                stream.matcher = None;
            }
            None => self
                .streams
                .push(Stream::pinned(&key.group_id, &key.artifact_id, version)),
        }
    }

    /// Manifest pinning exactly the given artifact versions
    pub fn pinned<'a, I>(name: &str, artifacts: I) -> Self
    where
        I: IntoIterator<Item = (&'a ArtifactKey, &'a str)>,
    {
        let mut streams: BTreeMap<(String, String), String> = BTreeMap::new();
        for (key, version) in artifacts {
            streams.insert(
                (key.group_id.clone(), key.artifact_id.clone()),
                version.to_string(),
            );
        }
        Self {
            name: Some(name.to_string()),
            streams: streams
                .into_iter()
                .map(|((g, a), v)| Stream::pinned(g, a, v))
                .collect(),
            ..Self::default()
        }
    }
}

/// A channel whose manifest is a repository artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenManifestEntry {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A channel whose manifest is addressed by URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlManifestEntry {
    pub url: String,
    /// SHA-256 of the manifest content
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A channel without a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenManifestEntry {
    pub repositories: Vec<String>,
}

/// Which manifest version satisfied each channel during a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestVersionRecord {
    #[serde(default)]
    pub maven: Vec<MavenManifestEntry>,
    #[serde(default)]
    pub url: Vec<UrlManifestEntry>,
    #[serde(default)]
    pub open: Vec<OpenManifestEntry>,
}

impl ManifestVersionRecord {
    pub fn is_empty(&self) -> bool {
        self.maven.is_empty() && self.url.is_empty() && self.open.is_empty()
    }

    /// One-line description for logs and history entries
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .maven
            .iter()
            .map(|m| format!("{}:{}:{}", m.group_id, m.artifact_id, m.version))
            .collect();
        parts.extend(self.url.iter().map(|u| format!("{}#{}", u.url, u.hash)));
        parts.extend(
            self.open
                .iter()
                .map(|o| format!("open[{}]", o.repositories.join(","))),
        );
        parts.join(", ")
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

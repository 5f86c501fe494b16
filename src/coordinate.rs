// src/coordinate.rs

//! Artifact coordinates
//!
//! A coordinate names a component artifact as
//! `groupId:artifactId[:extension[:classifier]]:version`. Requests carry
//! either a version or a version range; a [`ResolvedArtifact`] is what the
//! resolver hands back once a concrete version and content file are known.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default extension when a coordinate does not name one
pub const DEFAULT_EXTENSION: &str = "jar";

/// Identity of an artifact, ignoring its version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub classifier: String,
    pub extension: String,
}

impl ArtifactKey {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: classifier.into(),
            extension: extension.into(),
        }
    }

    /// File name of this artifact at `version` in a repository or module
    pub fn file_name(&self, version: &str) -> String {
        if self.classifier.is_empty() {
            format!("{}-{}.{}", self.artifact_id, version, self.extension)
        } else {
            format!(
                "{}-{}-{}.{}",
                self.artifact_id, version, self.classifier, self.extension
            )
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.extension)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        Ok(())
    }
}

/// An artifact request: a key plus a version and/or a version range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub extension: String,
    pub version: Option<String>,
    pub version_range: Option<String>,
}

impl ArtifactCoordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: String::new(),
            extension: DEFAULT_EXTENSION.to_string(),
            version: None,
            version_range: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.version_range = Some(range.into());
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Parse `group:artifact:version`, `group:artifact:extension:version`
    /// or `group:artifact:extension:classifier:version`
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidCoordinate(s.to_string()));
        }

        let coordinate = match parts.as_slice() {
            [g, a] => Self::new(*g, *a),
            [g, a, v] => Self::new(*g, *a).with_version(*v),
            [g, a, e, v] => Self::new(*g, *a).with_extension(*e).with_version(*v),
            [g, a, e, c, v] => Self::new(*g, *a)
                .with_extension(*e)
                .with_classifier(*c)
                .with_version(*v),
            _ => return Err(Error::InvalidCoordinate(s.to_string())),
        };
        Ok(coordinate)
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(
            self.group_id.clone(),
            self.artifact_id.clone(),
            self.classifier.clone(),
            self.extension.clone(),
        )
    }

    /// Version if present and non-blank
    pub fn concrete_version(&self) -> Option<&str> {
        self.version.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Version range if present and non-blank
    pub fn concrete_range(&self) -> Option<&str> {
        self.version_range
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// File name for the requested version
    pub fn file_name(&self) -> Result<String> {
        let version = self
            .concrete_version()
            .ok_or_else(|| Error::MissingVersion(self.to_string()))?;
        Ok(self.key().file_name(version))
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.extension)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        match (&self.version, &self.version_range) {
            (_, Some(range)) => write!(f, ":{}", range),
            (Some(version), None) => write!(f, ":{}", version),
            (None, None) => Ok(()),
        }
    }
}

/// An artifact with a concrete version and retrievable content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub key: ArtifactKey,
    pub version: String,
    pub path: PathBuf,
    /// Name of the channel that supplied the artifact
    pub channel: String,
}

impl ResolvedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The request this artifact satisfies, pinned to the resolved version
    pub fn coordinate(&self) -> ArtifactCoordinate {
        ArtifactCoordinate::new(self.key.group_id.clone(), self.key.artifact_id.clone())
            .with_extension(self.key.extension.clone())
            .with_classifier(self.key.classifier.clone())
            .with_version(self.version.clone())
    }

    pub fn file_name(&self) -> String {
        self.key.file_name(&self.version)
    }
}

impl fmt::Display for ResolvedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.key, self.version, self.path.display())
    }
}

// src/error.rs

//! Error types shared by the resolver, the installation model and the
//! candidate builder.

use crate::coordinate::ArtifactCoordinate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Coordinate carries neither a version nor a range
    #[error("version is not set for {0}")]
    MissingVersion(String),

    /// The same coordinate was resolved twice in one session
    #[error("artifact {0} is already resolved")]
    AlreadyResolved(String),

    /// No channel can satisfy the request
    #[error("artifact is not found {group_id}:{artifact_id}")]
    ArtifactNotFound {
        group_id: String,
        artifact_id: String,
    },

    /// Aggregate failure surfaced to the user after provisioning
    #[error("{}", resolution_message(.artifacts, .repositories, .offline))]
    ArtifactResolution {
        artifacts: Vec<String>,
        repositories: Vec<String>,
        offline: bool,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Raised by planners that collected several unresolved artifacts
    #[error("unable to resolve {} artifact(s)", .artifacts.len())]
    UnresolvedArtifacts {
        artifacts: Vec<ArtifactCoordinate>,
        repositories: Vec<String>,
    },

    /// A repository failed while answering a query
    #[error("repository {repository} failed")]
    Repository {
        repository: String,
        #[source]
        source: Box<Error>,
    },

    #[error("repository URL is not supported: {0}")]
    UnsupportedRepository(String),

    #[error("failed to write installation metadata to {}", .path.display())]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to populate artifact cache at {}", .path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("unable to retrieve current manifest versions")]
    ManifestVersionLookup {
        #[source]
        source: Box<Error>,
    },

    #[error("unable to install {artifact}")]
    Install {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("installation at {} has no saved revisions", .0.display())]
    NoRevision(PathBuf),

    #[error("staging directory {} is not empty", .0.display())]
    StagingNotEmpty(PathBuf),

    #[error("invalid artifact coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    #[error("invalid version range '{0}'")]
    InvalidVersionRange(String),

    #[error("invalid channel manifest: {0}")]
    InvalidManifest(String),

    #[error("invalid candidate marker at {}: {reason}", .path.display())]
    InvalidMarker { path: PathBuf, reason: String },

    #[error("provisioning failed: {0}")]
    Planner(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid version pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    pub fn not_found(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self::ArtifactNotFound {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

fn resolution_message(artifacts: &[String], repositories: &[String], offline: &bool) -> String {
    let mut msg = format!("Unable to resolve artifacts: {}", artifacts.join(", "));
    if !repositories.is_empty() {
        msg.push_str(&format!(" (attempted repositories: {})", repositories.join(", ")));
    }
    if *offline {
        msg.push_str(". Offline mode is enabled, only locally available artifacts can be used");
    }
    msg
}

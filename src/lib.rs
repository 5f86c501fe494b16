// src/lib.rs

//! Cairn: channel-based artifact resolution and candidate staging
//!
//! Resolves the artifacts of a modular server distribution against an
//! ordered list of channels and stages complete candidate installations
//! beside the live one, ready to be applied or reverted.
//!
//! # Architecture
//!
//! - Channels: prioritized repositories, optionally restricted by a manifest
//! - Resolver: first channel able to satisfy a request wins
//! - Installation: module tree plus metadata under `.installation/`
//! - Candidates: staged installations labeled by a marker written last

pub mod cache;
pub mod candidate;
pub mod channel;
pub mod config;
pub mod coordinate;
mod error;
pub mod filesystem;
pub mod hash;
pub mod installation;
pub mod resolver;
pub mod version;

pub use cache::ArtifactCache;
pub use candidate::{
    inspect_candidate, BuildReport, BuildWarning, CandidateBuilder, CandidateState,
    CandidateStatus, MarkerFile, OperationKind, Planner, ProvisioningOptions, StagingDir,
};
pub use channel::{
    ArtifactSource, Channel, ChannelManifest, FilesystemSource, ManifestRef,
    ManifestVersionRecord, Repository,
};
pub use config::ResolverConfig;
pub use coordinate::{ArtifactCoordinate, ArtifactKey, ResolvedArtifact};
pub use error::{Error, Result};
pub use installation::{Installation, InstallationMetadata, SavedState};
pub use resolver::{ArtifactRepository, CachePolicy, ChannelArtifactResolver, ResolvedArtifactSet};
pub use version::{Version, VersionRange};

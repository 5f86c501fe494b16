// src/resolver/mod.rs

//! Channel artifact resolution
//!
//! Turns artifact requests into concrete, retrievable artifacts by asking
//! channels in priority order. Resolution is two-tier: the first channel
//! able to satisfy the requested range wins, and only then is the highest
//! matching version picked *within* that channel. A later channel offering
//! a higher version is never consulted.
//!
//! ```text
//! resolve(coordinate)                 resolve_latest_version(coordinate)
//!     |                                   |
//!     | version required                  | range, else [version,)
//!     +---------------------------------->+
//!                                         v
//!                        channel 0 ── satisfies range? ── yes ──> highest match
//!                            | no
//!                        channel 1 ── ...
//!                            | none
//!                            v
//!                     ArtifactNotFound
//! ```
//!
//! A resolver holds per-session state and takes `&mut self` for every
//! resolution; concurrent builds need their own resolver.

mod set;

pub use set::ResolvedArtifactSet;

use crate::channel::{ArtifactSource, Channel, ChannelManifest, ChannelSession};
use crate::config::ResolverConfig;
use crate::coordinate::{ArtifactCoordinate, ArtifactKey, ResolvedArtifact};
use crate::error::{Error, Result};
use crate::version::{Version, VersionRange};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Decides which resolved artifacts are kept for the content cache
pub type CachePolicy = Box<dyn Fn(&ArtifactKey) -> bool>;

/// Cache artifacts whose extension is one of `extensions`
pub fn extension_policy(extensions: Vec<String>) -> CachePolicy {
    Box::new(move |key: &ArtifactKey| extensions.iter().any(|e| *e == key.extension))
}

/// The resolver interface handed to provisioning planners
pub trait ArtifactRepository {
    /// Resolve a coordinate carrying a concrete version
    fn resolve(&mut self, coordinate: &ArtifactCoordinate) -> Result<ResolvedArtifact>;

    /// Resolve the newest version allowed by the coordinate's range, or by
    /// `[version,)` when only a version is given
    fn resolve_latest_version(&mut self, coordinate: &ArtifactCoordinate) -> Result<ResolvedArtifact>;

    /// Every version the configured channels can offer for the coordinate
    fn get_version_range(&self, coordinate: &ArtifactCoordinate) -> Result<Vec<Version>>;

    /// Repositories consulted, for diagnostics
    fn repositories(&self) -> Vec<String>;

    fn is_offline(&self) -> bool;
}

pub struct ChannelArtifactResolver {
    session: ChannelSession,
    requested: HashSet<ArtifactCoordinate>,
    resolved: ResolvedArtifactSet,
    recorded: ResolvedArtifactSet,
    cache_policy: CachePolicy,
}

impl ChannelArtifactResolver {
    /// Create a resolver caching `jar` artifacts
    pub fn new(channels: Vec<Channel>, source: Box<dyn ArtifactSource>) -> Result<Self> {
        Self::from_config(channels, source, &ResolverConfig::default())
    }

    pub fn from_config(
        channels: Vec<Channel>,
        source: Box<dyn ArtifactSource>,
        config: &ResolverConfig,
    ) -> Result<Self> {
        Ok(Self {
            session: ChannelSession::new(channels, source)?,
            requested: HashSet::new(),
            resolved: ResolvedArtifactSet::new(),
            recorded: ResolvedArtifactSet::new(),
            cache_policy: config.cache_policy(),
        })
    }

    /// Replace the cache-eligibility rule
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    pub fn session(&self) -> &ChannelSession {
        &self.session
    }

    /// Cache-eligible artifacts resolved so far
    pub fn resolved_artifacts(&self) -> &ResolvedArtifactSet {
        &self.resolved
    }

    /// Every artifact resolved so far, regardless of cache eligibility
    pub fn all_resolved(&self) -> &ResolvedArtifactSet {
        &self.recorded
    }

    /// Manifest pinning every artifact resolved in this session
    pub fn recorded_manifest(&self) -> ChannelManifest {
        ChannelManifest::pinned("recorded", self.recorded.versions())
    }

    /// Release transport resources; calling it again is a no-op
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    fn effective_range(coordinate: &ArtifactCoordinate) -> Result<VersionRange> {
        match (coordinate.concrete_range(), coordinate.concrete_version()) {
            (Some(range), version) => {
                if let Some(version) = version {
                    warn!(
                        "Version {} is set for {}:{} although range {} is provided, using the range",
                        version, coordinate.group_id, coordinate.artifact_id, range
                    );
                }
                VersionRange::parse(range)
            }
            (None, Some(version)) => VersionRange::at_least(version),
            (None, None) => Err(Error::MissingVersion(coordinate.to_string())),
        }
    }
}

impl ArtifactRepository for ChannelArtifactResolver {
    fn resolve(&mut self, coordinate: &ArtifactCoordinate) -> Result<ResolvedArtifact> {
        if self.requested.contains(coordinate) {
            return Err(Error::AlreadyResolved(coordinate.to_string()));
        }
        if coordinate.concrete_version().is_none() {
            return Err(Error::MissingVersion(coordinate.to_string()));
        }
        self.resolve_latest_version(coordinate)
    }

    fn resolve_latest_version(&mut self, coordinate: &ArtifactCoordinate) -> Result<ResolvedArtifact> {
        if self.requested.contains(coordinate) {
            return Err(Error::AlreadyResolved(coordinate.to_string()));
        }

        let range = Self::effective_range(coordinate)?;
        let key = coordinate.key();
        let found = self
            .session
            .find_latest(&key, &range)?
            .ok_or_else(|| Error::not_found(&coordinate.group_id, &coordinate.artifact_id))?;

        let artifact = ResolvedArtifact {
            key,
            version: found.version.to_string(),
            path: found.path,
            channel: found.channel,
        };

        self.requested.insert(coordinate.clone());
        if (self.cache_policy)(&artifact.key) {
            self.resolved.insert(artifact.clone());
        }
        self.recorded.insert(artifact.clone());

        info!("RESOLVED: {}", artifact);
        debug!("LATEST: Found version {} for range {}", artifact.version, range);
        Ok(artifact)
    }

    fn get_version_range(&self, coordinate: &ArtifactCoordinate) -> Result<Vec<Version>> {
        self.session.offered_versions(&coordinate.key())
    }

    fn repositories(&self) -> Vec<String> {
        self.session.repositories()
    }

    fn is_offline(&self) -> bool {
        self.session.is_offline()
    }
}

// src/candidate/mod.rs

//! Candidate transaction builder
//!
//! Stages a complete alternate installation next to the live one without
//! touching it. A build runs the planner with the channel resolver wired in,
//! records which manifests were used, caches content, writes fresh metadata
//! and finally the marker that labels the candidate as complete.
//!
//! # Build Lifecycle
//!
//! ```text
//! PLANNING -> RESOLVED -> METADATA_WRITTEN -> MARKED
//!     |           |              |
//!     +-----------+--------------+--> FAILED
//! ```
//!
//! Recording manifest versions and populating caches are best-effort: their
//! failures become [`BuildWarning`]s in the [`BuildReport`]. Planning,
//! metadata and marker failures are fatal and leave the staging directory
//! without a marker. Nothing is rolled back; the caller owns the
//! [`StagingDir`] and discards it.

mod feature_pack;
mod marker;
mod planner;
mod staging;

pub use feature_pack::FeaturePackAnalyzer;
pub use marker::{MarkerFile, OperationKind};
pub use planner::{Planner, ProvisioningOptions, EXPORT_SYSTEM_PATHS};
pub use staging::{inspect_candidate, CandidateStatus, StagingDir};

use crate::cache::ArtifactCache;
use crate::channel::{ArtifactSource, Channel, ManifestVersionRecord};
use crate::config::ResolverConfig;
use crate::coordinate::ResolvedArtifact;
use crate::error::{Error, Result};
use crate::installation::{InstallationMetadata, SavedState};
use crate::resolver::{ArtifactRepository, ChannelArtifactResolver};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Computes which manifest version satisfied each channel
pub type ManifestVersionResolver = Box<dyn Fn(&[Channel]) -> Result<ManifestVersionRecord>>;

/// Build state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// Planner is running
    Planning,
    /// Every artifact the planner needed is resolved
    Resolved,
    /// Installation metadata written into the staging directory
    MetadataWritten,
    /// Marker written; the candidate is complete
    Marked,
    Failed,
}

impl fmt::Display for CandidateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planning => "PLANNING",
            Self::Resolved => "RESOLVED",
            Self::MetadataWritten => "METADATA_WRITTEN",
            Self::Marked => "MARKED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// A best-effort step that failed without aborting the build
#[derive(Debug, thiserror::Error)]
pub enum BuildWarning {
    #[error("manifest versions were not recorded: {0}")]
    ManifestVersionLookup(#[source] Error),

    #[error("resolved artifacts were not cached: {0}")]
    CacheWrite(#[source] Error),

    #[error("feature packs were not cached: {0}")]
    FeaturePackCache(#[source] Error),
}

/// Outcome of a successful build
#[derive(Debug)]
pub struct BuildReport {
    pub state: CandidateState,
    pub marker: MarkerFile,
    /// `None` when the manifest-version lookup failed
    pub manifest_versions: Option<ManifestVersionRecord>,
    /// Every artifact resolved while planning
    pub resolved: Vec<ResolvedArtifact>,
    pub cached_artifacts: usize,
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Wrap a planner failure caused by unresolvable artifacts
///
/// The result names the artifacts, the repositories tried and whether the
/// resolver was offline. Other failures are returned unchanged.
pub fn resolution_failure(error: Error, repository: &dyn ArtifactRepository) -> Error {
    let offline = repository.is_offline();
    match error {
        Error::UnresolvedArtifacts {
            artifacts,
            repositories,
        } => Error::ArtifactResolution {
            artifacts: artifacts.iter().map(ToString::to_string).collect(),
            repositories: if repositories.is_empty() {
                repository.repositories()
            } else {
                repositories
            },
            offline,
            source: None,
        },
        Error::ArtifactNotFound {
            group_id,
            artifact_id,
        } => Error::ArtifactResolution {
            artifacts: vec![format!("{}:{}", group_id, artifact_id)],
            repositories: repository.repositories(),
            offline,
            source: Some(Box::new(Error::not_found(group_id, artifact_id))),
        },
        e @ Error::Repository { .. } => Error::ArtifactResolution {
            artifacts: Vec::new(),
            repositories: repository.repositories(),
            offline,
            source: Some(Box::new(e)),
        },
        other => other,
    }
}

pub struct CandidateBuilder {
    installation: InstallationMetadata,
    base_revision: SavedState,
    manifest_version_resolver: Option<ManifestVersionResolver>,
    state: CandidateState,
}

impl CandidateBuilder {
    /// Prepare a build against the live installation at `installation_dir`
    ///
    /// The installation is only read. It must have at least one saved
    /// revision for the candidate to be based on.
    pub fn new(installation_dir: &Path) -> Result<Self> {
        let installation = InstallationMetadata::load(installation_dir)?;
        let base_revision = installation
            .latest_revision()
            .cloned()
            .ok_or_else(|| Error::NoRevision(installation_dir.to_path_buf()))?;

        debug!(
            "Candidate for {} will be based on revision {}",
            installation_dir.display(),
            base_revision.id
        );
        Ok(Self {
            installation,
            base_revision,
            manifest_version_resolver: None,
            state: CandidateState::Planning,
        })
    }

    /// Replace the default manifest-version lookup (the resolver's own
    /// channel session)
    pub fn with_manifest_version_resolver(mut self, resolver: ManifestVersionResolver) -> Self {
        self.manifest_version_resolver = Some(resolver);
        self
    }

    /// Resolver over the live installation's channels and configuration
    pub fn new_resolver(&self, source: Box<dyn ArtifactSource>) -> Result<ChannelArtifactResolver> {
        let config = ResolverConfig::load(self.installation.base())?;
        ChannelArtifactResolver::from_config(self.installation.channels().to_vec(), source, &config)
    }

    pub fn state(&self) -> CandidateState {
        self.state
    }

    pub fn base_revision(&self) -> &SavedState {
        &self.base_revision
    }

    pub fn installation(&self) -> &InstallationMetadata {
        &self.installation
    }

    fn transition(&mut self, next: CandidateState) {
        debug!("Candidate build {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: Error) -> Error {
        warn!("Candidate build failed in {}: {}", self.state, error);
        self.transition(CandidateState::Failed);
        error
    }

    /// Stage a complete candidate into `staging`
    pub fn build_candidate(
        &mut self,
        staging: &StagingDir,
        resolver: &mut ChannelArtifactResolver,
        planner: &mut dyn Planner,
        operation: OperationKind,
    ) -> Result<BuildReport> {
        self.state = CandidateState::Planning;
        let target = staging.path();
        let provisioning = self.installation.provisioning().cloned().unwrap_or_default();
        let mut warnings = Vec::new();

        info!(
            "Building {} candidate in {} from revision {}",
            operation,
            target.display(),
            self.base_revision.id
        );

        // Planning
        let options = ProvisioningOptions::for_candidate(&provisioning.options);
        if let Err(e) = planner.provision(target, &options, resolver) {
            let error = resolution_failure(e, &*resolver);
            return Err(self.fail(error));
        }
        self.transition(CandidateState::Resolved);

        // Manifest provenance
        let channels = resolver.session().channels();
        let lookup = match &self.manifest_version_resolver {
            Some(lookup) => lookup(&channels),
            None => resolver.session().current_manifest_versions(&channels),
        };
        let manifest_versions = match lookup {
            Ok(record) => {
                debug!("Recording manifests: {}", record.summary());
                Some(record)
            }
            Err(e) => {
                let error = Error::ManifestVersionLookup { source: Box::new(e) };
                warn!("{}", error);
                warnings.push(BuildWarning::ManifestVersionLookup(error));
                None
            }
        };

        let mut cached_artifacts = 0;
        if let Some(record) = &manifest_versions {
            match cache_resolved(target, record, resolver) {
                Ok(count) => cached_artifacts = count,
                Err(e) => {
                    warn!("{}", e);
                    warnings.push(BuildWarning::CacheWrite(e));
                }
            }
        }

        // Metadata
        let mut metadata = InstallationMetadata::new_installation(
            target,
            resolver.recorded_manifest(),
            channels,
            manifest_versions.clone(),
            self.installation.provisioning().cloned(),
        );
        metadata.append_revision(format!(
            "{} candidate based on {}",
            operation, self.base_revision.id
        ));
        if let Err(e) = metadata.write() {
            return Err(self.fail(e));
        }
        self.transition(CandidateState::MetadataWritten);

        // Feature packs
        if !provisioning.feature_packs.is_empty() {
            let cached = ArtifactCache::open(target).and_then(|mut cache| {
                FeaturePackAnalyzer::new(&*resolver).cache(&provisioning, &mut cache)
            });
            match cached {
                Ok(count) => debug!("Cached {} feature pack(s)", count),
                Err(e) => {
                    warn!("Unable to cache feature packs: {}", e);
                    warnings.push(BuildWarning::FeaturePackCache(e));
                }
            }
        }

        // Marker
        let marker = MarkerFile::new(self.base_revision.id.clone(), operation);
        if let Err(e) = marker.write(target) {
            return Err(self.fail(e));
        }
        self.transition(CandidateState::Marked);

        info!(
            "Candidate ready in {} ({} warning(s))",
            target.display(),
            warnings.len()
        );
        Ok(BuildReport {
            state: self.state,
            marker,
            manifest_versions,
            resolved: resolver.all_resolved().iter().cloned().collect(),
            cached_artifacts,
            warnings,
        })
    }
}

fn cache_resolved(
    target: &Path,
    record: &ManifestVersionRecord,
    resolver: &ChannelArtifactResolver,
) -> Result<usize> {
    let mut cache = ArtifactCache::open(target).map_err(|e| Error::CacheWrite {
        path: PathBuf::from(target),
        source: Box::new(e),
    })?;
    cache.cache(record, resolver.resolved_artifacts())
}

// src/candidate/feature_pack.rs

//! Caches the feature packs a candidate was provisioned from
//!
//! Feature packs already resolved by the planner are reused; others are
//! looked up through the channels without being recorded in the session.

use crate::cache::ArtifactCache;
use crate::coordinate::ResolvedArtifact;
use crate::error::{Error, Result};
use crate::installation::{FeaturePack, ProvisioningConfig};
use crate::resolver::ChannelArtifactResolver;
use crate::version::VersionRange;
use tracing::debug;

pub struct FeaturePackAnalyzer<'a> {
    resolver: &'a ChannelArtifactResolver,
}

impl<'a> FeaturePackAnalyzer<'a> {
    pub fn new(resolver: &'a ChannelArtifactResolver) -> Self {
        Self { resolver }
    }

    /// Locate the artifact of every feature pack in `config`
    pub fn analyze(&self, config: &ProvisioningConfig) -> Result<Vec<ResolvedArtifact>> {
        config
            .feature_packs
            .iter()
            .map(|fp| self.locate(fp))
            .collect()
    }

    /// Store every feature pack of `config` in `cache`; returns how many
    pub fn cache(&self, config: &ProvisioningConfig, cache: &mut ArtifactCache) -> Result<usize> {
        let artifacts = self.analyze(config)?;
        for artifact in &artifacts {
            cache.cache_artifact(artifact)?;
        }
        cache.save()?;
        Ok(artifacts.len())
    }

    fn locate(&self, feature_pack: &FeaturePack) -> Result<ResolvedArtifact> {
        let coordinate = feature_pack.coordinate();
        let key = coordinate.key();

        if let Some(resolved) = self.resolver.all_resolved().get(&key) {
            debug!("Feature pack {} already resolved as {}", key, resolved.version);
            return Ok(resolved.clone());
        }

        let range = match coordinate.concrete_version() {
            Some(version) => VersionRange::parse(&format!("[{}]", version))?,
            None => VersionRange::any(),
        };
        let found = self
            .resolver
            .session()
            .find_latest(&key, &range)?
            .ok_or_else(|| Error::not_found(&key.group_id, &key.artifact_id))?;

        Ok(ResolvedArtifact {
            key,
            version: found.version.to_string(),
            path: found.path,
            channel: found.channel,
        })
    }
}

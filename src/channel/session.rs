// src/channel/session.rs

//! A loaded, ordered set of channels answering artifact queries
//!
//! Manifests are fetched once when the session is created. Queries walk the
//! channels in priority order and stop at the first channel able to answer.

use super::manifest::{
    ChannelManifest, ManifestVersionRecord, MavenManifestEntry, OpenManifestEntry,
    UrlManifestEntry, MANIFEST_CLASSIFIER, MANIFEST_EXTENSION,
};
use super::source::ArtifactSource;
use super::{local_path, Channel, ManifestRef, Repository};
use crate::coordinate::ArtifactKey;
use crate::error::{Error, Result};
use crate::hash;
use crate::version::{Version, VersionRange};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Result of a successful channel query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundArtifact {
    pub version: Version,
    pub path: PathBuf,
    pub channel: String,
}

struct LoadedChannel {
    channel: Channel,
    manifest: Option<ChannelManifest>,
}

pub struct ChannelSession {
    channels: Vec<LoadedChannel>,
    source: Box<dyn ArtifactSource>,
    loaded_versions: ManifestVersionRecord,
    closed: bool,
}

fn repository_error(repository: &Repository) -> impl FnOnce(Error) -> Error + '_ {
    move |e| Error::Repository {
        repository: repository.id.clone(),
        source: Box::new(e),
    }
}

/// Fetch and parse a channel's manifest, recording which version was used
fn load_manifest(
    channel: &Channel,
    source: &dyn ArtifactSource,
    record: &mut ManifestVersionRecord,
) -> Result<Option<ChannelManifest>> {
    match channel.manifest {
        None => {
            record.open.push(OpenManifestEntry {
                repositories: channel.repositories.iter().map(|r| r.id.clone()).collect(),
            });
            Ok(None)
        }
        Some(ManifestRef::Url(ref url)) => {
            let path = local_path(url).ok_or_else(|| Error::UnsupportedRepository(url.clone()))?;
            let content = fs::read(&path)?;
            let manifest = ChannelManifest::parse(&String::from_utf8_lossy(&content))?;
            record.url.push(UrlManifestEntry {
                url: url.clone(),
                hash: hash::sha256(&content),
                description: manifest.name.clone(),
            });
            Ok(Some(manifest))
        }
        Some(ManifestRef::Maven(ref maven)) => {
            let key = ArtifactKey::new(
                maven.group_id.clone(),
                maven.artifact_id.clone(),
                MANIFEST_CLASSIFIER,
                MANIFEST_EXTENSION,
            );

            let version = match maven.version {
                Some(ref pinned) => Version::parse(pinned)?,
                None => {
                    let mut latest: Option<Version> = None;
                    for repo in &channel.repositories {
                        let versions = source.versions(repo, &key).map_err(repository_error(repo))?;
                        latest = latest.into_iter().chain(versions).max();
                    }
                    latest.ok_or_else(|| Error::not_found(&maven.group_id, &maven.artifact_id))?
                }
            };

            let mut path = None;
            for repo in &channel.repositories {
                if let Some(p) = source.fetch(repo, &key, &version).map_err(repository_error(repo))? {
                    path = Some(p);
                    break;
                }
            }
            let path = path.ok_or_else(|| Error::not_found(&maven.group_id, &maven.artifact_id))?;

            let manifest = ChannelManifest::load(&path)?;
            debug!(
                "Loaded manifest {}:{}:{} for channel {}",
                maven.group_id, maven.artifact_id, version, channel.name
            );
            record.maven.push(MavenManifestEntry {
                group_id: maven.group_id.clone(),
                artifact_id: maven.artifact_id.clone(),
                version: version.to_string(),
                description: manifest.name.clone(),
            });
            Ok(Some(manifest))
        }
    }
}

impl ChannelSession {
    /// Load every channel's manifest; channel order is preserved as priority
    pub fn new(channels: Vec<Channel>, source: Box<dyn ArtifactSource>) -> Result<Self> {
        let mut loaded_versions = ManifestVersionRecord::default();
        let mut loaded = Vec::with_capacity(channels.len());
        for channel in channels {
            let manifest = load_manifest(&channel, source.as_ref(), &mut loaded_versions)?;
            loaded.push(LoadedChannel { channel, manifest });
        }

        Ok(Self {
            channels: loaded,
            source,
            loaded_versions,
            closed: false,
        })
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.channels.iter().map(|c| c.channel.clone()).collect()
    }

    pub fn is_offline(&self) -> bool {
        self.source.is_offline()
    }

    /// Every repository in channel order, without duplicates
    pub fn repositories(&self) -> Vec<String> {
        let mut repos: Vec<String> = Vec::new();
        for repo in self.channels.iter().flat_map(|c| &c.channel.repositories) {
            let label = format!("{} ({})", repo.id, repo.url);
            if !repos.contains(&label) {
                repos.push(label);
            }
        }
        repos
    }

    /// Manifest versions fetched when the session was created
    pub fn loaded_manifest_versions(&self) -> &ManifestVersionRecord {
        &self.loaded_versions
    }

    /// Query the repositories again for the manifest versions `channels`
    /// currently resolve to
    pub fn current_manifest_versions(&self, channels: &[Channel]) -> Result<ManifestVersionRecord> {
        let mut record = ManifestVersionRecord::default();
        for channel in channels {
            load_manifest(channel, self.source.as_ref(), &mut record)?;
        }
        Ok(record)
    }

    /// Versions of `key` one channel offers, honoring its manifest
    fn channel_versions(&self, loaded: &LoadedChannel, key: &ArtifactKey) -> Result<Vec<Version>> {
        let stream = match loaded.manifest {
            Some(ref manifest) => match manifest.find_stream(&key.group_id, &key.artifact_id) {
                Some(stream) => Some(stream),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut versions: Vec<Version> = Vec::new();
        for repo in &loaded.channel.repositories {
            for version in self.source.versions(repo, key).map_err(repository_error(repo))? {
                if !versions.contains(&version) {
                    versions.push(version);
                }
            }
        }

        if let Some(stream) = stream {
            let mut allowed = Vec::with_capacity(versions.len());
            for version in versions {
                if stream.allows(&version)? {
                    allowed.push(version);
                }
            }
            versions = allowed;
        }

        versions.sort();
        Ok(versions)
    }

    /// Highest version within `range` from the first channel that has one
    pub fn find_latest(&self, key: &ArtifactKey, range: &VersionRange) -> Result<Option<FoundArtifact>> {
        for loaded in &self.channels {
            let versions = self.channel_versions(loaded, key)?;
            let Some(version) = range.select_highest(&versions) else {
                debug!(
                    "Channel {} has no version of {} in {}",
                    loaded.channel.name, key, range
                );
                continue;
            };

            for repo in &loaded.channel.repositories {
                if let Some(path) = self
                    .source
                    .fetch(repo, key, version)
                    .map_err(repository_error(repo))?
                {
                    return Ok(Some(FoundArtifact {
                        version: version.clone(),
                        path,
                        channel: loaded.channel.name.clone(),
                    }));
                }
            }

            warn!(
                "Channel {} lists {} {} but none of its repositories provide it",
                loaded.channel.name, key, version
            );
        }

        Ok(None)
    }

    /// Union of the versions every channel offers for `key`
    pub fn offered_versions(&self, key: &ArtifactKey) -> Result<Vec<Version>> {
        let mut all: Vec<Version> = Vec::new();
        for loaded in &self.channels {
            for version in self.channel_versions(loaded, key)? {
                if !all.contains(&version) {
                    all.push(version);
                }
            }
        }
        all.sort();
        Ok(all)
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()
    }
}

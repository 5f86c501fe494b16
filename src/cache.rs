// src/cache.rs

//! Per-installation artifact content cache
//!
//! Lives in `.installation/.cache` of an installation (or a candidate):
//!
//! ```text
//! .cache/
//!   artifacts.json           index: coordinate + version -> content hash
//!   manifest-versions.toml   manifest versions the cached artifacts came from
//!   objects/ab/cdef...       content, addressed by SHA-256
//! ```
//!
//! A later apply step can reuse cached artifacts instead of resolving them
//! again. The cache has no internal locking; one writer per installation.

use crate::channel::ManifestVersionRecord;
use crate::coordinate::{ArtifactKey, ResolvedArtifact};
use crate::error::{Error, Result};
use crate::filesystem::{write_atomic, CasStore};
use crate::installation::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const INDEX_FILE: &str = "artifacts.json";
pub const MANIFEST_VERSIONS_FILE: &str = "manifest-versions.toml";
const OBJECTS_DIR: &str = "objects";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub key: ArtifactKey,
    pub version: String,
    pub hash: String,
    pub file_name: String,
}

pub struct ArtifactCache {
    dir: PathBuf,
    store: CasStore,
    entries: BTreeMap<(ArtifactKey, String), CacheEntry>,
}

impl ArtifactCache {
    /// Open the cache of the installation at `install_dir`, creating it if needed
    pub fn open(install_dir: &Path) -> Result<Self> {
        let dir = paths::cache_dir(install_dir);
        let store = CasStore::new(dir.join(OBJECTS_DIR))?;

        let index = dir.join(INDEX_FILE);
        let mut entries = BTreeMap::new();
        if index.exists() {
            let listed: Vec<CacheEntry> = serde_json::from_str(&fs::read_to_string(&index)?)?;
            for entry in listed {
                entries.insert((entry.key.clone(), entry.version.clone()), entry);
            }
        }
        debug!("Opened artifact cache {} ({} entries)", dir.display(), entries.len());

        Ok(Self { dir, store, entries })
    }

    /// Cache the manifest-version record together with resolved artifacts
    ///
    /// Returns the number of artifacts cached.
    pub fn cache<'a, I>(&mut self, record: &ManifestVersionRecord, artifacts: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a ResolvedArtifact>,
    {
        self.populate(record, artifacts).map_err(|e| Error::CacheWrite {
            path: self.dir.clone(),
            source: Box::new(e),
        })
    }

    fn populate<'a, I>(&mut self, record: &ManifestVersionRecord, artifacts: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a ResolvedArtifact>,
    {
        write_atomic(
            &self.dir.join(MANIFEST_VERSIONS_FILE),
            record.to_toml()?.as_bytes(),
        )?;

        let mut count = 0;
        for artifact in artifacts {
            self.cache_artifact(artifact)?;
            count += 1;
        }
        self.save()?;

        info!("Cached {} artifact(s) in {}", count, self.dir.display());
        Ok(count)
    }

    /// Store one artifact's content; call `save` to persist the index
    pub fn cache_artifact(&mut self, artifact: &ResolvedArtifact) -> Result<String> {
        let hash = self.store.store_file(artifact.path())?;
        self.entries.insert(
            (artifact.key.clone(), artifact.version.clone()),
            CacheEntry {
                key: artifact.key.clone(),
                version: artifact.version.clone(),
                hash: hash.clone(),
                file_name: artifact.file_name(),
            },
        );
        debug!("Cached {}:{} as {}", artifact.key, artifact.version, hash);
        Ok(hash)
    }

    /// Cached content for an artifact version, if present
    pub fn lookup(&self, key: &ArtifactKey, version: &str) -> Option<PathBuf> {
        let entry = self.entries.get(&(key.clone(), version.to_string()))?;
        self.store.retrieve(&entry.hash).ok()
    }

    pub fn save(&self) -> Result<()> {
        let listed: Vec<&CacheEntry> = self.entries.values().collect();
        write_atomic(&self.dir.join(INDEX_FILE), &serde_json::to_vec_pretty(&listed)?)
    }

    /// Record stored alongside the cached artifacts
    pub fn manifest_versions(&self) -> Result<Option<ManifestVersionRecord>> {
        let path = self.dir.join(MANIFEST_VERSIONS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(ManifestVersionRecord::load(&path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MavenManifestEntry;
    use tempfile::TempDir;

    fn artifact(dir: &Path, artifact_id: &str, version: &str, content: &[u8]) -> ResolvedArtifact {
        let key = ArtifactKey::new("org.foo", artifact_id, "", "jar");
        let path = dir.join(key.file_name(version));
        fs::write(&path, content).unwrap();
        ResolvedArtifact {
            key,
            version: version.to_string(),
            path,
            channel: "base".to_string(),
        }
    }

    fn record() -> ManifestVersionRecord {
        ManifestVersionRecord {
            maven: vec![MavenManifestEntry {
                group_id: "org.foo".to_string(),
                artifact_id: "base-manifest".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_and_reopen() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("candidate");
        let bar = artifact(temp.path(), "bar", "1.2", b"bar content");
        let baz = artifact(temp.path(), "baz", "2.0", b"baz content");

        let mut cache = ArtifactCache::open(&install).unwrap();
        assert_eq!(cache.cache(&record(), [&bar, &baz]).unwrap(), 2);

        let reopened = ArtifactCache::open(&install).unwrap();
        let cached = reopened.lookup(&bar.key, "1.2").unwrap();
        assert_eq!(fs::read(cached).unwrap(), b"bar content");
        let cached = reopened.lookup(&baz.key, "2.0").unwrap();
        assert_eq!(fs::read(cached).unwrap(), b"baz content");
        assert!(reopened.lookup(&bar.key, "1.3").is_none());
        assert_eq!(reopened.manifest_versions().unwrap(), Some(record()));
    }

    #[test]
    fn test_missing_content_is_cache_write_error() {
        let temp = TempDir::new().unwrap();
        let mut missing = artifact(temp.path(), "bar", "1.2", b"x");
        missing.path = temp.path().join("does-not-exist.jar");

        let mut cache = ArtifactCache::open(&temp.path().join("candidate")).unwrap();
        let err = cache.cache(&record(), [&missing]).unwrap_err();
        assert!(matches!(err, Error::CacheWrite { .. }));
    }
}

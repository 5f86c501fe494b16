// src/channel/source.rs

//! Transport seam between channels and the repositories behind them

use super::Repository;
use crate::coordinate::ArtifactKey;
use crate::error::{Error, Result};
use crate::version::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read access to artifact repositories
///
/// Implementations block until the answer is available. Cancellation, if
/// any, belongs to the implementation; a cancelled query is reported as an
/// error and treated as a resolution failure by callers.
pub trait ArtifactSource {
    /// Versions of `key` available in `repository`
    fn versions(&self, repository: &Repository, key: &ArtifactKey) -> Result<Vec<Version>>;

    /// Local path to the content of `key` at `version`, or `None` when the
    /// repository does not hold it
    fn fetch(
        &self,
        repository: &Repository,
        key: &ArtifactKey,
        version: &Version,
    ) -> Result<Option<PathBuf>>;

    /// Whether remote repositories are unreachable by configuration
    fn is_offline(&self) -> bool {
        false
    }

    /// Release transport resources
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Repositories stored on the local filesystem in Maven layout:
/// `<root>/<group/as/path>/<artifact>/<version>/<artifact>-<version>[-<classifier>].<ext>`
#[derive(Debug, Clone, Default)]
pub struct FilesystemSource {
    offline: bool,
}

impl FilesystemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Directory holding every version of `key` under `root`
    pub fn artifact_dir(root: &Path, key: &ArtifactKey) -> PathBuf {
        let mut dir = root.to_path_buf();
        for segment in key.group_id.split('.') {
            dir.push(segment);
        }
        dir.join(&key.artifact_id)
    }

    /// Location of `key` at `version` under `root`
    pub fn artifact_path(root: &Path, key: &ArtifactKey, version: &str) -> PathBuf {
        Self::artifact_dir(root, key)
            .join(version)
            .join(key.file_name(version))
    }

    fn root(repository: &Repository) -> Result<PathBuf> {
        repository
            .local_path()
            .ok_or_else(|| Error::UnsupportedRepository(repository.url.clone()))
    }
}

impl ArtifactSource for FilesystemSource {
    fn versions(&self, repository: &Repository, key: &ArtifactKey) -> Result<Vec<Version>> {
        let root = Self::root(repository)?;
        let dir = Self::artifact_dir(&root, key);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !entry.path().join(key.file_name(&name)).is_file() {
                continue;
            }
            match Version::parse(&name) {
                Ok(v) => versions.push(v),
                Err(_) => debug!("Skipping unparsable version directory {}", entry.path().display()),
            }
        }

        versions.sort();
        Ok(versions)
    }

    fn fetch(
        &self,
        repository: &Repository,
        key: &ArtifactKey,
        version: &Version,
    ) -> Result<Option<PathBuf>> {
        let root = Self::root(repository)?;
        let path = Self::artifact_path(&root, key, version.as_str());
        Ok(path.is_file().then_some(path))
    }

    fn is_offline(&self) -> bool {
        self.offline
    }
}

// src/installation/metadata.rs

//! Installation metadata: manifest, channel list, manifest-version record,
//! revision history and provisioning descriptor

use super::history::{History, SavedState};
use super::paths;
use super::provisioning::ProvisioningConfig;
use crate::channel::{Channel, ChannelManifest, ChannelsFile, ManifestVersionRecord};
use crate::error::{Error, Result};
use crate::filesystem::write_atomic;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct InstallationMetadata {
    base: PathBuf,
    manifest: ChannelManifest,
    channels: Vec<Channel>,
    manifest_versions: Option<ManifestVersionRecord>,
    history: History,
    provisioning: Option<ProvisioningConfig>,
}

impl InstallationMetadata {
    /// Read the metadata of an existing installation
    ///
    /// The manifest and channel list are required. The manifest-version
    /// record and provisioning descriptor are optional.
    pub fn load(base: &Path) -> Result<Self> {
        let manifest = ChannelManifest::load(&paths::manifest_file(base))?;
        let channels = ChannelsFile::load(&paths::channels_file(base))?;

        let record_path = paths::manifest_versions_file(base);
        let manifest_versions = if record_path.exists() {
            Some(ManifestVersionRecord::load(&record_path)?)
        } else {
            None
        };

        let provisioning_path = paths::provisioning_file(base);
        let provisioning = if provisioning_path.exists() {
            Some(ProvisioningConfig::load(&provisioning_path)?)
        } else {
            None
        };

        let history = History::load(&paths::history_file(base))?;
        debug!(
            "Loaded installation metadata from {} ({} channels, {} revisions)",
            base.display(),
            channels.len(),
            history.len()
        );

        Ok(Self {
            base: base.to_path_buf(),
            manifest,
            channels,
            manifest_versions,
            history,
            provisioning,
        })
    }

    /// Metadata for an installation that does not exist on disk yet
    pub fn new_installation(
        base: &Path,
        manifest: ChannelManifest,
        channels: Vec<Channel>,
        manifest_versions: Option<ManifestVersionRecord>,
        provisioning: Option<ProvisioningConfig>,
    ) -> Self {
        Self {
            base: base.to_path_buf(),
            manifest,
            channels,
            manifest_versions,
            history: History::new(),
            provisioning,
        }
    }

    /// Write every metadata file; each file is replaced atomically
    pub fn write(&self) -> Result<()> {
        write_file(&paths::manifest_file(&self.base), || {
            Ok(self.manifest.to_toml()?.into_bytes())
        })?;
        write_file(&paths::channels_file(&self.base), || {
            Ok(ChannelsFile::to_toml(&self.channels)?.into_bytes())
        })?;
        if let Some(record) = &self.manifest_versions {
            write_file(&paths::manifest_versions_file(&self.base), || {
                Ok(record.to_toml()?.into_bytes())
            })?;
        }
        if let Some(provisioning) = &self.provisioning {
            write_file(&paths::provisioning_file(&self.base), || {
                Ok(toml::to_string_pretty(provisioning)?.into_bytes())
            })?;
        }
        write_file(&paths::history_file(&self.base), || {
            Ok(serde_json::to_vec_pretty(&self.history)?)
        })?;

        info!("Wrote installation metadata to {}", self.base.display());
        Ok(())
    }

    /// Persist only the manifest
    pub fn save_manifest(&self) -> Result<()> {
        write_file(&paths::manifest_file(&self.base), || {
            Ok(self.manifest.to_toml()?.into_bytes())
        })
    }

    /// Add a revision in memory; `write` persists it
    pub fn append_revision(&mut self, description: impl Into<String>) -> SavedState {
        self.history.append(description)
    }

    pub fn latest_revision(&self) -> Option<&SavedState> {
        self.history.latest()
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn manifest(&self) -> &ChannelManifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut ChannelManifest {
        &mut self.manifest
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn manifest_versions(&self) -> Option<&ManifestVersionRecord> {
        self.manifest_versions.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn provisioning(&self) -> Option<&ProvisioningConfig> {
        self.provisioning.as_ref()
    }
}

fn write_file<F>(path: &Path, content: F) -> Result<()>
where
    F: FnOnce() -> Result<Vec<u8>>,
{
    content()
        .and_then(|bytes| write_atomic(path, &bytes))
        .map_err(|e| Error::MetadataWrite {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
}

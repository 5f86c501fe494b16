// src/installation/mod.rs

//! The live installation
//!
//! An installation is a base directory holding a module tree and the
//! metadata under `.installation/`. Artifacts are installed into every
//! module directory whose descriptor references them.
//!
//! Installing into several modules is not atomic. If the copy into one module
//! fails after others succeeded, the installation is left with the new
//! artifact in some modules only; the error names the artifact that failed.

mod history;
mod metadata;
mod modules;
pub mod paths;
mod provisioning;

pub use history::{History, SavedState};
pub use metadata::InstallationMetadata;
pub use modules::{artifacts_in, ModuleArtifact, ModuleLocator, MODULE_DESCRIPTOR};
pub use provisioning::{FeaturePack, ProvisioningConfig};

use crate::channel::{Channel, ChannelManifest};
use crate::coordinate::{ArtifactCoordinate, ResolvedArtifact};
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Installation {
    base: PathBuf,
    metadata: InstallationMetadata,
    modules: ModuleLocator,
}

impl Installation {
    pub fn open(base: &Path) -> Result<Self> {
        let metadata = InstallationMetadata::load(base)?;
        Ok(Self {
            base: base.to_path_buf(),
            metadata,
            modules: ModuleLocator::new(paths::modules_dir(base)),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn metadata(&self) -> &InstallationMetadata {
        &self.metadata
    }

    pub fn manifest(&self) -> &ChannelManifest {
        self.metadata.manifest()
    }

    pub fn channels(&self) -> &[Channel] {
        self.metadata.channels()
    }

    /// Saved states, newest first
    pub fn revisions(&self) -> impl Iterator<Item = &SavedState> {
        self.metadata.history().revisions()
    }

    /// Module directories referencing the coordinate at any version
    pub fn find_modules_referencing(
        &self,
        coordinate: &ArtifactCoordinate,
    ) -> Result<BTreeSet<PathBuf>> {
        Ok(self
            .modules
            .find(coordinate)?
            .into_iter()
            .filter_map(|descriptor| descriptor.parent().map(Path::to_path_buf))
            .collect())
    }

    /// Copy `content` into every module referencing the coordinate
    ///
    /// Never creates module directories; an artifact no module references
    /// is `ArtifactNotFound`.
    pub fn install_artifact(&self, coordinate: &ArtifactCoordinate, content: &Path) -> Result<()> {
        let targets = self.find_modules_referencing(coordinate)?;
        if targets.is_empty() {
            return Err(Error::not_found(&coordinate.group_id, &coordinate.artifact_id));
        }

        let file_name = match content.file_name() {
            Some(name) => PathBuf::from(name),
            None => PathBuf::from(coordinate.file_name()?),
        };

        for module_dir in &targets {
            let target = module_dir.join(&file_name);
            fs::copy(content, &target).map_err(|e| Error::Install {
                artifact: coordinate.to_string(),
                source: e,
            })?;
            debug!("Installed {} into {}", coordinate, module_dir.display());
        }
        Ok(())
    }

    /// Swap `old` for `new` in every module referencing `old`'s version
    ///
    /// Per module the new content is copied first, then the descriptor is
    /// rewritten, then the manifest records the new version. A failed copy
    /// leaves that module's descriptor untouched. Manifest changes are made
    /// on a working copy that replaces the installation's manifest, and is
    /// saved, only once every module is updated.
    pub fn update_artifact(
        &mut self,
        old: &ArtifactCoordinate,
        new: &ArtifactCoordinate,
        content: &Path,
    ) -> Result<()> {
        let descriptors = self.modules.find_version(old)?;
        if descriptors.is_empty() {
            return Err(Error::not_found(&old.group_id, &old.artifact_id));
        }

        let file_name = new.file_name()?;
        let new_version = new
            .concrete_version()
            .ok_or_else(|| Error::MissingVersion(new.to_string()))?
            .to_string();

        let mut manifest = self.metadata.manifest().clone();
        for descriptor in &descriptors {
            let Some(module_dir) = descriptor.parent() else {
                continue;
            };

            fs::copy(content, module_dir.join(&file_name)).map_err(|e| Error::Install {
                artifact: new.to_string(),
                source: e,
            })?;

            ModuleLocator::update_version(descriptor, old, &new_version)?;

            manifest.update_version(&new.key(), &new_version);
        }

        *self.metadata.manifest_mut() = manifest;
        self.metadata.save_manifest()?;
        info!(
            "Updated {}:{} from {} to {} in {} module(s)",
            old.group_id,
            old.artifact_id,
            old.concrete_version().unwrap_or("?"),
            new_version,
            descriptors.len()
        );
        Ok(())
    }

    /// Record resolved versions in the manifest without touching modules
    pub fn register_updates<'a, I>(&mut self, artifacts: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a ResolvedArtifact>,
    {
        for artifact in artifacts {
            self.metadata
                .manifest_mut()
                .update_version(&artifact.key, &artifact.version);
        }
        self.metadata.save_manifest()
    }
}

// tests/common/mod.rs

//! Shared fixtures for integration tests: a local repository, a live
//! installation using it, and a planner stub.

#![allow(dead_code)]

use cairn::candidate::{Planner, ProvisioningOptions};
use cairn::channel::{Channel, ChannelManifest, FilesystemSource, Repository};
use cairn::installation::{FeaturePack, InstallationMetadata, ProvisioningConfig, MODULE_DESCRIPTOR};
use cairn::{ArtifactCoordinate, ArtifactKey, ArtifactRepository, Error, ResolvedArtifact, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const FEATURE_PACK_GROUP: &str = "org.wildfly";
pub const FEATURE_PACK_ARTIFACT: &str = "wildfly-galleon-pack";

/// Put an artifact into a Maven-layout repository rooted at `repo`
pub fn publish(repo: &Path, key: &ArtifactKey, version: &str, content: &[u8]) -> PathBuf {
    let path = FilesystemSource::artifact_path(repo, key, version);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

pub fn jar(group_id: &str, artifact_id: &str) -> ArtifactKey {
    ArtifactKey::new(group_id, artifact_id, "", "jar")
}

pub fn feature_pack_key() -> ArtifactKey {
    ArtifactKey::new(FEATURE_PACK_GROUP, FEATURE_PACK_ARTIFACT, "", "zip")
}

pub fn local_channel(name: &str, repo: &Path) -> Channel {
    Channel::new(name, vec![Repository::new(name, repo.display().to_string())])
}

pub struct Fixture {
    /// Keep alive for the duration of the test
    pub temp: TempDir,
    pub base: PathBuf,
    pub repo: PathBuf,
}

impl Fixture {
    pub fn staging_path(&self) -> PathBuf {
        self.temp.path().join("candidate")
    }
}

/// A live installation with one revision, one open channel backed by a
/// local repository holding `org.foo:bar` 1.0 and 1.5, and a feature pack
pub fn setup_installation() -> Fixture {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("server");
    let repo = temp.path().join("repo");

    publish(&repo, &jar("org.foo", "bar"), "1.0", b"bar 1.0");
    publish(&repo, &jar("org.foo", "bar"), "1.5", b"bar 1.5");
    publish(&repo, &feature_pack_key(), "27.0.0", b"feature pack");

    let mut manifest = ChannelManifest::default();
    manifest.name = Some("server".to_string());
    let provisioning = ProvisioningConfig::default().with_feature_pack(
        FeaturePack::new(FEATURE_PACK_GROUP, FEATURE_PACK_ARTIFACT).with_version("27.0.0"),
    );

    let mut metadata = InstallationMetadata::new_installation(
        &base,
        manifest,
        vec![local_channel("base", &repo)],
        None,
        Some(provisioning),
    );
    metadata.append_revision("initial installation");
    metadata.write().unwrap();

    let module_dir = base.join("modules/system/layers/base/org/foo/bar/main");
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(
        module_dir.join(MODULE_DESCRIPTOR),
        r#"<module name="org.foo.bar"><resources><artifact name="${org.foo:bar:1.0}"/></resources></module>"#,
    )
    .unwrap();
    fs::write(module_dir.join("bar-1.0.jar"), b"bar 1.0").unwrap();

    Fixture { temp, base, repo }
}

/// Planner resolving a fixed list of requests and copying each artifact
/// into the target
#[derive(Default)]
pub struct StubPlanner {
    pub requests: Vec<ArtifactCoordinate>,
    pub resolved: Vec<ResolvedArtifact>,
    pub options: Option<ProvisioningOptions>,
    /// Files to leave in the target, located relative to it
    pub files_at: Vec<fn(&Path) -> PathBuf>,
    /// Directories to leave in the target, located relative to it
    pub dirs_at: Vec<fn(&Path) -> PathBuf>,
}

impl StubPlanner {
    pub fn new(requests: Vec<ArtifactCoordinate>) -> Self {
        Self {
            requests,
            ..Self::default()
        }
    }

    pub fn leaving_file(mut self, at: fn(&Path) -> PathBuf) -> Self {
        self.files_at.push(at);
        self
    }

    pub fn leaving_dir(mut self, at: fn(&Path) -> PathBuf) -> Self {
        self.dirs_at.push(at);
        self
    }
}

impl Planner for StubPlanner {
    fn provision(
        &mut self,
        target: &Path,
        options: &ProvisioningOptions,
        repository: &mut dyn ArtifactRepository,
    ) -> Result<()> {
        self.options = Some(options.clone());

        let mut unresolved = Vec::new();
        for request in &self.requests {
            match repository.resolve_latest_version(request) {
                Ok(artifact) => {
                    let dir = target.join("modules");
                    fs::create_dir_all(&dir)?;
                    fs::copy(artifact.path(), dir.join(artifact.file_name()))?;
                    self.resolved.push(artifact);
                }
                Err(Error::ArtifactNotFound { .. }) => unresolved.push(request.clone()),
                Err(e) => return Err(e),
            }
        }

        for at in &self.files_at {
            let path = at(target);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, b"planner output")?;
        }
        for at in &self.dirs_at {
            fs::create_dir_all(at(target))?;
        }

        if !unresolved.is_empty() {
            return Err(Error::UnresolvedArtifacts {
                artifacts: unresolved,
                repositories: repository.repositories(),
            });
        }
        Ok(())
    }
}

// src/installation/provisioning.rs

//! Provisioning descriptor (`.galleon/provisioning.toml`)
//!
//! Names the feature packs an installation was provisioned from and the
//! options passed to the planner:
//!
//! ```toml
//! [[feature_pack]]
//! group_id = "org.wildfly"
//! artifact_id = "wildfly-galleon-pack"
//! version = "27.0.0.Final"
//!
//! [options]
//! jboss-fork-embedded = "true"
//! ```

use crate::coordinate::ArtifactCoordinate;
use crate::error::Result;
use crate::filesystem::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_feature_pack_extension() -> String {
    "zip".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePack {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default = "default_feature_pack_extension")]
    pub extension: String,
    /// Unset means the newest version the channels offer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl FeaturePack {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            extension: default_feature_pack_extension(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn coordinate(&self) -> ArtifactCoordinate {
        let coordinate = ArtifactCoordinate::new(&self.group_id, &self.artifact_id)
            .with_extension(&self.extension);
        match &self.version {
            Some(version) => coordinate.with_version(version),
            None => coordinate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    #[serde(default, rename = "feature_pack")]
    pub feature_packs: Vec<FeaturePack>,

    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ProvisioningConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, toml::to_string_pretty(self)?.as_bytes())
    }

    pub fn with_feature_pack(mut self, feature_pack: FeaturePack) -> Self {
        self.feature_packs.push(feature_pack);
        self
    }
}

// src/config.rs

//! Resolver configuration (`.installation/cairn.toml`)
//!
//! ```toml
//! # Only use locally available artifacts
//! offline = false
//!
//! # Extensions kept in the artifact cache after a build
//! cached_extensions = ["jar"]
//! ```

use crate::error::Result;
use crate::installation::paths;
use crate::resolver::{extension_policy, CachePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub offline: bool,

    #[serde(default = "default_cached_extensions")]
    pub cached_extensions: Vec<String>,
}

fn default_cached_extensions() -> Vec<String> {
    vec!["jar".to_string()]
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            offline: false,
            cached_extensions: default_cached_extensions(),
        }
    }
}

impl ResolverConfig {
    /// Load the installation's config, falling back to defaults when absent
    pub fn load(base: &Path) -> Result<Self> {
        let path = paths::config_file(base);
        if !path.exists() {
            debug!("No resolver config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Ok(toml::from_str(&fs::read_to_string(&path)?)?)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        extension_policy(self.cached_extensions.clone())
    }
}

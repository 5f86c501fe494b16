// src/candidate/planner.rs

//! Contract with the external provisioning planner

use crate::error::Result;
use crate::resolver::ArtifactRepository;
use std::collections::BTreeMap;
use std::path::Path;

/// Option telling the planner to export system paths into the target
pub const EXPORT_SYSTEM_PATHS: &str = "export-system-paths";

/// Option bag passed to the planner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningOptions {
    options: BTreeMap<String, String>,
}

impl ProvisioningOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used for candidate builds
    pub fn for_candidate(extra: &BTreeMap<String, String>) -> Self {
        let mut options = Self::new();
        for (name, value) in extra {
            options.set(name, value);
        }
        options.set(EXPORT_SYSTEM_PATHS, "true");
        options
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn export_system_paths(&self) -> bool {
        self.get(EXPORT_SYSTEM_PATHS) == Some("true")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Decides which artifacts a distribution needs and lays them out in
/// `target`, resolving each one through `repository`
///
/// Implementations report artifacts they could not resolve with
/// `Error::UnresolvedArtifacts` (or pass resolver errors through).
pub trait Planner {
    fn provision(
        &mut self,
        target: &Path,
        options: &ProvisioningOptions,
        repository: &mut dyn ArtifactRepository,
    ) -> Result<()>;
}

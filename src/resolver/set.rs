// src/resolver/set.rs

//! Per-session set of resolved artifacts, unique by artifact key

use crate::coordinate::{ArtifactKey, ResolvedArtifact};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArtifactSet {
    artifacts: BTreeMap<ArtifactKey, ResolvedArtifact>,
}

impl ResolvedArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact; returns false when its key is already present, in
    /// which case the first entry is kept
    pub fn insert(&mut self, artifact: ResolvedArtifact) -> bool {
        if self.artifacts.contains_key(&artifact.key) {
            return false;
        }
        self.artifacts.insert(artifact.key.clone(), artifact);
        true
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<&ResolvedArtifact> {
        self.artifacts.get(key)
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.artifacts.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// `(key, version)` pairs, in key order
    pub fn versions(&self) -> impl Iterator<Item = (&ArtifactKey, &str)> {
        self.artifacts.iter().map(|(k, a)| (k, a.version.as_str()))
    }
}

impl<'a> IntoIterator for &'a ResolvedArtifactSet {
    type Item = &'a ResolvedArtifact;
    type IntoIter = std::collections::btree_map::Values<'a, ArtifactKey, ResolvedArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.values()
    }
}

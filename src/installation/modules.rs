// src/installation/modules.rs

//! Locates the module descriptors referencing an artifact
//!
//! A module directory holds a `module.xml` naming its artifacts:
//!
//! ```xml
//! <resources>
//!     <artifact name="${org.foo:bar:1.0}"/>
//! </resources>
//! ```
//!
//! Only the artifact references are understood; everything else in the
//! descriptor is preserved verbatim when a version is rewritten.

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use crate::filesystem::write_atomic;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const MODULE_DESCRIPTOR: &str = "module.xml";

static ARTIFACT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<artifact\s+name="(\$\{)?([^"}]+)(\})?""#).unwrap());

/// An artifact reference inside a module descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: String,
    /// Trailing `?...` options such as `?jandex`, kept verbatim
    pub options: String,
}

impl ModuleArtifact {
    /// Parse `group:artifact:version[:classifier][?options]`
    pub fn parse(reference: &str) -> Option<Self> {
        let (coordinate, options) = match reference.find('?') {
            Some(at) => reference.split_at(at),
            None => (reference, ""),
        };
        let parts: Vec<&str> = coordinate.split(':').collect();
        let (g, a, v, c) = match parts.as_slice() {
            [g, a, v] => (*g, *a, *v, ""),
            [g, a, v, c] => (*g, *a, *v, *c),
            _ => return None,
        };
        Some(Self {
            group_id: g.to_string(),
            artifact_id: a.to_string(),
            version: v.to_string(),
            classifier: c.to_string(),
            options: options.to_string(),
        })
    }

    /// Same group, artifact and classifier, any version
    pub fn matches(&self, coordinate: &ArtifactCoordinate) -> bool {
        self.group_id == coordinate.group_id
            && self.artifact_id == coordinate.artifact_id
            && self.classifier == coordinate.classifier
    }

    fn reference(&self) -> String {
        let mut reference = format!("{}:{}:{}", self.group_id, self.artifact_id, self.version);
        if !self.classifier.is_empty() {
            reference.push(':');
            reference.push_str(&self.classifier);
        }
        reference.push_str(&self.options);
        reference
    }
}

/// Artifact references in descriptor text
pub fn artifacts_in(descriptor: &str) -> Vec<ModuleArtifact> {
    ARTIFACT_PATTERN
        .captures_iter(descriptor)
        .filter_map(|caps| ModuleArtifact::parse(&caps[2]))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ModuleLocator {
    modules_dir: PathBuf,
}

impl ModuleLocator {
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        Self {
            modules_dir: modules_dir.into(),
        }
    }

    /// Descriptors referencing the coordinate at any version
    pub fn find(&self, coordinate: &ArtifactCoordinate) -> Result<BTreeSet<PathBuf>> {
        self.find_matching(|artifact| artifact.matches(coordinate))
    }

    /// Descriptors referencing exactly the coordinate's version
    ///
    /// Without a version this is the same as `find`.
    pub fn find_version(&self, coordinate: &ArtifactCoordinate) -> Result<BTreeSet<PathBuf>> {
        match coordinate.concrete_version() {
            Some(version) => self.find_matching(|artifact| {
                artifact.matches(coordinate) && artifact.version == version
            }),
            None => self.find(coordinate),
        }
    }

    fn find_matching<F>(&self, predicate: F) -> Result<BTreeSet<PathBuf>>
    where
        F: Fn(&ModuleArtifact) -> bool,
    {
        let mut found = BTreeSet::new();
        if !self.modules_dir.is_dir() {
            debug!("No modules directory at {}", self.modules_dir.display());
            return Ok(found);
        }

        for entry in WalkDir::new(&self.modules_dir).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable module entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != MODULE_DESCRIPTOR {
                continue;
            }

            let content = fs::read_to_string(entry.path())?;
            if artifacts_in(&content).iter().any(&predicate) {
                found.insert(entry.path().to_path_buf());
            }
        }
        Ok(found)
    }

    /// Rewrite `old`'s version reference in `descriptor` to `new_version`
    ///
    /// Returns the number of references rewritten.
    pub fn update_version(
        descriptor: &Path,
        old: &ArtifactCoordinate,
        new_version: &str,
    ) -> Result<usize> {
        let content = fs::read_to_string(descriptor)?;
        let old_version = old.concrete_version();
        let mut rewritten = 0;

        let updated = ARTIFACT_PATTERN.replace_all(&content, |caps: &Captures| {
            let original = caps[0].to_string();
            let Some(mut artifact) = ModuleArtifact::parse(&caps[2]) else {
                return original;
            };
            if !artifact.matches(old) || old_version.is_some_and(|v| v != artifact.version) {
                return original;
            }
            artifact.version = new_version.to_string();
            rewritten += 1;
            let open = caps.get(1).map_or("", |m| m.as_str());
            let close = caps.get(3).map_or("", |m| m.as_str());
            format!(r#"<artifact name="{}{}{}""#, open, artifact.reference(), close)
        });

        if rewritten == 0 {
            return Err(Error::not_found(&old.group_id, &old.artifact_id));
        }
        write_atomic(descriptor, updated.as_bytes())?;
        debug!(
            "Rewrote {} reference(s) in {} to {}",
            rewritten,
            descriptor.display(),
            new_version
        );
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<module name="org.foo.bar" xmlns="urn:jboss:module:1.9">
    <resources>
        <artifact name="${org.foo:bar:1.0}"/>
        <artifact name="org.foo:bar-native:1.0:linux"/>
    </resources>
</module>
"#;

    fn write_module(root: &Path, name: &str, content: &str) -> PathBuf {
        let dir = root.join("modules/system/layers/base").join(name).join("main");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(MODULE_DESCRIPTOR);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_artifacts_in_descriptor() {
        let artifacts = artifacts_in(DESCRIPTOR);
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].artifact_id, "bar");
        assert_eq!(artifacts[0].version, "1.0");
        assert_eq!(artifacts[1].classifier, "linux");
    }

    #[test]
    fn test_find_ignores_version() {
        let temp = TempDir::new().unwrap();
        let descriptor = write_module(temp.path(), "org/foo/bar", DESCRIPTOR);
        write_module(temp.path(), "org/other", r#"<artifact name="${org.other:x:2}"/>"#);
        let locator = ModuleLocator::new(temp.path().join("modules"));

        let found = locator
            .find(&ArtifactCoordinate::new("org.foo", "bar").with_version("9.9"))
            .unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![descriptor]);

        let exact = locator
            .find_version(&ArtifactCoordinate::new("org.foo", "bar").with_version("9.9"))
            .unwrap();
        assert!(exact.is_empty());
    }

    #[test]
    fn test_classifier_must_match() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "org/foo/bar", DESCRIPTOR);
        let locator = ModuleLocator::new(temp.path().join("modules"));

        let plain = ArtifactCoordinate::new("org.foo", "bar-native");
        assert!(locator.find(&plain).unwrap().is_empty());
        assert_eq!(locator.find(&plain.with_classifier("linux")).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_modules_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let locator = ModuleLocator::new(temp.path().join("modules"));
        assert!(locator.find(&ArtifactCoordinate::new("g", "a")).unwrap().is_empty());
    }

    #[test]
    fn test_update_version_keeps_rest_of_descriptor() {
        let temp = TempDir::new().unwrap();
        let descriptor = write_module(temp.path(), "org/foo/bar", DESCRIPTOR);
        let old = ArtifactCoordinate::new("org.foo", "bar").with_version("1.0");

        let count = ModuleLocator::update_version(&descriptor, &old, "1.1").unwrap();
        assert_eq!(count, 1);

        let content = fs::read_to_string(&descriptor).unwrap();
        assert!(content.contains(r#"<artifact name="${org.foo:bar:1.1}"/>"#));
        assert!(content.contains(r#"<artifact name="org.foo:bar-native:1.0:linux"/>"#));
        assert!(content.contains(r#"<module name="org.foo.bar""#));

        // The old version is gone now
        assert!(ModuleLocator::update_version(&descriptor, &old, "1.2").is_err());
    }

    #[test]
    fn test_reference_options_are_not_part_of_version() {
        let temp = TempDir::new().unwrap();
        let descriptor = write_module(
            temp.path(),
            "org/foo/bar",
            r#"<artifact name="${org.foo:bar:1.0?jandex}"/><artifact name="${org.foo:bar-native:1.0:linux?jandex}"/>"#,
        );
        let artifacts = artifacts_in(&fs::read_to_string(&descriptor).unwrap());
        assert_eq!(artifacts[0].version, "1.0");
        assert_eq!(artifacts[0].options, "?jandex");
        assert_eq!(artifacts[1].classifier, "linux");

        let locator = ModuleLocator::new(temp.path().join("modules"));
        let old = ArtifactCoordinate::new("org.foo", "bar").with_version("1.0");
        assert_eq!(locator.find_version(&old).unwrap().len(), 1);

        ModuleLocator::update_version(&descriptor, &old, "1.1").unwrap();
        let content = fs::read_to_string(&descriptor).unwrap();
        assert!(content.contains(r#"<artifact name="${org.foo:bar:1.1?jandex}"/>"#));
        assert!(content.contains("org.foo:bar-native:1.0:linux?jandex"));
    }
}

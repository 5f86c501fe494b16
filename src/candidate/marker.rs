// src/candidate/marker.rs

//! Candidate marker file (`.installation/candidate.json`)
//!
//! Written last into a staged candidate. Its presence means the candidate is
//! complete; it names the live revision the candidate was built from and
//! whether it is an update or a revert.

use crate::error::{Error, Result};
use crate::filesystem::write_atomic;
use crate::installation::{paths, InstallationMetadata};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Update,
    Revert,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "UPDATE"),
            Self::Revert => write!(f, "REVERT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerFile {
    /// Revision of the live installation the candidate is based on
    pub revision: String,
    pub operation: OperationKind,
}

impl MarkerFile {
    pub fn new(revision: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            revision: revision.into(),
            operation,
        }
    }

    /// Atomically write the marker into the candidate at `candidate_dir`
    pub fn write(&self, candidate_dir: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(&paths::marker_file(candidate_dir), &json)
    }

    /// Read the marker of `candidate_dir`; `None` when there is none
    pub fn read(candidate_dir: &Path) -> Result<Option<Self>> {
        let path = paths::marker_file(candidate_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let marker: Self = serde_json::from_str(&content).map_err(|e| Error::InvalidMarker {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if marker.revision.trim().is_empty() {
            return Err(Error::InvalidMarker {
                path,
                reason: "revision is empty".to_string(),
            });
        }
        Ok(Some(marker))
    }

    /// Check the marker names a revision present in the live installation
    pub fn validate(&self, installation: &InstallationMetadata) -> Result<()> {
        if installation.history().find(&self.revision).is_none() {
            return Err(Error::InvalidMarker {
                path: paths::marker_file(installation.base()),
                reason: format!("revision {} is not in the installation history", self.revision),
            });
        }
        Ok(())
    }
}

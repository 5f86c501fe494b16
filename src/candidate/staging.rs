// src/candidate/staging.rs

//! Caller-owned staging directories
//!
//! A failed build leaves its staging directory in place without a marker.
//! Nothing is cleaned up implicitly: the owner decides whether to inspect,
//! keep or `discard` it.

use super::marker::MarkerFile;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a directory scan finds in a staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    /// A valid marker is present
    Complete(MarkerFile),
    /// No marker, or a marker that cannot be read
    Incomplete,
}

impl CandidateStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Scan `dir` for a candidate marker
pub fn inspect_candidate(dir: &Path) -> Result<CandidateStatus> {
    match MarkerFile::read(dir) {
        Ok(Some(marker)) => Ok(CandidateStatus::Complete(marker)),
        Ok(None) => Ok(CandidateStatus::Incomplete),
        Err(Error::InvalidMarker { path, reason }) => {
            warn!("Ignoring unreadable marker {}: {}", path.display(), reason);
            Ok(CandidateStatus::Incomplete)
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Take ownership of an empty (or not yet existing) directory
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        if fs::read_dir(&path)?.next().is_some() {
            return Err(Error::StagingNotEmpty(path));
        }
        Ok(Self { path })
    }

    /// Take ownership of an existing staging directory, whatever it holds
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("staging directory {} does not exist", path.display()),
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> Result<CandidateStatus> {
        inspect_candidate(&self.path)
    }

    /// Delete the staging directory and everything in it
    pub fn discard(self) -> Result<()> {
        if self.path.exists() {
            fs::remove_dir_all(&self.path)?;
        }
        info!("Discarded candidate {}", self.path.display());
        Ok(())
    }
}

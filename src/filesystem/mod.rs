// src/filesystem/mod.rs

//! Filesystem helpers
//!
//! - Content-addressable object storage for cached artifact content
//! - Atomic whole-file writes for metadata and marker files

mod cas;

pub use cas::CasStore;

use crate::error::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `content` atomically
///
/// Content goes to a temporary file in the same directory, is fsynced, then
/// renamed over the destination. Readers see either the old file or the new
/// one, never a partial write.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    // Not every filesystem supports fsync on directories
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

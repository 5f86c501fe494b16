// src/filesystem/cas.rs

//! Content-addressable storage for cached artifacts
//!
//! Files are stored by their SHA-256 hash at `objects/{first2}/{rest}`, so
//! the same artifact cached by several builds takes space once.

use crate::error::{Error, Result};
use crate::hash;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CasStore {
    objects_dir: PathBuf,
}

impl CasStore {
    /// Open (creating if needed) a store rooted at `objects_dir`
    pub fn new<P: AsRef<Path>>(objects_dir: P) -> Result<Self> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        if !objects_dir.exists() {
            fs::create_dir_all(&objects_dir)?;
            debug!("Created CAS objects directory: {}", objects_dir.display());
        }
        Ok(Self { objects_dir })
    }

    /// Copy a file into the store and return its hash
    ///
    /// Already-present content is not copied again.
    pub fn store_file(&self, source: &Path) -> Result<String> {
        let hash = hash::sha256_file(source)?;
        let path = self.hash_to_path(&hash);

        if path.exists() {
            debug!("Content already in CAS: {}", hash);
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Copy to a temp name first so a crash never leaves a truncated object
        let temp_path = path.with_extension("tmp");
        fs::copy(source, &temp_path)?;
        fs::File::open(&temp_path)?.sync_all()?;
        fs::rename(&temp_path, &path)?;

        debug!("Stored {} in CAS as {}", source.display(), hash);
        Ok(hash)
    }

    /// Path of stored content, verified to exist
    pub fn retrieve(&self, hash: &str) -> Result<PathBuf> {
        let path = self.hash_to_path(hash);
        if !path.is_file() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Content not found in CAS: {}", hash),
            )));
        }
        Ok(path)
    }

    /// Path format: objects/{first2}/{remaining}
    pub fn hash_to_path(&self, hash: &str) -> PathBuf {
        if hash.len() < 2 {
            return self.objects_dir.join(hash);
        }
        let (prefix, suffix) = hash.split_at(2);
        self.objects_dir.join(prefix).join(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_retrieve() {
        let temp = TempDir::new().unwrap();
        let cas = CasStore::new(temp.path().join("objects")).unwrap();

        let source = temp.path().join("bar-1.0.jar");
        fs::write(&source, b"Hello, World!").unwrap();

        let hash = cas.store_file(&source).unwrap();
        assert_eq!(
            hash,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        let stored = cas.retrieve(&hash).unwrap();
        assert_eq!(fs::read(stored).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_deduplication() {
        let temp = TempDir::new().unwrap();
        let cas = CasStore::new(temp.path().join("objects")).unwrap();

        let first = temp.path().join("a.jar");
        let second = temp.path().join("b.jar");
        fs::write(&first, b"same").unwrap();
        fs::write(&second, b"same").unwrap();

        let h1 = cas.store_file(&first).unwrap();
        let h2 = cas.store_file(&second).unwrap();
        assert_eq!(h1, h2);
        assert!(cas.retrieve(&h1).is_ok());
    }

    #[test]
    fn test_hash_to_path() {
        let temp = TempDir::new().unwrap();
        let cas = CasStore::new(temp.path()).unwrap();
        assert_eq!(
            cas.hash_to_path("abc123"),
            temp.path().join("ab").join("c123")
        );
    }

    #[test]
    fn test_retrieve_nonexistent() {
        let temp = TempDir::new().unwrap();
        let cas = CasStore::new(temp.path()).unwrap();
        assert!(cas.retrieve("nonexistent_hash").is_err());
    }
}

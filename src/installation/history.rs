// src/installation/history.rs

//! Append-only revision history of an installation
//!
//! Each saved state names a point-in-time installation state. The newest
//! entry is the base revision for the next candidate.

use crate::error::Result;
use crate::filesystem::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    pub id: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    revisions: Vec<SavedState>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load history; a missing file is an empty history
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)
    }

    /// Record a new state; entries are never rewritten or removed
    pub fn append(&mut self, description: impl Into<String>) -> SavedState {
        let state = SavedState {
            id: Uuid::new_v4().simple().to_string(),
            description: description.into(),
            timestamp: Utc::now(),
        };
        self.revisions.push(state.clone());
        state
    }

    /// Most recent state
    pub fn latest(&self) -> Option<&SavedState> {
        self.revisions.last()
    }

    pub fn find(&self, id: &str) -> Option<&SavedState> {
        self.revisions.iter().find(|s| s.id == id)
    }

    /// Newest first
    pub fn revisions(&self) -> impl Iterator<Item = &SavedState> {
        self.revisions.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_latest_is_last_appended() {
        let mut history = History::new();
        assert!(history.latest().is_none());

        let first = history.append("install");
        let second = history.append("update");
        assert_ne!(first.id, second.id);
        assert_eq!(history.latest(), Some(&second));
        assert_eq!(history.find(&first.id), Some(&first));

        let order: Vec<&str> = history.revisions().map(|s| s.description.as_str()).collect();
        assert_eq!(order, vec!["update", "install"]);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".installation/history.json");

        assert!(History::load(&path).unwrap().is_empty());

        let mut history = History::new();
        history.append("install");
        history.save(&path).unwrap();

        let loaded = History::load(&path).unwrap();
        assert_eq!(loaded, history);
        assert_eq!(loaded.len(), 1);
    }
}

//! # Save Store
//!
//! Keyed, directory-style storage for module state. Each module claims a
//! subdirectory of the data directory and stores JSON documents in it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Subdirectory registry with duplicate detection, JSON documents

use anyhow::{bail, Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Subdirectory owned by the bot itself
pub const MAIN_SUBDIR: &str = "main";

#[derive(Debug, Clone)]
pub struct SaveStore {
    data_dir: PathBuf,
    subdirs: Vec<String>,
}

/// Keys and subdirectory names become path segments, so keep them plain
fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl SaveStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            subdirs: Vec::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn subdirs(&self) -> &[String] {
        &self.subdirs
    }

    /// Claim subdirectories
    ///
    /// Returns the names that were already claimed. Claiming twice is not an
    /// error; the caller decides whether to warn.
    pub fn register_subdirs<'a, I>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut duplicates = Vec::new();
        for name in names {
            if self.subdirs.iter().any(|s| s == name) {
                if !duplicates.iter().any(|d| d == name) {
                    duplicates.push(name.to_string());
                }
            } else {
                self.subdirs.push(name.to_string());
            }
        }
        duplicates
    }

    /// Create the data directory and every claimed subdirectory
    pub fn create_dirs(&self) -> Result<()> {
        for subdir in &self.subdirs {
            if !is_valid_segment(subdir) {
                bail!("Invalid save directory name: {subdir:?}");
            }
            let path = self.data_dir.join(subdir);
            std::fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;
        Ok(())
    }

    /// Location of a document
    pub fn path_for(&self, subdir: &str, key: &str) -> Result<PathBuf> {
        if !is_valid_segment(subdir) {
            bail!("Invalid save directory name: {subdir:?}");
        }
        if !is_valid_segment(key) {
            bail!("Invalid save key: {key:?}");
        }
        Ok(self.data_dir.join(subdir).join(format!("{key}.json")))
    }

    pub fn save<T: Serialize>(&self, subdir: &str, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(subdir, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    /// Load a document; `Ok(None)` when it was never saved
    pub fn load<T: DeserializeOwned>(&self, subdir: &str, key: &str) -> Result<Option<T>> {
        let path = self.path_for(subdir, key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Corrupt save file {}", path.display()))?;
        Ok(Some(value))
    }
}

//! Filesystem-backed JSON storage.
//!
//! Each key is a sequence of path segments mapped to `<root>/<seg>/.../<last>.json`.
//! Writes go to a sibling temporary file which is then renamed over the target,
//! so readers never observe a half-written document.

use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// JSON document store rooted at a directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a storage instance at a custom location.
    #[must_use]
    pub const fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the storage root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `key`.
    #[must_use]
    pub fn path(&self, key: &[&str]) -> PathBuf {
        let mut path = self.root.clone();
        if let Some((last, parents)) = key.split_last() {
            for segment in parents {
                path.push(segment);
            }
            path.push(format!("{last}.json"));
        }
        path
    }

    /// Read a value from storage.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be parsed.
    pub fn read<T>(&self, key: &[&str]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let path = self.path(key);

        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Read a value, creating it from `init` when absent.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or created.
    pub fn read_or_init<T, F>(&self, key: &[&str], init: F) -> Result<T>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce() -> T,
    {
        match self.read(key) {
            Err(StorageError::NotFound(_)) => {
                let value = init();
                self.write(key, &value)?;
                Ok(value)
            }
            other => other,
        }
    }

    /// Write a value to storage.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be written.
    pub fn write<T>(&self, key: &[&str], value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path(key);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove a value from storage.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be removed.
    pub fn remove(&self, key: &[&str]) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// List all keys under a prefix.
    ///
    /// Returns keys as vectors of path segments (without .json extension).
    ///
    /// # Errors
    ///
    /// Returns error if directory cannot be read.
    pub fn list(&self, prefix: &[&str]) -> Result<Vec<Vec<String>>> {
        let mut dir = self.root.clone();
        for segment in prefix {
            dir.push(segment);
        }

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let prefix: Vec<String> = prefix.iter().map(|s| (*s).to_string()).collect();
        let mut results = Vec::new();
        Self::list_recursive(&dir, &prefix, &mut results)?;

        results.sort();
        Ok(results)
    }

    fn list_recursive(dir: &Path, prefix: &[String], results: &mut Vec<Vec<String>>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };

            let mut key = prefix.to_vec();
            if path.is_dir() {
                key.push(path.file_name().map_or(name, |s| s.to_string_lossy().to_string()));
                Self::list_recursive(&path, &key, results)?;
            } else if path.extension().is_some_and(|e| e == "json") {
                key.push(name);
                results.push(key);
            }
        }
        Ok(())
    }
}

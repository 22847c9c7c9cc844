//! Filesystem helpers shared by the local stores

use crate::error::{DatasetError, Result};
use crate::storage::CommitLock;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::NamedTempFile;

fn dataset_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("dataset name pattern is valid")
    })
}

/// Dataset names become directory and file names, so keep them to one path segment
pub fn validate_dataset_name(name: &str) -> Result<()> {
    if dataset_name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(DatasetError::InvalidDatasetName(name.to_string()))
    }
}

/// `<root>/<dataset>/<identifier>`
pub fn store_path(root: &Path, dataset_name: &str, identifier: &str) -> PathBuf {
    root.join(dataset_name).join(identifier)
}

/// Create a store directory, refusing to reuse an existing one
pub fn create_store_dir(path: &Path, dataset_name: &str) -> Result<()> {
    validate_dataset_name(dataset_name)?;

    if path.exists() {
        return Err(DatasetError::DatasetExists {
            dataset: dataset_name.to_string(),
        });
    }

    fs::create_dir_all(path)?;
    Ok(())
}

/// Fail with `DatasetDoesNotExist` unless the store directory is present
pub fn require_store_dir(path: &Path, dataset_name: &str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(DatasetError::does_not_exist(dataset_name))
    }
}

/// Remove a store directory and, once empty, the dataset directory above it
pub fn remove_store_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }

    if let Some(dataset_dir) = path.parent() {
        let is_empty = fs::read_dir(dataset_dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            // Best effort: a sibling store may have recreated it
            let _ = fs::remove_dir(dataset_dir);
        }
    }

    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Replace a JSON file through a temp file in the same directory and a rename
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T, sync: bool) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| DatasetError::config(format!("no parent directory for {}", path.display())))?;

    let content = serde_json::to_string_pretty(value)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    if sync {
        temp.as_file().sync_all()?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Flush a finished file to disk
pub fn sync_file(path: &Path) -> Result<()> {
    File::open(path)?.sync_all()?;
    Ok(())
}

/// Exclusive lock file, removed when dropped
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn acquire(path: PathBuf, dataset_name: &str) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                log::debug!("Acquired commit lock {}", path.display());
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DatasetError::DatasetLocked {
                dataset: dataset_name.to_string(),
                lock_path: path,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommitLock for LockFile {}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to release commit lock {}: {e}", self.path.display());
        }
    }
}

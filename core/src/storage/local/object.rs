use super::fs_util;
use crate::error::{DatasetError, Result};
use crate::metadata::DatasetMetadata;
use crate::record::RecordData;
use crate::storage::{DatasetStore, ObjectStore, StorageLocation};
use crate::version::DatasetVersion;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const STORAGE_IDENTIFIER: &str = "object";

/// Copies referenced blobs into one flat container directory per version
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    show_progress: bool,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf, show_progress: bool) -> Self {
        Self {
            root,
            show_progress,
        }
    }

    fn store_dir(&self, dataset_name: &str) -> PathBuf {
        fs_util::store_path(&self.root, dataset_name, self.storage_identifier())
    }

    fn progress(&self, len: usize, message: String) -> ProgressBar {
        let pb = if self.show_progress {
            ProgressBar::new(len as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message);
        pb
    }
}

fn base_name(location: &Path) -> Result<&std::ffi::OsStr> {
    location
        .file_name()
        .ok_or_else(|| DatasetError::invalid_uri(location.to_string_lossy(), "does not name a file"))
}

impl DatasetStore for LocalObjectStore {
    fn storage_identifier(&self) -> &'static str {
        STORAGE_IDENTIFIER
    }

    fn init(&self, dataset_name: &str) -> Result<()> {
        let dir = self.store_dir(dataset_name);
        fs_util::create_store_dir(&dir, dataset_name)?;
        log::debug!("Initialized object storage at {}", dir.display());
        Ok(())
    }

    fn drop(&self, dataset_name: &str) -> Result<()> {
        fs_util::remove_store_dir(&self.store_dir(dataset_name))
    }
}

impl<R: RecordData> ObjectStore<R> for LocalObjectStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        record_data: &R,
        metadata: &DatasetMetadata,
        working_dir: &Path,
    ) -> Result<StorageLocation> {
        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;

        let container_name = format!("{dataset_name}_{}", version.id);
        let container = dir.join(&container_name);

        if container.exists() {
            log::warn!("Clearing existing object container {}", container.display());
            fs::remove_dir_all(&container)?;
        }
        fs::create_dir_all(&container)?;

        let locations = record_data.object_locations(metadata.private.uri_dimension()?)?;
        let pb = self.progress(locations.len(), format!("Storing objects of {container_name}"));
        let mut stored = HashSet::new();

        for location in &locations {
            let source = working_dir.join(location);
            if !source.is_file() {
                return Err(DatasetError::MissingObject(source));
            }

            let name = base_name(location)?;
            if !stored.insert(name.to_os_string()) {
                log::warn!(
                    "Object '{}' overwrites an earlier object with the same file name in {container_name}",
                    location.display()
                );
            }

            fs::copy(&source, container.join(name))?;
            log::debug!("Stored {} in {container_name}", location.display());
            pb.inc(1);
        }

        pb.finish_and_clear();
        log::debug!(
            "Stored {} objects of '{dataset_name}' version {}",
            locations.len(),
            version.id
        );

        Ok(StorageLocation::new(container_name))
    }

    fn pull(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        metadata: &DatasetMetadata,
        record_data: &R,
        working_dir: &Path,
    ) -> Result<()> {
        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;

        let container_name = metadata
            .private
            .object_storage_data_location
            .as_deref()
            .ok_or_else(|| DatasetError::version_does_not_exist(dataset_name, version.id))?;
        let container = dir.join(container_name);
        if !container.is_dir() {
            return Err(DatasetError::version_does_not_exist(dataset_name, version.id));
        }

        let locations = record_data.object_locations(metadata.private.uri_dimension()?)?;
        let pb = self.progress(locations.len(), format!("Restoring objects of {container_name}"));

        for location in &locations {
            let stored = container.join(base_name(location)?);
            if !stored.is_file() {
                return Err(DatasetError::MissingObject(stored));
            }

            let target = working_dir.join(location);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&stored, &target)?;
            pb.inc(1);
        }

        pb.finish_and_clear();
        log::debug!(
            "Restored {} objects of '{dataset_name}' version {} into {}",
            locations.len(),
            version.id,
            working_dir.display()
        );

        Ok(())
    }
}

use super::fs_util;
use crate::error::{DatasetError, Result};
use crate::metadata::DatasetMetadata;
use crate::storage::{DatasetStore, MetadataStore};
use crate::version::DatasetVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const STORAGE_IDENTIFIER: &str = "metadata";
const FILE_NAME: &str = "metadata.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetadataEntry {
    version_id: u64,
    metadata: DatasetMetadata,
}

/// On-disk shape of `metadata.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataList {
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Clone)]
pub struct LocalMetadataStore {
    root: PathBuf,
    sync: bool,
}

impl LocalMetadataStore {
    pub fn new(root: PathBuf, sync: bool) -> Self {
        Self { root, sync }
    }

    fn store_dir(&self, dataset_name: &str) -> PathBuf {
        fs_util::store_path(&self.root, dataset_name, self.storage_identifier())
    }

    fn load(&self, dataset_name: &str) -> Result<MetadataList> {
        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;
        fs_util::read_json(&dir.join(FILE_NAME))
    }

    fn save(&self, dataset_name: &str, list: &MetadataList) -> Result<()> {
        let path = self.store_dir(dataset_name).join(FILE_NAME);
        fs_util::write_json_atomic(&path, list, self.sync)
    }
}

impl DatasetStore for LocalMetadataStore {
    fn storage_identifier(&self) -> &'static str {
        STORAGE_IDENTIFIER
    }

    fn init(&self, dataset_name: &str) -> Result<()> {
        let dir = self.store_dir(dataset_name);
        fs_util::create_store_dir(&dir, dataset_name)?;
        self.save(dataset_name, &MetadataList::default())?;
        log::debug!("Initialized metadata storage at {}", dir.display());
        Ok(())
    }

    fn drop(&self, dataset_name: &str) -> Result<()> {
        fs_util::remove_store_dir(&self.store_dir(dataset_name))
    }
}

impl MetadataStore for LocalMetadataStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        metadata: &DatasetMetadata,
        amend: bool,
    ) -> Result<()> {
        let mut list = self.load(dataset_name)?;
        let entry = MetadataEntry {
            version_id: version.id,
            metadata: metadata.clone(),
        };
        let existing = list
            .metadata
            .iter_mut()
            .find(|e| e.version_id == version.id);

        match (existing, amend) {
            (Some(slot), true) => *slot = entry,
            (None, true) => {
                log::warn!(
                    "No metadata for version {} of '{dataset_name}' to amend, inserting it",
                    version.id
                );
                list.metadata.push(entry);
            }
            (Some(_), false) => {
                return Err(DatasetError::DatasetVersionExists {
                    dataset: dataset_name.to_string(),
                    version_id: version.id,
                })
            }
            (None, false) => list.metadata.push(entry),
        }

        self.save(dataset_name, &list)
    }

    fn pull(&self, dataset_name: &str, version: &DatasetVersion) -> Result<DatasetMetadata> {
        self.load(dataset_name)?
            .metadata
            .into_iter()
            .find(|e| e.version_id == version.id)
            .map(|e| e.metadata)
            .ok_or_else(|| DatasetError::version_does_not_exist(dataset_name, version.id))
    }
}

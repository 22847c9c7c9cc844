use super::fs_util::{self, LockFile};
use crate::error::{DatasetError, Result};
use crate::storage::{CommitLock, DatasetStore, VersionStore};
use crate::version::DatasetVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const STORAGE_IDENTIFIER: &str = "version";
const FILE_NAME: &str = "version.json";
const LOCK_FILE_NAME: &str = ".commit.lock";

/// On-disk shape of `version.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionList {
    versions: Vec<DatasetVersion>,
}

impl VersionList {
    fn max_id(&self) -> u64 {
        self.versions.iter().map(|v| v.id).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct LocalVersionStore {
    root: PathBuf,
    sync: bool,
    lock_commits: bool,
}

impl LocalVersionStore {
    pub fn new(root: PathBuf, sync: bool, lock_commits: bool) -> Self {
        Self {
            root,
            sync,
            lock_commits,
        }
    }

    fn store_dir(&self, dataset_name: &str) -> PathBuf {
        fs_util::store_path(&self.root, dataset_name, self.storage_identifier())
    }

    fn load(&self, dataset_name: &str) -> Result<VersionList> {
        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;
        fs_util::read_json(&dir.join(FILE_NAME))
    }

    fn save(&self, dataset_name: &str, versions: &VersionList) -> Result<()> {
        let path = self.store_dir(dataset_name).join(FILE_NAME);
        fs_util::write_json_atomic(&path, versions, self.sync)
    }
}

impl DatasetStore for LocalVersionStore {
    fn storage_identifier(&self) -> &'static str {
        STORAGE_IDENTIFIER
    }

    fn init(&self, dataset_name: &str) -> Result<()> {
        let dir = self.store_dir(dataset_name);
        fs_util::create_store_dir(&dir, dataset_name)?;
        self.save(dataset_name, &VersionList::default())?;
        log::debug!("Initialized version storage at {}", dir.display());
        Ok(())
    }

    fn drop(&self, dataset_name: &str) -> Result<()> {
        fs_util::remove_store_dir(&self.store_dir(dataset_name))
    }
}

impl VersionStore for LocalVersionStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        amend: bool,
    ) -> Result<DatasetVersion> {
        let mut versions = self.load(dataset_name)?;
        let max_id = versions.max_id();

        let committed = if amend {
            let latest = versions
                .versions
                .iter_mut()
                .find(|v| v.id == max_id)
                .ok_or_else(|| DatasetError::NothingToAmend {
                    dataset: dataset_name.to_string(),
                })?;
            *latest = DatasetVersion::new(max_id, version.name.clone());
            latest.clone()
        } else {
            let next = DatasetVersion::new(max_id + 1, version.name.clone());
            versions.versions.push(next.clone());
            next
        };

        self.save(dataset_name, &versions)?;
        log::debug!(
            "Committed version {} ('{}') of '{dataset_name}'{}",
            committed.id,
            committed.name,
            if amend { " (amended)" } else { "" }
        );

        Ok(committed)
    }

    fn pull(&self, dataset_name: &str, version_id: Option<u64>) -> Result<DatasetVersion> {
        let versions = self.load(dataset_name)?;

        match version_id {
            None => {
                let max_id = versions.max_id();
                versions
                    .versions
                    .into_iter()
                    .find(|v| v.id == max_id)
                    .ok_or_else(|| DatasetError::NothingToPull {
                        dataset: dataset_name.to_string(),
                    })
            }
            Some(id) => versions
                .versions
                .into_iter()
                .find(|v| v.id == id)
                .ok_or_else(|| DatasetError::version_does_not_exist(dataset_name, id)),
        }
    }

    fn list(&self, dataset_name: &str) -> Result<Vec<DatasetVersion>> {
        let mut versions = self.load(dataset_name)?.versions;
        versions.sort_by_key(|v| v.id);
        Ok(versions)
    }

    fn lock(&self, dataset_name: &str) -> Result<Option<Box<dyn CommitLock>>> {
        if !self.lock_commits {
            return Ok(None);
        }

        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;
        let lock = LockFile::acquire(dir.join(LOCK_FILE_NAME), dataset_name)?;
        Ok(Some(Box::new(lock)))
    }
}

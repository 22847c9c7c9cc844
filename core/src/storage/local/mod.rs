//! Filesystem backend.
//!
//! ```text
//! <root>/<dataset>/version/version.json
//! <root>/<dataset>/metadata/metadata.json
//! <root>/<dataset>/record/<dataset>_<id>.<csv|parquet>
//! <root>/<dataset>/object/<dataset>_<id>/<file>
//! ```

use crate::config::{CommitConfig, StorageConfig};
use crate::record::RecordFormat;
use std::path::{Path, PathBuf};

pub mod fs_util;
mod metadata;
mod object;
mod record;
mod version;

pub use metadata::LocalMetadataStore;
pub use object::LocalObjectStore;
pub use record::LocalRecordStore;
pub use version::LocalVersionStore;

/// Factory for the four filesystem stores sharing one root
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    record_format: RecordFormat,
    show_progress: bool,
    lock_commits: bool,
    sync: bool,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            record_format: RecordFormat::default(),
            show_progress: false,
            lock_commits: true,
            sync: false,
        }
    }

    pub fn from_config(storage: &StorageConfig, commit: &CommitConfig) -> Self {
        Self {
            root: storage.root.clone(),
            record_format: storage.record_format,
            show_progress: storage.show_progress,
            lock_commits: commit.lock,
            sync: commit.sync,
        }
    }

    pub fn with_record_format(mut self, record_format: RecordFormat) -> Self {
        self.record_format = record_format;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_store(&self) -> LocalVersionStore {
        LocalVersionStore::new(self.root.clone(), self.sync, self.lock_commits)
    }

    pub fn metadata_store(&self) -> LocalMetadataStore {
        LocalMetadataStore::new(self.root.clone(), self.sync)
    }

    pub fn record_store(&self) -> LocalRecordStore {
        LocalRecordStore::new(self.root.clone(), self.record_format, self.sync)
    }

    pub fn object_store(&self) -> LocalObjectStore {
        LocalObjectStore::new(self.root.clone(), self.show_progress)
    }
}

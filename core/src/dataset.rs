//! The dataset facade: init / add / commit / pull / drop over the four stores
//!
//! The facade owns the working state (metadata, current version, pending
//! record data, working directory) and is the only component that knows the
//! order in which the stores must be called. It never touches the filesystem
//! itself.
//!
//! There is no rollback: if a later store fails during `init` or `commit`,
//! the earlier stores keep what they wrote.

use crate::config::{Config, DatasetConfig};
use crate::error::{DatasetError, Result};
use crate::metadata::{DatasetMetadata, PublicMetadata};
use crate::record::{RecordData, RecordTable};
use crate::storage::{
    DatasetStore, LocalStorage, MetadataStore, ObjectStore, RecordStore, VersionStore,
};
use crate::version::DatasetVersion;
use std::path::{Path, PathBuf};

/// Where a [`Dataset`] handle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetState {
    /// Not initialized or pulled by this handle, or dropped
    Uninitialized,
    /// Storage exists but nothing has been added or pulled
    Initialized,
    /// Record data was added and not committed yet
    HasPendingData,
    /// The working state matches a committed version
    HasCommittedVersion,
}

/// A named, versioned collection of records and the blob files they reference
pub struct Dataset<R: RecordData = RecordTable> {
    name: String,
    working_dir: PathBuf,
    metadata: DatasetMetadata,
    version: Option<DatasetVersion>,
    record_data: Option<R>,
    initialized: bool,
    pending: bool,
    dimensions: DatasetConfig,
    version_store: Box<dyn VersionStore>,
    metadata_store: Box<dyn MetadataStore>,
    record_store: Box<dyn RecordStore<R>>,
    object_store: Box<dyn ObjectStore<R>>,
}

impl<R: RecordData> std::fmt::Debug for Dataset<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("working_dir", &self.working_dir)
            .field("version", &self.version)
            .field("metadata", &self.metadata)
            .field("state", &self.state())
            .finish()
    }
}

impl<R: RecordData + 'static> Dataset<R> {
    /// Dataset backed by the filesystem stores described by `config`
    pub fn local(name: &str, working_dir: &Path, config: &Config) -> Self {
        let storage = LocalStorage::from_config(&config.storage, &config.commit);
        log::debug!(
            "Using local storage at {} for dataset '{name}'",
            storage.root().display()
        );

        Self::new(
            name,
            working_dir,
            Box::new(storage.version_store()),
            Box::new(storage.metadata_store()),
            Box::new(storage.record_store()),
            Box::new(storage.object_store()),
        )
        .with_dimensions(config.dataset.clone())
    }
}

impl<R: RecordData> Dataset<R> {
    pub fn new(
        name: &str,
        working_dir: &Path,
        version_store: Box<dyn VersionStore>,
        metadata_store: Box<dyn MetadataStore>,
        record_store: Box<dyn RecordStore<R>>,
        object_store: Box<dyn ObjectStore<R>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            working_dir: working_dir.to_path_buf(),
            metadata: DatasetMetadata::default(),
            version: None,
            record_data: None,
            initialized: false,
            pending: false,
            dimensions: DatasetConfig::default(),
            version_store,
            metadata_store,
            record_store,
            object_store,
        }
    }

    /// Dimension names used by [`Dataset::init_default`]
    pub fn with_dimensions(mut self, dimensions: DatasetConfig) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_dir
    }

    /// The version last committed or pulled by this handle
    pub fn version(&self) -> Option<&DatasetVersion> {
        self.version.as_ref()
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Annotations stored with the next commit
    pub fn public_metadata_mut(&mut self) -> &mut PublicMetadata {
        &mut self.metadata.public
    }

    pub fn record_data(&self) -> Option<&R> {
        self.record_data.as_ref()
    }

    pub fn state(&self) -> DatasetState {
        if !self.initialized {
            DatasetState::Uninitialized
        } else if self.pending {
            DatasetState::HasPendingData
        } else if self.version.is_some() {
            DatasetState::HasCommittedVersion
        } else {
            DatasetState::Initialized
        }
    }

    /// All committed versions, ascending by id
    pub fn versions(&self) -> Result<Vec<DatasetVersion>> {
        self.version_store.list(&self.name)
    }

    /// Create storage for this dataset in every store.
    ///
    /// Fails with `DatasetExists` if any store already has storage for the
    /// name; stores initialized before the failure are left in place.
    pub fn init(&mut self, index_dimension: &str, uri_dimension: &str) -> Result<()> {
        self.metadata.private.index_dimension_name = Some(index_dimension.to_string());
        self.metadata.private.uri_dimension_name = Some(uri_dimension.to_string());

        DatasetStore::init(self.version_store.as_ref(), &self.name)?;
        DatasetStore::init(self.metadata_store.as_ref(), &self.name)?;
        DatasetStore::init(self.object_store.as_ref(), &self.name)?;
        DatasetStore::init(self.record_store.as_ref(), &self.name)?;

        self.initialized = true;
        log::info!(
            "Initialized dataset '{}' (index: {index_dimension}, uri: {uri_dimension})",
            self.name
        );
        Ok(())
    }

    /// `init` with the configured index and URI dimension names
    pub fn init_default(&mut self) -> Result<()> {
        let DatasetConfig {
            index_dimension,
            uri_dimension,
        } = self.dimensions.clone();
        self.init(&index_dimension, &uri_dimension)
    }

    /// Replace the pending record data. No I/O happens until `commit`.
    pub fn add(&mut self, record_data: R) {
        self.record_data = Some(record_data);
        self.pending = true;
    }

    /// Store the pending record data and its objects as a new version, or as
    /// a replacement of the latest version when `amend` is set.
    ///
    /// Without a `version`, a random 10 character name is generated.
    pub fn commit(
        &mut self,
        version: Option<DatasetVersion>,
        amend: bool,
    ) -> Result<DatasetVersion> {
        let record_data = self
            .record_data
            .as_ref()
            .ok_or_else(|| DatasetError::NothingToCommit {
                dataset: self.name.clone(),
            })?;
        let version = version.unwrap_or_else(DatasetVersion::generated);

        let _lock = self.version_store.lock(&self.name)?;

        // Reject bad record data before a version id is handed out
        let private = &self.metadata.private;
        record_data.check_index(private.index_dimension()?)?;
        record_data.object_locations(private.uri_dimension()?)?;

        let committed = self.version_store.commit(&self.name, &version, amend)?;

        let record_location = self.record_store.commit(
            &self.name,
            &committed,
            record_data,
            &self.metadata,
            &self.working_dir,
        )?;
        let object_location = self.object_store.commit(
            &self.name,
            &committed,
            record_data,
            &self.metadata,
            &self.working_dir,
        )?;

        // Metadata goes last: it records where the other stores put the data
        self.metadata.private.record_storage_data_location = Some(record_location.location);
        self.metadata.private.object_storage_data_location = Some(object_location.location);
        self.metadata_store
            .commit(&self.name, &committed, &self.metadata, amend)?;

        log::info!(
            "Committed version {} ('{}') of dataset '{}'{}",
            committed.id,
            committed.name,
            self.name,
            if amend { " (amended)" } else { "" }
        );

        self.version = Some(committed.clone());
        self.initialized = true;
        self.pending = false;
        Ok(committed)
    }

    /// Load a version (the latest when `version_id` is `None`) into the
    /// working state and copy its objects into the working directory.
    pub fn pull(&mut self, version_id: Option<u64>) -> Result<()> {
        let version = self.version_store.pull(&self.name, version_id)?;
        let metadata = self.metadata_store.pull(&self.name, &version)?;
        let record_data = self
            .record_store
            .pull(&self.name, &version, &metadata, &self.working_dir)?;
        self.object_store.pull(
            &self.name,
            &version,
            &metadata,
            &record_data,
            &self.working_dir,
        )?;

        log::info!(
            "Pulled version {} ('{}') of dataset '{}' into {}",
            version.id,
            version.name,
            self.name,
            self.working_dir.display()
        );

        self.metadata = metadata;
        self.record_data = Some(record_data);
        self.version = Some(version);
        self.initialized = true;
        self.pending = false;
        Ok(())
    }

    /// Delete all storage for this dataset. Safe to call repeatedly.
    pub fn drop(&mut self) -> Result<()> {
        DatasetStore::drop(self.version_store.as_ref(), &self.name)?;
        DatasetStore::drop(self.metadata_store.as_ref(), &self.name)?;
        DatasetStore::drop(self.object_store.as_ref(), &self.name)?;
        DatasetStore::drop(self.record_store.as_ref(), &self.name)?;

        self.metadata = DatasetMetadata::default();
        self.version = None;
        self.record_data = None;
        self.initialized = false;
        self.pending = false;
        log::info!("Dropped dataset '{}'", self.name);
        Ok(())
    }
}

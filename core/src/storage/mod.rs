//! Storage seams for the four dataset collaborators.
//!
//! Each store owns one slice of a dataset's durable state and knows nothing
//! about the others. Only the [`crate::dataset::Dataset`] facade understands
//! the ordering between them. The filesystem implementation lives in
//! [`local`]; other backends implement the same traits.

use crate::error::Result;
use crate::metadata::DatasetMetadata;
use crate::record::RecordData;
use crate::version::DatasetVersion;
use std::path::Path;

pub mod local;

pub use local::LocalStorage;

/// Where a record or object store put the data of one version.
///
/// Returned from commits so the facade can record it in private metadata
/// before the metadata store persists anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub location: String,
}

impl StorageLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// Held for the duration of a commit; released on drop.
pub trait CommitLock: Send {}

/// Lifecycle shared by every store: create and delete the per-dataset storage.
pub trait DatasetStore {
    /// Name of this store's slice within a dataset (e.g. `version`)
    fn storage_identifier(&self) -> &'static str;

    /// Create storage for the dataset; `DatasetExists` if it is already there
    fn init(&self, dataset_name: &str) -> Result<()>;

    /// Delete storage for the dataset; a no-op when nothing exists
    fn drop(&self, dataset_name: &str) -> Result<()>;
}

/// Owns the monotonic version sequence of a dataset
pub trait VersionStore: DatasetStore {
    /// Append a version with the next id, or replace the latest one when
    /// `amend` is set. Returns the version as stored.
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        amend: bool,
    ) -> Result<DatasetVersion>;

    /// Resolve a version id, or the latest version when `version_id` is `None`
    fn pull(&self, dataset_name: &str, version_id: Option<u64>) -> Result<DatasetVersion>;

    /// All committed versions, ascending by id
    fn list(&self, dataset_name: &str) -> Result<Vec<DatasetVersion>>;

    /// Mutual exclusion for the commit read-modify-write cycle.
    ///
    /// Backends without a locking primitive return `None`.
    fn lock(&self, _dataset_name: &str) -> Result<Option<Box<dyn CommitLock>>> {
        Ok(None)
    }
}

/// Owns per-version key/value metadata
pub trait MetadataStore: DatasetStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        metadata: &DatasetMetadata,
        amend: bool,
    ) -> Result<()>;

    fn pull(&self, dataset_name: &str, version: &DatasetVersion) -> Result<DatasetMetadata>;
}

/// Owns per-version serialized record data
pub trait RecordStore<R: RecordData>: DatasetStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        record_data: &R,
        metadata: &DatasetMetadata,
        working_dir: &Path,
    ) -> Result<StorageLocation>;

    fn pull(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        metadata: &DatasetMetadata,
        working_dir: &Path,
    ) -> Result<R>;
}

/// Owns per-version copies of the blob files referenced by record data
pub trait ObjectStore<R: RecordData>: DatasetStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        record_data: &R,
        metadata: &DatasetMetadata,
        working_dir: &Path,
    ) -> Result<StorageLocation>;

    /// Copy the blobs referenced by `record_data` back into `working_dir`
    fn pull(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        metadata: &DatasetMetadata,
        record_data: &R,
        working_dir: &Path,
    ) -> Result<()>;
}

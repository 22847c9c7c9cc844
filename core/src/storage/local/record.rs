use super::fs_util;
use crate::error::{DatasetError, Result};
use crate::metadata::DatasetMetadata;
use crate::record::{RecordData, RecordFormat};
use crate::storage::{DatasetStore, RecordStore, StorageLocation};
use crate::version::DatasetVersion;
use std::path::{Path, PathBuf};

const STORAGE_IDENTIFIER: &str = "record";

/// Stores each version's records as `<dataset>_<id>.<ext>`
#[derive(Debug, Clone)]
pub struct LocalRecordStore {
    root: PathBuf,
    format: RecordFormat,
    sync: bool,
}

impl LocalRecordStore {
    pub fn new(root: PathBuf, format: RecordFormat, sync: bool) -> Self {
        Self { root, format, sync }
    }

    fn store_dir(&self, dataset_name: &str) -> PathBuf {
        fs_util::store_path(&self.root, dataset_name, self.storage_identifier())
    }
}

impl DatasetStore for LocalRecordStore {
    fn storage_identifier(&self) -> &'static str {
        STORAGE_IDENTIFIER
    }

    fn init(&self, dataset_name: &str) -> Result<()> {
        let dir = self.store_dir(dataset_name);
        fs_util::create_store_dir(&dir, dataset_name)?;
        log::debug!("Initialized record storage at {}", dir.display());
        Ok(())
    }

    fn drop(&self, dataset_name: &str) -> Result<()> {
        fs_util::remove_store_dir(&self.store_dir(dataset_name))
    }
}

impl<R: RecordData> RecordStore<R> for LocalRecordStore {
    fn commit(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        record_data: &R,
        metadata: &DatasetMetadata,
        _working_dir: &Path,
    ) -> Result<StorageLocation> {
        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;

        let index_dimension = metadata.private.index_dimension()?;
        record_data.check_index(index_dimension)?;

        let file_name = format!("{dataset_name}_{}.{}", version.id, self.format.extension());
        let path = dir.join(&file_name);

        match self.format {
            RecordFormat::Csv => record_data.write_csv(&path, index_dimension)?,
            RecordFormat::Parquet => record_data.write_parquet(&path)?,
        }
        if self.sync {
            fs_util::sync_file(&path)?;
        }

        log::debug!(
            "Wrote {} records of '{dataset_name}' version {} to {file_name}",
            record_data.num_rows(),
            version.id
        );

        Ok(StorageLocation::new(file_name))
    }

    fn pull(
        &self,
        dataset_name: &str,
        version: &DatasetVersion,
        metadata: &DatasetMetadata,
        _working_dir: &Path,
    ) -> Result<R> {
        let dir = self.store_dir(dataset_name);
        fs_util::require_store_dir(&dir, dataset_name)?;

        let missing = || DatasetError::version_does_not_exist(dataset_name, version.id);

        let location = metadata
            .private
            .record_storage_data_location
            .as_deref()
            .ok_or_else(missing)?;
        let format = RecordFormat::from_location(location).ok_or_else(missing)?;
        let path = dir.join(location);
        if !path.is_file() {
            return Err(missing());
        }

        let records = match format {
            RecordFormat::Csv => R::read_csv(&path, metadata.private.index_dimension()?)?,
            RecordFormat::Parquet => R::read_parquet(&path)?,
        };

        log::debug!(
            "Read {} records of '{dataset_name}' version {} from {location}",
            records.num_rows(),
            version.id
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordTable;
    use arrow_array::{Int64Array, RecordBatch, StringArray};
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn table(ids: Vec<i64>) -> RecordTable {
        let uris: Vec<String> = ids.iter().map(|id| format!("{id}.jpg")).collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("uri", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(uris)),
            ],
        )
        .unwrap();
        RecordTable::new(batch)
    }

    fn commit_and_pull(format: RecordFormat) -> (StorageLocation, RecordTable, RecordTable) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalRecordStore::new(temp_dir.path().to_path_buf(), format, false);
        DatasetStore::init(&store, "ds").unwrap();

        let version = DatasetVersion::new(4, "v");
        let mut metadata = DatasetMetadata::with_dimensions("id", "uri");
        let original = table(vec![10, 20, 30]);

        let location = store
            .commit("ds", &version, &original, &metadata, temp_dir.path())
            .unwrap();
        metadata.private.record_storage_data_location = Some(location.location.clone());

        let pulled: RecordTable = store
            .pull("ds", &version, &metadata, temp_dir.path())
            .unwrap();
        (location, original, pulled)
    }

    #[test]
    fn test_csv_round_trip() {
        let (location, original, pulled) = commit_and_pull(RecordFormat::Csv);
        assert_eq!(location.location, "ds_4.csv");
        for column in ["id", "uri"] {
            assert_eq!(
                pulled.column_values(column).unwrap(),
                original.column_values(column).unwrap()
            );
        }
    }

    #[test]
    fn test_parquet_round_trip() {
        let (location, original, pulled) = commit_and_pull(RecordFormat::Parquet);
        assert_eq!(location.location, "ds_4.parquet");
        assert_eq!(pulled.batch().columns(), original.batch().columns());
    }

    #[test]
    fn test_pull_reads_format_from_location() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let parquet_store = LocalRecordStore::new(root.clone(), RecordFormat::Parquet, false);
        DatasetStore::init(&parquet_store, "ds").unwrap();

        let version = DatasetVersion::new(1, "v");
        let mut metadata = DatasetMetadata::with_dimensions("id", "uri");
        let location = parquet_store
            .commit("ds", &version, &table(vec![1]), &metadata, temp_dir.path())
            .unwrap();
        metadata.private.record_storage_data_location = Some(location.location);

        // A store configured for CSV still reads what was written as Parquet
        let csv_store = LocalRecordStore::new(root, RecordFormat::Csv, false);
        let pulled: RecordTable = csv_store
            .pull("ds", &version, &metadata, temp_dir.path())
            .unwrap();
        assert_eq!(pulled.num_rows(), 1);
    }

    #[test]
    fn test_pull_missing_location() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalRecordStore::new(temp_dir.path().to_path_buf(), RecordFormat::Csv, false);
        DatasetStore::init(&store, "ds").unwrap();

        let metadata = DatasetMetadata::with_dimensions("id", "uri");
        let result: Result<RecordTable> =
            store.pull("ds", &DatasetVersion::new(1, "v"), &metadata, temp_dir.path());
        assert!(matches!(
            result,
            Err(DatasetError::DatasetVersionDoesNotExist { version_id: 1, .. })
        ));
    }

    #[test]
    fn test_commit_rejects_duplicate_index() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalRecordStore::new(temp_dir.path().to_path_buf(), RecordFormat::Csv, false);
        DatasetStore::init(&store, "ds").unwrap();

        let metadata = DatasetMetadata::with_dimensions("id", "uri");
        let result = store.commit(
            "ds",
            &DatasetVersion::new(1, "v"),
            &table(vec![5, 5]),
            &metadata,
            temp_dir.path(),
        );
        assert!(matches!(result, Err(DatasetError::DuplicateIndex { .. })));
    }
}

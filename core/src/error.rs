//! Error types for dataset versioning

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors raised by the stores and the dataset facade.
///
/// Every variant is terminal: nothing in this crate retries an operation.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("The dataset already exists. Dataset name: {dataset}.")]
    DatasetExists { dataset: String },

    #[error("The dataset does not exist. Dataset name: {dataset}.")]
    DatasetDoesNotExist { dataset: String },

    #[error("The version of the dataset already exists. Dataset name: {dataset}. Dataset version: id: {version_id}.")]
    DatasetVersionExists { dataset: String, version_id: u64 },

    #[error("The version of the dataset does not exist. Dataset name: {dataset}. Dataset version: id: {version_id}.")]
    DatasetVersionDoesNotExist { dataset: String, version_id: u64 },

    #[error("There is nothing to commit. Try add(record_data) first. Dataset name: {dataset}.")]
    NothingToCommit { dataset: String },

    #[error("There is nothing to pull. Try commit() first. Dataset name: {dataset}.")]
    NothingToPull { dataset: String },

    #[error("There is no committed version to amend. Dataset name: {dataset}.")]
    NothingToAmend { dataset: String },

    #[error("The specified storage format is invalid: '{format}'")]
    InvalidStorageFormat { format: String },

    #[error("Dataset '{dataset}' is locked by another writer (remove {} if the lock is stale)", .lock_path.display())]
    DatasetLocked { dataset: String, lock_path: PathBuf },

    #[error("Invalid dataset name: '{0}'")]
    InvalidDatasetName(String),

    #[error("Missing dimension '{dimension}': {reason}")]
    MissingDimension { dimension: String, reason: String },

    #[error("Index dimension '{dimension}' is not unique: duplicate key '{key}'")]
    DuplicateIndex { dimension: String, key: String },

    #[error("Invalid object URI '{uri}': {reason}")]
    InvalidObjectUri { uri: String, reason: String },

    #[error("Object not found: {}", .0.display())]
    MissingObject(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl DatasetError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_uri<U: Into<String>, S: Into<String>>(uri: U, reason: S) -> Self {
        Self::InvalidObjectUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_dimension<D: Into<String>, S: Into<String>>(dimension: D, reason: S) -> Self {
        Self::MissingDimension {
            dimension: dimension.into(),
            reason: reason.into(),
        }
    }

    pub fn version_does_not_exist(dataset: &str, version_id: u64) -> Self {
        Self::DatasetVersionDoesNotExist {
            dataset: dataset.to_string(),
            version_id,
        }
    }

    pub fn does_not_exist(dataset: &str) -> Self {
        Self::DatasetDoesNotExist {
            dataset: dataset.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_dataset() {
        let err = DatasetError::version_does_not_exist("ds", 99);
        assert_eq!(
            err.to_string(),
            "The version of the dataset does not exist. Dataset name: ds. Dataset version: id: 99."
        );

        let err = DatasetError::DatasetExists {
            dataset: "ds".to_string(),
        };
        assert!(err.to_string().contains("Dataset name: ds"));
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DatasetError = io.into();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}

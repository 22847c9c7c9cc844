//! Per-version dataset metadata

use crate::error::{DatasetError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// System-owned bookkeeping stored with every version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMetadata {
    /// Column acting as the unique row key
    #[serde(default)]
    pub index_dimension_name: Option<String>,
    /// Column holding per-row blob paths relative to the working directory
    #[serde(default)]
    pub uri_dimension_name: Option<String>,
    /// File name written by the record store
    #[serde(default)]
    pub record_storage_data_location: Option<String>,
    /// Container name written by the object store
    #[serde(default)]
    pub object_storage_data_location: Option<String>,
}

impl PrivateMetadata {
    pub fn index_dimension(&self) -> Result<&str> {
        self.index_dimension_name.as_deref().ok_or_else(|| {
            DatasetError::missing_dimension("index", "no index dimension name in metadata")
        })
    }

    pub fn uri_dimension(&self) -> Result<&str> {
        self.uri_dimension_name.as_deref().ok_or_else(|| {
            DatasetError::missing_dimension("uri", "no uri dimension name in metadata")
        })
    }
}

/// Caller-owned key/value annotations. No keys are reserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicMetadata(IndexMap<String, Value>);

impl PublicMetadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(rename = "private_metadata")]
    pub private: PrivateMetadata,
    #[serde(rename = "public_metadata", default)]
    pub public: PublicMetadata,
}

impl DatasetMetadata {
    pub fn with_dimensions(index_dimension: &str, uri_dimension: &str) -> Self {
        Self {
            private: PrivateMetadata {
                index_dimension_name: Some(index_dimension.to_string()),
                uri_dimension_name: Some(uri_dimension.to_string()),
                ..Default::default()
            },
            public: PublicMetadata::default(),
        }
    }
}

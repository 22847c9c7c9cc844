//! Dataset versions and version name generation

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use uuid::Uuid;

/// Number of hex characters kept from the digest for generated names
const GENERATED_NAME_LEN: usize = 10;

/// A numbered snapshot of a dataset.
///
/// `id` is assigned by the version store, strictly increasing per dataset and
/// starting at 1. An id of 0 marks a version that has not been committed yet.
/// Names are labels and need not be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: u64,
    pub name: String,
}

impl DatasetVersion {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// An uncommitted version request carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(0, name)
    }

    /// An uncommitted version request with a random name
    pub fn generated() -> Self {
        Self::named(generate_version_name())
    }
}

/// Random version name: first 10 hex characters of SHA-512 over a UUIDv4 seed.
pub fn generate_version_name() -> String {
    let seed = Uuid::new_v4().to_string();
    let digest = Sha512::digest(seed.as_bytes());
    let mut name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    name.truncate(GENERATED_NAME_LEN);
    name
}

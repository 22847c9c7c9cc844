//! # dsversion-core
//!
//! Core library for dsversion - versioned snapshots of a dataset made of a
//! record table plus the blob files its rows reference.
//!
//! A [`Dataset`] drives four stores (version, metadata, record, object) through
//! init, add, commit, pull and drop. The filesystem backend in
//! [`storage::local`] is the one shipped here; other backends implement the
//! traits in [`storage`].

pub mod config;
pub mod dataset;
pub mod error;
pub mod metadata;
pub mod record;
pub mod storage;
pub mod version;

// Re-export the most commonly used types for convenience
pub use config::Config;
pub use dataset::{Dataset, DatasetState};
pub use error::{DatasetError, Result};
pub use metadata::{DatasetMetadata, PrivateMetadata, PublicMetadata};
pub use record::{RecordData, RecordFormat, RecordTable};
pub use storage::LocalStorage;
pub use version::DatasetVersion;

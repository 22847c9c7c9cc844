//! Common test utilities and fixtures
#![allow(dead_code)]

use arrow_array::{Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use dsversion_core::config::CONFIG_FILE_NAME;
use dsversion_core::{Config, Dataset, RecordData, RecordTable};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Route `log` output through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test fixture paths and utilities
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
    pub data_dir: PathBuf,
    pub configs_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

        Self {
            data_dir: fixtures_dir.join("data"),
            configs_dir: fixtures_dir.join("configs"),
            fixtures_dir,
        }
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.configs_dir.join(name)
    }
}

/// A temporary project directory with a `dsversion.toml` and a working directory
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub path: PathBuf,
    pub config_path: PathBuf,
    pub working_dir: PathBuf,
}

impl TestWorkspace {
    /// Create a workspace using one of the configs under `tests/fixtures/configs`.
    ///
    /// The fixture's relative storage root lands inside the temp directory.
    pub fn new(config_name: &str) -> Self {
        init_logging();

        let fixtures = TestFixtures::new();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().to_path_buf();

        let config_path = path.join(CONFIG_FILE_NAME);
        fs::copy(fixtures.config_file(config_name), &config_path)
            .expect("Failed to copy config file");

        let working_dir = path.join("work");
        fs::create_dir_all(&working_dir).expect("Failed to create working directory");

        Self {
            temp_dir,
            path,
            config_path,
            working_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn storage_root(&self) -> PathBuf {
        self.config().storage.root
    }

    pub fn config(&self) -> Config {
        Config::discover(&self.path).expect("Failed to load workspace config")
    }

    /// A dataset handle whose working directory is the workspace's `work/`
    pub fn dataset(&self, name: &str) -> Dataset {
        Dataset::local(name, &self.working_dir, &self.config())
    }

    /// Same storage, different working directory
    pub fn dataset_in(&self, name: &str, working_dir: &Path) -> Dataset {
        Dataset::local(name, working_dir, &self.config())
    }

    /// Write a blob file relative to the working directory
    pub fn write_blob(&self, relative: &str, content: &str) -> PathBuf {
        let target = self.working_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("Failed to create blob directory");
        }
        fs::write(&target, content).expect("Failed to write blob");
        target
    }

    pub fn read_blob(&self, relative: &str) -> String {
        fs::read_to_string(self.working_dir.join(relative)).expect("Failed to read blob")
    }

    /// Copy the image fixtures into the working directory and load their record table
    pub fn copy_image_fixtures(&self) -> RecordTable {
        let fixtures = TestFixtures::new();
        copy_dir(&fixtures.data_file("images"), &self.working_dir.join("images"));
        RecordTable::read_csv(&fixtures.data_file("images.csv"), "id")
            .expect("Failed to read images.csv")
    }

    /// Empty the working directory, as a fresh checkout would see it
    pub fn clear_working_dir(&self) {
        fs::remove_dir_all(&self.working_dir).expect("Failed to clear working directory");
        fs::create_dir_all(&self.working_dir).expect("Failed to create working directory");
    }
}

fn copy_dir(source: &Path, target: &Path) {
    for entry in WalkDir::new(source) {
        let entry = entry.expect("Failed to read directory entry");
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("Entry outside source directory");
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).expect("Failed to create directory");
        } else {
            fs::copy(entry.path(), &destination).expect("Failed to copy file");
        }
    }
}

/// Two-column record table with `id` and `uri`
pub fn records(rows: &[(i64, &str)]) -> RecordTable {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("uri", DataType::Utf8, true),
    ]));
    let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
    let uris: Vec<&str> = rows.iter().map(|(_, uri)| *uri).collect();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(uris)),
        ],
    )
    .expect("Failed to build record batch");
    RecordTable::new(batch)
}

/// Two text columns, `id` and `uri`, as CSV records come back from a pull
pub fn text_records(rows: &[(&str, &str)]) -> RecordTable {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, true),
        Field::new("uri", DataType::Utf8, true),
    ]));
    let ids: Vec<&str> = rows.iter().map(|(id, _)| *id).collect();
    let uris: Vec<&str> = rows.iter().map(|(_, uri)| *uri).collect();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(uris)),
        ],
    )
    .expect("Failed to build record batch");
    RecordTable::new(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_exist() {
        let fixtures = TestFixtures::new();
        assert!(fixtures.fixtures_dir.exists());
        assert!(fixtures.data_file("images.csv").exists());
        assert!(fixtures.config_file("local.toml").exists());
        assert!(fixtures.config_file("parquet.toml").exists());
    }

    #[test]
    fn test_workspace_creation() {
        let workspace = TestWorkspace::new("local.toml");
        assert!(workspace.config_path.exists());
        assert!(workspace.working_dir.is_dir());
        assert_eq!(
            workspace.storage_root(),
            workspace.path().join("dsversion_storage")
        );
    }
}

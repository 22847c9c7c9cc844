//! Record data: the tabular half of a dataset version
//!
//! The stores only need two things from record data: a byte-oriented tabular
//! encoding (CSV or Parquet) and access to a named column as strings. Both are
//! captured by [`RecordData`]; [`RecordTable`] implements it over an Arrow
//! `RecordBatch`.

use crate::error::{DatasetError, Result};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Serialization format used by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordFormat {
    /// Comma-separated values with a header row and the index dimension first
    #[default]
    Csv,
    /// Apache Parquet columnar format
    Parquet,
}

impl RecordFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RecordFormat::Csv => "csv",
            RecordFormat::Parquet => "parquet",
        }
    }

    /// Recover the format from a stored file name such as `ds_3.parquet`
    pub fn from_location(location: &str) -> Option<Self> {
        let extension = Path::new(location).extension()?.to_str()?;
        extension.parse().ok()
    }
}

impl FromStr for RecordFormat {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(RecordFormat::Csv),
            "parquet" => Ok(RecordFormat::Parquet),
            _ => Err(DatasetError::InvalidStorageFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RecordFormat {
    type Error = DatasetError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RecordFormat> for String {
    fn from(format: RecordFormat) -> Self {
        format.extension().to_string()
    }
}

impl std::fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Capabilities the stores require from a table of records.
pub trait RecordData: Sized {
    /// Write a header row and all rows, with `index_dimension` as the first column
    fn write_csv(&self, path: &Path, index_dimension: &str) -> Result<()>;

    fn read_csv(path: &Path, index_dimension: &str) -> Result<Self>;

    fn write_parquet(&self, path: &Path) -> Result<()>;

    fn read_parquet(path: &Path) -> Result<Self>;

    /// Values of a column rendered as strings; `None` for nulls
    fn column_values(&self, column: &str) -> Result<Vec<Option<String>>>;

    fn has_column(&self, column: &str) -> bool;

    fn num_rows(&self) -> usize;

    /// Blob paths named by the URI column, relative to the working directory.
    ///
    /// Null cells reference no object and are skipped.
    fn object_locations(&self, uri_dimension: &str) -> Result<Vec<PathBuf>> {
        if !self.has_column(uri_dimension) {
            return Err(DatasetError::missing_dimension(
                uri_dimension,
                "column not present in record data",
            ));
        }

        self.column_values(uri_dimension)?
            .into_iter()
            .flatten()
            .map(|uri| validate_relative_uri(&uri))
            .collect()
    }

    /// Ensure the index column exists and holds no duplicate keys
    fn check_index(&self, index_dimension: &str) -> Result<()> {
        if !self.has_column(index_dimension) {
            return Err(DatasetError::missing_dimension(
                index_dimension,
                "column not present in record data",
            ));
        }

        let mut seen = HashSet::new();
        for key in self.column_values(index_dimension)? {
            let key = key.ok_or_else(|| {
                DatasetError::missing_dimension(index_dimension, "index column contains nulls")
            })?;
            if !seen.insert(key.clone()) {
                return Err(DatasetError::DuplicateIndex {
                    dimension: index_dimension.to_string(),
                    key,
                });
            }
        }
        Ok(())
    }
}

fn validate_relative_uri(uri: &str) -> Result<PathBuf> {
    let path = PathBuf::from(uri);

    if uri.is_empty() || path.file_name().is_none() {
        return Err(DatasetError::invalid_uri(uri, "does not name a file"));
    }

    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(DatasetError::invalid_uri(
                    uri,
                    "escapes the working directory",
                ))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(DatasetError::invalid_uri(uri, "must be a relative path"))
            }
        }
    }

    Ok(path)
}

/// Record data backed by a single Arrow `RecordBatch`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    batch: RecordBatch,
}

impl RecordTable {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self { batch })
    }
}

impl From<RecordBatch> for RecordTable {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}

impl RecordData for RecordTable {
    fn write_csv(&self, path: &Path, index_dimension: &str) -> Result<()> {
        let schema = self.batch.schema();
        let index_position = schema.index_of(index_dimension).map_err(|_| {
            DatasetError::missing_dimension(index_dimension, "column not present in record data")
        })?;

        // Row key first, remaining columns in their original order
        let mut projection = vec![index_position];
        projection.extend((0..schema.fields().len()).filter(|i| *i != index_position));
        let ordered = self.batch.project(&projection)?;

        let file = File::create(path)?;
        let mut writer = WriterBuilder::new().with_header(true).build(file);
        writer.write(&ordered)?;

        Ok(())
    }

    fn read_csv(path: &Path, index_dimension: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let format = Format::default().with_header(true);
        // Only the header is needed: every column is read back as text so
        // values like "007" or "01" survive unchanged
        let (header, _) = format.infer_schema(&mut file, Some(0))?;
        file.seek(SeekFrom::Start(0))?;

        let schema = Schema::new(
            header
                .fields()
                .iter()
                .map(|field| Field::new(field.name(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );

        if schema.index_of(index_dimension).is_err() {
            return Err(DatasetError::missing_dimension(
                index_dimension,
                format!("column not present in {}", path.display()),
            ));
        }

        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(schema.clone())
            .with_format(format)
            .build(file)?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Self::from_batches(schema, &batches)
    }

    fn write_parquet(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, self.batch.schema(), None)?;
        writer.write(&self.batch)?;
        writer.close()?;
        Ok(())
    }

    fn read_parquet(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Self::from_batches(schema, &batches)
    }

    fn column_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        let array = self.batch.column_by_name(column).ok_or_else(|| {
            DatasetError::missing_dimension(column, "column not present in record data")
        })?;

        let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
        let values = (0..array.len())
            .map(|row| {
                if array.is_null(row) {
                    None
                } else {
                    Some(formatter.value(row).to_string())
                }
            })
            .collect();

        Ok(values)
    }

    fn has_column(&self, column: &str) -> bool {
        self.batch.column_by_name(column).is_some()
    }

    fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

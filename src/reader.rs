//! Record sources for the six Q5 tables
//!
//! A source only has to hand back record batches containing the required
//! columns by name; types are normalized later by `schema::canonicalize`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow_array::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;

use crate::error::{Error, Result};
use crate::schema::Table;

/// Rows per decoded batch
pub const BATCH_SIZE: usize = 8192;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies the rows of each logical table
pub trait RecordSource {
    fn read_table(&self, table: Table) -> Result<Vec<RecordBatch>>;
}

/// dbgen `.tbl` files: `|`-delimited text, no header, one file per table
#[derive(Debug, Clone)]
pub struct TblSource {
    dir: PathBuf,
    trailing_delimiter: bool,
}

impl TblSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            trailing_delimiter: true,
        }
    }

    /// dbgen ends every line with `|`, which reads as one extra empty field
    pub fn with_trailing_delimiter(mut self, trailing: bool) -> Self {
        self.trailing_delimiter = trailing;
        self
    }

    pub fn path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.tbl", table.name()))
    }

    fn file_schema(&self, table: Table) -> Arc<Schema> {
        let mut fields: Vec<Field> = table
            .tbl_columns()
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect();
        if self.trailing_delimiter {
            fields.push(Field::new("_trailing", DataType::Utf8, true));
        }
        Arc::new(Schema::new(fields))
    }
}

impl RecordSource for TblSource {
    fn read_table(&self, table: Table) -> Result<Vec<RecordBatch>> {
        let path = self.path(table);
        let unavailable = |source: BoxError| Error::SourceUnavailable {
            table,
            path: path.clone(),
            source,
        };

        let file = File::open(&path).map_err(|e| unavailable(e.into()))?;
        let reader = ReaderBuilder::new(self.file_schema(table))
            .with_header(false)
            .with_delimiter(b'|')
            .with_batch_size(BATCH_SIZE)
            .with_projection(table.tbl_projection())
            .build(file)
            .map_err(|e| unavailable(e.into()))?;

        reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| unavailable(e.into()))
    }
}

/// One `<table>.parquet` file per table, read with column projection
#[derive(Debug, Clone)]
pub struct ParquetSource {
    dir: PathBuf,
}

impl ParquetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.parquet", table.name()))
    }
}

impl RecordSource for ParquetSource {
    fn read_table(&self, table: Table) -> Result<Vec<RecordBatch>> {
        read_parquet(table, &self.path(table))
    }
}

fn read_parquet(table: Table, path: &Path) -> Result<Vec<RecordBatch>> {
    let unavailable = |source: BoxError| Error::SourceUnavailable {
        table,
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| unavailable(e.into()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| unavailable(e.into()))?;

    // Find indices of required columns
    let arrow_schema = builder.schema().clone();
    let projection_indices = table
        .required_columns()
        .iter()
        .map(|column| {
            arrow_schema
                .index_of(column.name)
                .map_err(|_| Error::MissingColumn {
                    table,
                    column: column.name,
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let projection = ProjectionMask::roots(builder.parquet_schema(), projection_indices);
    let reader = builder
        .with_projection(projection)
        .with_batch_size(BATCH_SIZE)
        .build()
        .map_err(|e| unavailable(e.into()))?;

    reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| unavailable(e.into()))
}

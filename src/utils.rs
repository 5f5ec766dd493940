//! Typed access to canonical table columns

use arrow_array::{Array, Decimal128Array, RecordBatch, StringArray};

use crate::error::{Error, Result};
use crate::schema::Table;

/// Get a canonical `Utf8` column by name
pub fn str_column<'a>(
    table: Table,
    batch: &'a RecordBatch,
    name: &'static str,
) -> Result<&'a StringArray> {
    column(table, batch, name)?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or(Error::MissingColumn { table, column: name })
}

/// Get a canonical `Decimal128` column by name
pub fn decimal_column<'a>(
    table: Table,
    batch: &'a RecordBatch,
    name: &'static str,
) -> Result<&'a Decimal128Array> {
    column(table, batch, name)?
        .as_any()
        .downcast_ref::<Decimal128Array>()
        .ok_or(Error::MissingColumn { table, column: name })
}

fn column<'a>(table: Table, batch: &'a RecordBatch, name: &'static str) -> Result<&'a dyn Array> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| Error::MissingColumn { table, column: name })?;
    Ok(batch.column(idx).as_ref())
}

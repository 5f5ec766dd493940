//! In-memory snapshot of the six Q5 tables
//!
//! Every table is held as a single canonical `RecordBatch`. The snapshot is
//! immutable once built; indexes and the fact-table scan borrow from it.

use std::time::Instant;

use arrow_array::RecordBatch;
use arrow_select::concat::concat_batches;
use tracing::{debug, info};

use crate::error::Result;
use crate::reader::RecordSource;
use crate::schema::{canonical_schema, canonicalize, Table};

#[derive(Debug, Clone)]
pub struct Tables {
    pub region: RecordBatch,
    pub nation: RecordBatch,
    pub supplier: RecordBatch,
    pub customer: RecordBatch,
    pub orders: RecordBatch,
    pub lineitem: RecordBatch,
}

impl Tables {
    /// Read all six tables from `source`
    ///
    /// The first table that cannot be read aborts the load, so the join never
    /// starts with a partial snapshot.
    pub fn load(source: &dyn RecordSource) -> Result<Self> {
        let start = Instant::now();
        let load = |table: Table| -> Result<RecordBatch> {
            let batches = source.read_table(table)?;
            let batch = combine(table, &batches)?;
            info!(table = %table, rows = batch.num_rows(), "loaded table");
            Ok(batch)
        };

        let tables = Self {
            region: load(Table::Region)?,
            nation: load(Table::Nation)?,
            supplier: load(Table::Supplier)?,
            customer: load(Table::Customer)?,
            orders: load(Table::Orders)?,
            lineitem: load(Table::LineItem)?,
        };
        debug!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "all tables loaded");
        Ok(tables)
    }

    /// Build a snapshot from batches already in memory
    pub fn from_batches(
        region: RecordBatch,
        nation: RecordBatch,
        supplier: RecordBatch,
        customer: RecordBatch,
        orders: RecordBatch,
        lineitem: RecordBatch,
    ) -> Result<Self> {
        Ok(Self {
            region: canonicalize(Table::Region, &region)?,
            nation: canonicalize(Table::Nation, &nation)?,
            supplier: canonicalize(Table::Supplier, &supplier)?,
            customer: canonicalize(Table::Customer, &customer)?,
            orders: canonicalize(Table::Orders, &orders)?,
            lineitem: canonicalize(Table::LineItem, &lineitem)?,
        })
    }

    #[cfg(test)]
    pub(crate) fn get(&self, table: Table) -> &RecordBatch {
        match table {
            Table::Region => &self.region,
            Table::Nation => &self.nation,
            Table::Supplier => &self.supplier,
            Table::Customer => &self.customer,
            Table::Orders => &self.orders,
            Table::LineItem => &self.lineitem,
        }
    }
}

/// Canonicalize each batch of `table` and concatenate them into one
fn combine(table: Table, batches: &[RecordBatch]) -> Result<RecordBatch> {
    let canonical = batches
        .iter()
        .map(|b| canonicalize(table, b))
        .collect::<Result<Vec<_>>>()?;
    Ok(concat_batches(&canonical_schema(table), &canonical)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fixtures::Dataset;
    use crate::utils::{decimal_column, str_column};
    use std::collections::HashMap;

    /// Serves batches from memory, optionally failing on one table
    struct MemorySource {
        batches: HashMap<Table, Vec<RecordBatch>>,
        broken: Option<Table>,
    }

    impl RecordSource for MemorySource {
        fn read_table(&self, table: Table) -> Result<Vec<RecordBatch>> {
            if self.broken == Some(table) {
                return Err(Error::SourceUnavailable {
                    table,
                    path: format!("{}.tbl", table.name()).into(),
                    source: "gone".into(),
                });
            }
            Ok(self.batches.get(&table).cloned().unwrap_or_default())
        }
    }

    fn split_source(broken: Option<Table>) -> MemorySource {
        let tables = Dataset::asia_example().build();
        let batches = Table::ALL
            .into_iter()
            .map(|t| {
                let batch = tables.get(t);
                // Two batches per table to exercise concatenation
                let half = batch.num_rows() / 2;
                let parts = vec![batch.slice(0, half), batch.slice(half, batch.num_rows() - half)];
                (t, parts)
            })
            .collect();
        MemorySource { batches, broken }
    }

    #[test]
    fn test_load_concatenates_batches() {
        let tables = Tables::load(&split_source(None)).unwrap();
        let expected = Dataset::asia_example().build();
        for table in Table::ALL {
            assert_eq!(tables.get(table).num_rows(), expected.get(table).num_rows());
            assert_eq!(tables.get(table).schema(), canonical_schema(table));
        }
    }

    #[test]
    fn test_load_stops_on_unavailable_table() {
        let err = Tables::load(&split_source(Some(Table::Customer))).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { table: Table::Customer, .. }));
    }

    #[test]
    fn test_empty_source_gives_empty_tables() {
        let source = MemorySource {
            batches: HashMap::new(),
            broken: None,
        };
        let tables = Tables::load(&source).unwrap();
        for table in Table::ALL {
            assert_eq!(tables.get(table).num_rows(), 0);
        }
    }

    #[test]
    fn test_typed_column_access() {
        let tables = Dataset::asia_example().build();
        let names = str_column(Table::Nation, &tables.nation, "n_name").unwrap();
        assert!(names.iter().flatten().any(|n| n == "CHINA"));

        let prices = decimal_column(Table::LineItem, &tables.lineitem, "l_extendedprice").unwrap();
        assert_eq!(prices.len(), tables.lineitem.num_rows());

        let err = decimal_column(Table::Nation, &tables.nation, "n_name").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }
}

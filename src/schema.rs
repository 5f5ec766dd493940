//! Table layouts and canonical column types for TPC-H Query 5
//!
//! Each table exposes a small fixed set of required columns. Whatever a
//! record source hands us is cast into this shape before the join runs, so
//! the rest of the engine only ever sees `Utf8` keys/names/dates and
//! `Decimal128(18, 6)` money columns.

use std::fmt;
use std::sync::Arc;

use arrow::compute::{cast_with_options, CastOptions};
use arrow_array::{Array, ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};

use crate::error::{Error, Result};

/// Precision of the canonical money columns
pub const MONEY_PRECISION: u8 = 18;

/// Fractional digits kept for `l_extendedprice` and `l_discount`
///
/// TPC-H money is `DECIMAL(15,2)`, but sources may carry finer values and
/// those must reach the revenue math unrounded.
pub const MONEY_SCALE: i8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Region,
    Nation,
    Supplier,
    Customer,
    Orders,
    LineItem,
}

/// How a required column is represented once canonicalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Opaque join key, compared by exact equality
    Key,
    Text,
    /// ISO `YYYY-MM-DD`, compared lexicographically
    Date,
    Money,
}

impl ColumnKind {
    pub fn data_type(self) -> DataType {
        match self {
            ColumnKind::Key | ColumnKind::Text | ColumnKind::Date => DataType::Utf8,
            ColumnKind::Money => DataType::Decimal128(MONEY_PRECISION, MONEY_SCALE),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

use ColumnKind::{Date, Key, Money, Text};

const REGION_COLUMNS: &[Column] = &[col("r_regionkey", Key), col("r_name", Text)];

const NATION_COLUMNS: &[Column] = &[
    col("n_nationkey", Key),
    col("n_name", Text),
    col("n_regionkey", Key),
];

const SUPPLIER_COLUMNS: &[Column] = &[col("s_suppkey", Key), col("s_nationkey", Key)];

const CUSTOMER_COLUMNS: &[Column] = &[col("c_custkey", Key), col("c_nationkey", Key)];

const ORDERS_COLUMNS: &[Column] = &[
    col("o_orderkey", Key),
    col("o_custkey", Key),
    col("o_orderdate", Date),
];

const LINEITEM_COLUMNS: &[Column] = &[
    col("l_orderkey", Key),
    col("l_suppkey", Key),
    col("l_extendedprice", Money),
    col("l_discount", Money),
];

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Region,
        Table::Nation,
        Table::Supplier,
        Table::Customer,
        Table::Orders,
        Table::LineItem,
    ];

    /// File stem used by dbgen and by the parquet exports
    pub fn name(self) -> &'static str {
        match self {
            Table::Region => "region",
            Table::Nation => "nation",
            Table::Supplier => "supplier",
            Table::Customer => "customer",
            Table::Orders => "orders",
            Table::LineItem => "lineitem",
        }
    }

    /// Columns the join reads from this table
    pub fn required_columns(self) -> &'static [Column] {
        match self {
            Table::Region => REGION_COLUMNS,
            Table::Nation => NATION_COLUMNS,
            Table::Supplier => SUPPLIER_COLUMNS,
            Table::Customer => CUSTOMER_COLUMNS,
            Table::Orders => ORDERS_COLUMNS,
            Table::LineItem => LINEITEM_COLUMNS,
        }
    }

    /// Full dbgen `.tbl` column layout, in file order
    pub fn tbl_columns(self) -> &'static [&'static str] {
        match self {
            Table::Region => &["r_regionkey", "r_name", "r_comment"],
            Table::Nation => &["n_nationkey", "n_name", "n_regionkey", "n_comment"],
            Table::Supplier => &[
                "s_suppkey",
                "s_name",
                "s_address",
                "s_nationkey",
                "s_phone",
                "s_acctbal",
                "s_comment",
            ],
            Table::Customer => &[
                "c_custkey",
                "c_name",
                "c_address",
                "c_nationkey",
                "c_phone",
                "c_acctbal",
                "c_mktsegment",
                "c_comment",
            ],
            Table::Orders => &[
                "o_orderkey",
                "o_custkey",
                "o_orderstatus",
                "o_totalprice",
                "o_orderdate",
                "o_orderpriority",
                "o_clerk",
                "o_shippriority",
                "o_comment",
            ],
            Table::LineItem => &[
                "l_orderkey",
                "l_partkey",
                "l_suppkey",
                "l_linenumber",
                "l_quantity",
                "l_extendedprice",
                "l_discount",
                "l_tax",
                "l_returnflag",
                "l_linestatus",
                "l_shipdate",
                "l_commitdate",
                "l_receiptdate",
                "l_shipinstruct",
                "l_shipmode",
                "l_comment",
            ],
        }
    }

    /// Positions of the required columns within the `.tbl` layout
    pub fn tbl_projection(self) -> Vec<usize> {
        let layout = self.tbl_columns();
        self.required_columns()
            .iter()
            .filter_map(|c| layout.iter().position(|name| *name == c.name))
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema of a canonicalized batch for `table`
pub fn canonical_schema(table: Table) -> SchemaRef {
    let fields: Vec<Field> = table
        .required_columns()
        .iter()
        .map(|c| Field::new(c.name, c.kind.data_type(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Cast the required columns of `batch` into the canonical schema
///
/// Columns are located by name so sources may carry extra columns or a
/// different order. Money columns are cast strictly: an unparseable value, or
/// a text value with more than `MONEY_SCALE` fractional digits, is a
/// `MalformedNumeric` error instead of a silent null or rounding.
pub fn canonicalize(table: Table, batch: &RecordBatch) -> Result<RecordBatch> {
    let strict = CastOptions {
        safe: false,
        ..Default::default()
    };

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.required_columns().len());
    for column in table.required_columns() {
        let idx = batch
            .schema()
            .index_of(column.name)
            .map_err(|_| Error::MissingColumn {
                table,
                column: column.name,
            })?;
        let source = batch.column(idx);
        let target = column.kind.data_type();

        if source.data_type() == &target {
            columns.push(source.clone());
            continue;
        }

        if column.kind == ColumnKind::Money {
            check_fraction_digits(table, column.name, source.as_ref())?;
        }

        let cast = cast_with_options(source, &target, &strict).map_err(|e| match column.kind {
            ColumnKind::Money => Error::MalformedNumeric {
                table,
                column: column.name,
                reason: e.to_string(),
            },
            _ => Error::Arrow(e),
        })?;
        columns.push(cast);
    }

    Ok(RecordBatch::try_new(canonical_schema(table), columns)?)
}

/// Arrow rounds text decimals to the target scale; refuse instead
fn check_fraction_digits(table: Table, column: &'static str, source: &dyn Array) -> Result<()> {
    let Some(text) = source.as_any().downcast_ref::<StringArray>() else {
        return Ok(());
    };

    for value in text.iter().flatten() {
        let Some((_, fraction)) = value.trim().split_once('.') else {
            continue;
        };
        if fraction.trim_end_matches('0').len() > MONEY_SCALE as usize {
            return Err(Error::MalformedNumeric {
                table,
                column,
                reason: format!("'{value}' has more than {MONEY_SCALE} fractional digits"),
            });
        }
    }
    Ok(())
}

//! Filtered hash indexes over the dimension tables
//!
//! Built once, sequentially, as a strict pipeline:
//! region -> nation -> supplier / customer -> orders. Each step keeps only
//! rows whose foreign key survived the previous step, so the fact-table scan
//! never has to look at a dimension table again.

use std::collections::HashMap;
use std::time::Instant;

use arrow::array::{Array, BooleanArray, RecordBatch, Scalar, StringArray};
use arrow::compute;
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::QueryParams;
use crate::schema::Table;
use crate::tables::Tables;
use crate::utils::str_column;

/// Key -> attribute lookup borrowing from the table snapshot
pub type Index<'a> = HashMap<&'a str, &'a str>;

/// The four immutable lookups the join needs
#[derive(Debug, Clone, Default)]
pub struct FilterIndexes<'a> {
    /// `n_nationkey -> n_name`, nations of the target region only
    pub nations: Index<'a>,
    /// `s_suppkey -> s_nationkey`
    pub suppliers: Index<'a>,
    /// `c_custkey -> c_nationkey`
    pub customers: Index<'a>,
    /// `o_orderkey -> o_custkey`, orders inside the date interval only
    pub orders: Index<'a>,
}

impl<'a> FilterIndexes<'a> {
    /// Run the whole filter pipeline against `tables`
    pub fn build(tables: &'a Tables, params: &QueryParams) -> Result<Self> {
        let start = Instant::now();

        let region_key = find_region(&tables.region, &params.region_name)?;
        let nations = nation_index(&tables.nation, region_key)?;
        let suppliers = nation_member_index(
            Table::Supplier,
            &tables.supplier,
            "s_suppkey",
            "s_nationkey",
            &nations,
        )?;
        let customers = nation_member_index(
            Table::Customer,
            &tables.customer,
            "c_custkey",
            "c_nationkey",
            &nations,
        )?;
        let orders = order_index(&tables.orders, params, &customers)?;

        debug!(
            region_key,
            nations = nations.len(),
            suppliers = suppliers.len(),
            customers = customers.len(),
            orders = orders.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "built filter indexes"
        );

        Ok(Self {
            nations,
            suppliers,
            customers,
            orders,
        })
    }
}

/// Key of the first region named `name`
///
/// Region names are expected to be unique; if they are not, the first match
/// wins.
pub fn find_region<'a>(region: &'a RecordBatch, name: &str) -> Result<&'a str> {
    let keys = str_column(Table::Region, region, "r_regionkey")?;
    let names = str_column(Table::Region, region, "r_name")?;

    keys.iter()
        .zip(names.iter())
        .find_map(|(key, n)| match (key, n) {
            (Some(key), Some(n)) if n == name => Some(key),
            _ => None,
        })
        .ok_or_else(|| Error::RegionNotFound {
            name: name.to_string(),
        })
}

/// `n_nationkey -> n_name` for nations in `region_key`
pub fn nation_index<'a>(nation: &'a RecordBatch, region_key: &str) -> Result<Index<'a>> {
    let keys = str_column(Table::Nation, nation, "n_nationkey")?;
    let names = str_column(Table::Nation, nation, "n_name")?;
    let regions = str_column(Table::Nation, nation, "n_regionkey")?;

    let mut index = HashMap::new();
    for ((key, name), region) in keys.iter().zip(names.iter()).zip(regions.iter()) {
        if let (Some(key), Some(name), Some(region)) = (key, name, region) {
            if region == region_key {
                index.insert(key, name);
            }
        }
    }
    Ok(index)
}

/// `key -> nation key` for suppliers or customers whose nation is indexed
pub fn nation_member_index<'a>(
    table: Table,
    batch: &'a RecordBatch,
    key_column: &'static str,
    nation_column: &'static str,
    nations: &Index<'_>,
) -> Result<Index<'a>> {
    let keys = str_column(table, batch, key_column)?;
    let nation_keys = str_column(table, batch, nation_column)?;

    let mut index = HashMap::new();
    for (key, nation) in keys.iter().zip(nation_keys.iter()) {
        if let (Some(key), Some(nation)) = (key, nation) {
            if nations.contains_key(nation) {
                index.insert(key, nation);
            }
        }
    }
    Ok(index)
}

/// `o_orderkey -> o_custkey` for orders in the date interval placed by an
/// indexed customer
pub fn order_index<'a>(
    orders: &'a RecordBatch,
    params: &QueryParams,
    customers: &Index<'_>,
) -> Result<Index<'a>> {
    let keys = str_column(Table::Orders, orders, "o_orderkey")?;
    let custkeys = str_column(Table::Orders, orders, "o_custkey")?;
    let dates = str_column(Table::Orders, orders, "o_orderdate")?;

    let mask = date_mask(dates, &params.start_date, &params.end_date)?;

    let mut index = HashMap::new();
    for i in 0..orders.num_rows() {
        if !mask.is_valid(i) || !mask.value(i) || keys.is_null(i) || custkeys.is_null(i) {
            continue;
        }
        let custkey = custkeys.value(i);
        if customers.contains_key(custkey) {
            index.insert(keys.value(i), custkey);
        }
    }
    Ok(index)
}

/// `start <= date < end`, evaluated with Arrow comparison kernels
///
/// ISO dates order lexicographically the same way they order in time, so a
/// plain string comparison is enough.
pub fn date_mask(dates: &StringArray, start: &str, end: &str) -> Result<BooleanArray> {
    let lower = Scalar::new(StringArray::from(vec![start]));
    let upper = Scalar::new(StringArray::from(vec![end]));

    let after_start = compute::kernels::cmp::gt_eq(dates, &lower)?;
    let before_end = compute::kernels::cmp::lt(dates, &upper)?;

    Ok(compute::and(&after_start, &before_end)?)
}

//! Parallel hash-join and revenue aggregation over lineitem
//!
//! The fact table is cut into one contiguous range per worker and each pool
//! thread scans exactly its own range; there is no work stealing between
//! ranges. Each worker probes the read-only filter indexes and sums revenue
//! into its own `PartialRevenue`, so nothing on the hot path is shared
//! mutably. Partials are merged in range order once every worker has
//! finished.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::time::Instant;

use arrow::array::{Array, Decimal128Array, RecordBatch, StringArray};
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::FilterIndexes;
use crate::revenue::Revenue;
use crate::schema::Table;
use crate::utils::{decimal_column, str_column};

/// Merged result: nation name -> total revenue
pub type RevenueByNation = HashMap<String, Revenue>;

/// One worker's private accumulator
///
/// Keyed by nation name rather than nation key since the output is by name.
#[derive(Debug, Clone, Default)]
pub struct PartialRevenue<'a> {
    totals: HashMap<&'a str, Revenue>,
    /// Line items that passed the full join predicate
    matched: u64,
}

impl<'a> PartialRevenue<'a> {
    #[inline(always)]
    pub fn add(&mut self, nation: &'a str, revenue: Revenue) {
        *self.totals.entry(nation).or_default() += revenue;
        self.matched += 1;
    }

    /// Merge another partial into this one
    pub fn merge(&mut self, other: PartialRevenue<'a>) {
        for (nation, revenue) in other.totals {
            *self.totals.entry(nation).or_default() += revenue;
        }
        self.matched += other.matched;
    }

    pub fn matched(&self) -> u64 {
        self.matched
    }

    #[cfg(test)]
    fn get(&self, nation: &str) -> Option<Revenue> {
        self.totals.get(nation).copied()
    }

    pub fn into_owned(self) -> RevenueByNation {
        self.totals
            .into_iter()
            .map(|(nation, revenue)| (nation.to_string(), revenue))
            .collect()
    }
}

/// Split `len` rows into `workers` contiguous ranges
///
/// Ranges are exhaustive, non-overlapping and differ in size by at most one
/// row; the first `len % workers` ranges take the extra rows. With more
/// workers than rows the tail ranges are empty.
pub fn partition_ranges(len: usize, workers: NonZeroUsize) -> Vec<Range<usize>> {
    let n = workers.get();
    let base = len / n;
    let extra = len % n;

    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// The four lineitem columns the join reads
#[derive(Debug, Clone, Copy)]
pub struct LineItemColumns<'b> {
    order_keys: &'b StringArray,
    supplier_keys: &'b StringArray,
    extended_price: &'b Decimal128Array,
    discount: &'b Decimal128Array,
}

impl<'b> LineItemColumns<'b> {
    pub fn new(lineitem: &'b RecordBatch) -> Result<Self> {
        Ok(Self {
            order_keys: str_column(Table::LineItem, lineitem, "l_orderkey")?,
            supplier_keys: str_column(Table::LineItem, lineitem, "l_suppkey")?,
            extended_price: decimal_column(Table::LineItem, lineitem, "l_extendedprice")?,
            discount: decimal_column(Table::LineItem, lineitem, "l_discount")?,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.order_keys.len()
    }

    #[inline(always)]
    fn keys(&self, row: usize) -> Option<(&'b str, &'b str)> {
        if self.order_keys.is_null(row) || self.supplier_keys.is_null(row) {
            return None;
        }
        Some((self.order_keys.value(row), self.supplier_keys.value(row)))
    }

    #[inline(always)]
    fn revenue(&self, row: usize) -> Result<Revenue> {
        for (column, values) in [
            ("l_extendedprice", self.extended_price),
            ("l_discount", self.discount),
        ] {
            if values.is_null(row) {
                return Err(Error::MalformedNumeric {
                    table: Table::LineItem,
                    column,
                    reason: format!("null value at row {row}"),
                });
            }
        }
        Ok(Revenue::disc_price(
            self.extended_price.value(row),
            self.discount.value(row),
        ))
    }
}

/// Fork-join scan of lineitem against prebuilt filter indexes
pub struct JoinAggregator<'i, 'a> {
    indexes: &'i FilterIndexes<'a>,
    workers: NonZeroUsize,
}

impl<'i, 'a> JoinAggregator<'i, 'a> {
    pub fn new(indexes: &'i FilterIndexes<'a>, workers: NonZeroUsize) -> Self {
        Self { indexes, workers }
    }

    /// Scan all of `lineitem` and return revenue per nation name
    ///
    /// Blocks until every worker has finished. An error in any worker fails
    /// the whole aggregation.
    pub fn aggregate(&self, lineitem: &RecordBatch) -> Result<RevenueByNation> {
        let start = Instant::now();
        let items = LineItemColumns::new(lineitem)?;
        let ranges = partition_ranges(items.len(), self.workers);

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers.get())
            .thread_name(|i| format!("q5-worker-{i}"))
            .build()?;

        // One call per pool thread; thread `i` owns `ranges[i]`
        let partials = pool
            .broadcast(|ctx| -> Result<PartialRevenue<'a>> {
                let worker = ctx.index();
                let range = ranges.get(worker).cloned().unwrap_or(0..0);
                let rows = range.len();
                let partial = self.scan_range(&items, range)?;
                debug!(worker, rows, matched = partial.matched(), "worker finished");
                Ok(partial)
            })
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let mut merged = PartialRevenue::default();
        for partial in partials {
            merged.merge(partial);
        }

        info!(
            workers = self.workers.get(),
            rows = items.len(),
            matched = merged.matched(),
            nations = merged.totals.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "aggregated lineitem"
        );
        Ok(merged.into_owned())
    }

    /// Join and aggregate the rows in `range`
    pub fn scan_range(
        &self,
        items: &LineItemColumns<'_>,
        range: Range<usize>,
    ) -> Result<PartialRevenue<'a>> {
        let idx = self.indexes;
        let mut partial = PartialRevenue::default();

        for row in range {
            let Some((order_key, supplier_key)) = items.keys(row) else {
                continue;
            };
            let Some(&custkey) = idx.orders.get(order_key) else {
                continue;
            };
            let Some(&supplier_nation) = idx.suppliers.get(supplier_key) else {
                continue;
            };

            // Every indexed order was placed by an indexed customer
            let customer_nation = *idx.customers.get(custkey).ok_or_else(|| Error::CorruptIndex {
                index: "customer",
                key: custkey.to_string(),
            })?;
            if customer_nation != supplier_nation {
                continue;
            }

            let nation = *idx.nations.get(customer_nation).ok_or_else(|| Error::CorruptIndex {
                index: "nation",
                key: customer_nation.to_string(),
            })?;
            partial.add(nation, items.revenue(row)?);
        }

        Ok(partial)
    }
}

//! Query orchestration - ties together all components

use std::time::Instant;

use tracing::info;

use crate::aggregator::JoinAggregator;
use crate::error::Result;
use crate::filter::FilterIndexes;
use crate::params::QueryParams;
use crate::ranker::{rank, NationRevenue};
use crate::reader::RecordSource;
use crate::tables::Tables;

/// Execute TPC-H Query 5 over an already loaded snapshot
///
/// Returns revenue per nation of the requested region, sorted by revenue
/// descending. An unknown region is an error; a known region without
/// qualifying line items gives an empty result.
pub fn execute_tpch_q5(tables: &Tables, params: &QueryParams) -> Result<Vec<NationRevenue>> {
    let start = Instant::now();

    let indexes = FilterIndexes::build(tables, params)?;
    let totals = JoinAggregator::new(&indexes, params.workers).aggregate(&tables.lineitem)?;
    let results = rank(totals);

    info!(
        region = %params.region_name,
        rows = results.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "query 5 finished"
    );
    Ok(results)
}

/// Load every table from `source`, then execute the query
pub fn run(source: &dyn RecordSource, params: &QueryParams) -> Result<Vec<NationRevenue>> {
    let tables = Tables::load(source)?;
    execute_tpch_q5(&tables, params)
}

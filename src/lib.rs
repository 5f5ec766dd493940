//! TPC-H Query 5: local supplier volume
//!
//! Revenue per nation for one region and order-date interval, computed with
//! filtered hash indexes over the dimension tables and a parallel scan of
//! lineitem.

pub mod aggregator;
pub mod error;
pub mod filter;
pub mod params;
pub mod query;
pub mod ranker;
pub mod reader;
pub mod revenue;
pub mod schema;
pub mod tables;
pub mod utils;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{Error, Result};
pub use params::QueryParams;
pub use query::{execute_tpch_q5, run};
pub use ranker::NationRevenue;
pub use reader::{ParquetSource, RecordSource, TblSource};
pub use revenue::Revenue;
pub use tables::Tables;

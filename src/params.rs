//! Query parameters for a Q5 evaluation

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Region name, half-open order-date interval and worker count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub region_name: String,
    /// Inclusive
    pub start_date: String,
    /// Exclusive
    pub end_date: String,
    pub workers: NonZeroUsize,
}

impl QueryParams {
    /// Validate and build parameters
    ///
    /// Dates must be ISO `YYYY-MM-DD` since they are compared against
    /// `o_orderdate` as plain strings.
    pub fn new(
        region_name: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        workers: usize,
    ) -> Result<Self> {
        let region_name = region_name.into();
        let start_date = start_date.into();
        let end_date = end_date.into();

        if region_name.is_empty() {
            return Err(Error::InvalidParameter {
                name: "region_name",
                reason: "must not be empty".to_string(),
            });
        }
        check_date("start_date", &start_date)?;
        check_date("end_date", &end_date)?;

        let workers = NonZeroUsize::new(workers).ok_or_else(|| Error::InvalidParameter {
            name: "workers",
            reason: "must be at least 1".to_string(),
        })?;

        if start_date >= end_date {
            warn!(%start_date, %end_date, "empty order date interval, no order can qualify");
        }

        Ok(Self {
            region_name,
            start_date,
            end_date,
            workers,
        })
    }

    /// True when `date` falls in `[start_date, end_date)`
    pub fn contains_date(&self, date: &str) -> bool {
        self.start_date.as_str() <= date && date < self.end_date.as_str()
    }
}

fn check_date(name: &'static str, value: &str) -> Result<()> {
    // chrono accepts unpadded fields, which would break lexicographic order
    if value.len() != 10 {
        return Err(Error::InvalidParameter {
            name,
            reason: format!("'{value}' is not in YYYY-MM-DD form"),
        });
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| Error::InvalidParameter {
        name,
        reason: format!("'{value}': {e}"),
    })?;
    Ok(())
}

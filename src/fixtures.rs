//! Test-only builder for small Q5 datasets

use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};

use crate::tables::Tables;

const REGION_NAMES: [&str; 5] = ["AFRICA", "AMERICA", "ASIA", "EUROPE", "MIDDLE EAST"];

#[derive(Debug, Clone, Default)]
pub(crate) struct Dataset {
    regions: Vec<[String; 2]>,
    nations: Vec<[String; 3]>,
    suppliers: Vec<[String; 2]>,
    customers: Vec<[String; 2]>,
    orders: Vec<[String; 3]>,
    lineitems: Vec<[String; 4]>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, key: &str, name: &str) -> Self {
        self.regions.push([key.into(), name.into()]);
        self
    }

    pub fn nation(mut self, key: &str, name: &str, region: &str) -> Self {
        self.nations.push([key.into(), name.into(), region.into()]);
        self
    }

    pub fn supplier(mut self, key: &str, nation: &str) -> Self {
        self.suppliers.push([key.into(), nation.into()]);
        self
    }

    pub fn customer(mut self, key: &str, nation: &str) -> Self {
        self.customers.push([key.into(), nation.into()]);
        self
    }

    pub fn order(mut self, key: &str, customer: &str, date: &str) -> Self {
        self.orders.push([key.into(), customer.into(), date.into()]);
        self
    }

    pub fn lineitem(mut self, order: &str, supplier: &str, price: &str, discount: &str) -> Self {
        self.lineitems
            .push([order.into(), supplier.into(), price.into(), discount.into()]);
        self
    }

    /// ASIA = {CHINA, INDIA}, one CHINA/CHINA line worth 950.0000 in 1994
    pub fn asia_example() -> Self {
        Self::new()
            .region("2", "ASIA")
            .region("3", "EUROPE")
            .nation("18", "CHINA", "2")
            .nation("8", "INDIA", "2")
            .nation("7", "GERMANY", "3")
            .supplier("1", "18")
            .customer("1", "18")
            .order("1", "1", "1994-03-01")
            .lineitem("1", "1", "1000.00", "0.05")
    }

    /// Deterministic dataset over all five TPC-H regions with join misses,
    /// cross-nation lines and out-of-range dates mixed in
    pub fn synthetic(lineitems: usize) -> Self {
        let mut data = Self::new();
        for (key, name) in REGION_NAMES.iter().enumerate() {
            data = data.region(&key.to_string(), name);
        }
        for n in 0..25 {
            data = data.nation(&n.to_string(), &format!("NATION_{n:02}"), &(n % 5).to_string());
        }
        for s in 0..50 {
            data = data.supplier(&s.to_string(), &(s % 25).to_string());
        }
        for c in 0..100 {
            data = data.customer(&c.to_string(), &((c * 7) % 25).to_string());
        }
        for o in 0..400 {
            let year = 1992 + o % 7;
            let month = 1 + (o / 7) % 12;
            let day = 1 + (o / 3) % 28;
            let date = format!("{year}-{month:02}-{day:02}");
            data = data.order(&o.to_string(), &(o % 100).to_string(), &date);
        }
        for i in 0..lineitems {
            // Every 17th line points at an order that does not exist
            let order = if i % 17 == 0 { 10_000 + i } else { (i * 13) % 400 };
            // Even lines use a supplier from the customer's own nation
            let supplier = if i % 23 == 0 {
                9_999
            } else if i % 2 == 0 {
                ((order % 100) * 7) % 25 + 25 * ((i / 2) % 2)
            } else {
                (i * 7) % 50
            };
            let cents = (i * 7919) % 10_000_000 + 90_000;
            let price = format!("{}.{:02}", cents / 100, cents % 100);
            let discount = format!("0.{:02}", i % 11);
            data = data.lineitem(&order.to_string(), &supplier.to_string(), &price, &discount);
        }
        data
    }

    pub fn build(&self) -> Tables {
        Tables::from_batches(
            batch(&["r_regionkey", "r_name"], &self.regions),
            batch(&["n_nationkey", "n_name", "n_regionkey"], &self.nations),
            batch(&["s_suppkey", "s_nationkey"], &self.suppliers),
            batch(&["c_custkey", "c_nationkey"], &self.customers),
            batch(&["o_orderkey", "o_custkey", "o_orderdate"], &self.orders),
            batch(
                &["l_orderkey", "l_suppkey", "l_extendedprice", "l_discount"],
                &self.lineitems,
            ),
        )
        .expect("fixture tables are well formed")
    }
}

/// All-`Utf8` batch, the shape a text loader produces
fn batch<const N: usize>(names: &[&str; N], rows: &[[String; N]]) -> RecordBatch {
    let fields: Vec<Field> = names
        .iter()
        .map(|n| Field::new(*n, DataType::Utf8, true))
        .collect();
    let columns: Vec<ArrayRef> = (0..N)
        .map(|i| {
            let values: Vec<&str> = rows.iter().map(|r| r[i].as_str()).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).expect("fixture batch")
}

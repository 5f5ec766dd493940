//! Fixed-point revenue arithmetic
//!
//! `l_extendedprice` and `l_discount` both arrive as `Decimal128` at
//! `MONEY_SCALE`, so `price * (1 - discount)` is exact at twice that scale
//! using integer math. Summation is therefore associative and totals do not
//! depend on how the fact table was partitioned. Rounding to the four output
//! digits happens only when a value is rendered.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::schema::MONEY_SCALE;

/// Fractional digits carried by a revenue value
pub const REVENUE_SCALE: i8 = MONEY_SCALE * 2;

/// Fractional digits in the query output
pub const OUTPUT_SCALE: i8 = 4;

/// `1.00` at the discount's scale
const ONE_AT_MONEY_SCALE: i128 = 10i128.pow(MONEY_SCALE as u32);

const OUTPUT_UNIT: i128 = 10i128.pow(OUTPUT_SCALE as u32);

/// Revenue units per output unit
const OUTPUT_STEP: i128 = 10i128.pow((REVENUE_SCALE - OUTPUT_SCALE) as u32);

/// An exact revenue amount, stored as an integer at `REVENUE_SCALE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revenue(i128);

impl Revenue {
    pub const ZERO: Revenue = Revenue(0);

    /// Wrap a raw value already at `REVENUE_SCALE`
    pub const fn from_raw(raw: i128) -> Self {
        Revenue(raw)
    }

    pub const fn raw(self) -> i128 {
        self.0
    }

    /// `extended_price * (1 - discount)` from raw `MONEY_SCALE` decimals
    #[inline(always)]
    pub fn disc_price(extended_price: i128, discount: i128) -> Self {
        Revenue(extended_price * (ONE_AT_MONEY_SCALE - discount))
    }

    /// Value at `OUTPUT_SCALE`, rounded half away from zero
    pub fn to_output_raw(self) -> i128 {
        let quotient = self.0 / OUTPUT_STEP;
        let remainder = self.0 % OUTPUT_STEP;
        if remainder.abs() * 2 >= OUTPUT_STEP {
            quotient + self.0.signum()
        } else {
            quotient
        }
    }
}

impl Add for Revenue {
    type Output = Revenue;

    fn add(self, rhs: Revenue) -> Revenue {
        Revenue(self.0 + rhs.0)
    }
}

impl AddAssign for Revenue {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Revenue) {
        self.0 += rhs.0;
    }
}

impl Sum for Revenue {
    fn sum<I: Iterator<Item = Revenue>>(iter: I) -> Revenue {
        iter.fold(Revenue::ZERO, Add::add)
    }
}

/// Always prints exactly four fractional digits
impl fmt::Display for Revenue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.to_output_raw();
        let sign = if rounded < 0 { "-" } else { "" };
        let abs = rounded.unsigned_abs();
        let unit = OUTPUT_UNIT as u128;
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / unit,
            abs % unit,
            width = OUTPUT_SCALE as usize
        )
    }
}

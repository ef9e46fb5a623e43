//! Money scaling for upstream integer prices.
//!
//! Upstream sends prices as integers in the exchange's smallest unit. The
//! unit depends on the record's market segment id: currency segments quote
//! in 1/10000 or 1/10000000, everything else in paise (1/100).

use serde::Serialize;

/// Divider/precision pair used to scale one record's money fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scale {
    pub divider: i64,
    pub precision: usize,
}

impl Scale {
    pub const PAISE: Self = Self { divider: 100, precision: 2 };
    pub const TEN_THOUSANDTHS: Self = Self { divider: 10_000, precision: 4 };
    pub const TEN_MILLIONTHS: Self = Self { divider: 10_000_000, precision: 4 };

    /// Select the scale for an upstream `marketSegmentId`.
    pub fn for_market_segment(segment_id: &str) -> Self {
        match segment_id {
            "11" | "12" => Self::TEN_THOUSANDTHS,
            "13" | "14" => Self::TEN_MILLIONTHS,
            _ => Self::PAISE,
        }
    }

    /// Divide `raw` by the divider and format to exactly `precision` decimals.
    #[inline]
    pub fn apply(self, raw: i64) -> String {
        scale(raw, self.divider, self.precision)
    }
}

/// `raw / divider` formatted with exactly `precision` decimal places.
pub fn scale(raw: i64, divider: i64, precision: usize) -> String {
    let divider = if divider == 0 { 1 } else { divider };
    format!("{:.*}", precision, raw as f64 / divider as f64)
}

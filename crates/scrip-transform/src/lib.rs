//! # scrip-transform
//!
//! Turns raw security-info records into normalized scrip master rows.
//!
//! ## Paths
//!
//! | Segment class | Module       | Admits                                         |
//! |---------------|--------------|------------------------------------------------|
//! | Cash          | [`cash`]     | listed, non-suspended, whitelisted series      |
//! | Derivative    | [`derivative`] | unexpired FUT*/OPT* contracts, index types   |
//!
//! Every record is decoded and checked on its own. A record that fails to
//! decode or trips a skip rule is counted and logged at `debug`; it never
//! stops the batch. Transformation is synchronous CPU work.

pub mod cash;
pub mod derivative;
mod row;
pub mod rules;

use tracing::{debug, info};

use scrip_core::{NormalizedInstrument, RawRecord, Segment, SegmentClass};

pub use self::rules::Rules;

/// Why a record produced no row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("suspended (remarks SP)")]
    Suspended,
    #[error("empty symbol")]
    EmptySymbol,
    #[error("series '{0}' not allowed")]
    SeriesNotAllowed(String),
    #[error("empty expiry")]
    EmptyExpiry,
    #[error("expiry '{0}' is not an epoch")]
    InvalidExpiry(String),
    #[error("expired at {0}")]
    Expired(i64),
    #[error("instrument type '{0}' is neither FUT/OPT nor an index")]
    NotTradable(String),
}

/// Running per-segment counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub processed: usize,
    pub skipped: usize,
}

impl TransformStats {
    pub fn admitted(&self) -> usize {
        self.processed - self.skipped
    }
}

/// Applies the segment-specific rules to raw records.
#[derive(Debug, Clone)]
pub struct InstrumentTransformer {
    rules: Rules,
}

impl InstrumentTransformer {
    pub fn new(rules: Rules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Decode and transform one page element.
    ///
    /// `now` is the wall clock in Unix seconds, used for expiry checks.
    pub fn transform(
        &self,
        value: &serde_json::Value,
        segment: &Segment,
        now: i64,
    ) -> Result<NormalizedInstrument, SkipReason> {
        let record = RawRecord::decode(value).map_err(|e| SkipReason::Malformed(e.to_string()))?;
        self.transform_record(&record, segment, now)
    }

    /// Transform an already-decoded record.
    pub fn transform_record(
        &self,
        record: &RawRecord,
        segment: &Segment,
        now: i64,
    ) -> Result<NormalizedInstrument, SkipReason> {
        match segment.class() {
            SegmentClass::Cash => cash::transform(record, segment, &self.rules),
            SegmentClass::Derivative => derivative::transform(record, segment, &self.rules, now),
        }
    }

    /// Transform every record of a segment's pages, in page order.
    pub fn transform_batches(
        &self,
        segment: &Segment,
        batches: &[Vec<serde_json::Value>],
        now: i64,
    ) -> (Vec<NormalizedInstrument>, TransformStats) {
        let mut stats = TransformStats::default();
        let mut rows = Vec::with_capacity(batches.iter().map(Vec::len).sum());

        for value in batches.iter().flatten() {
            stats.processed += 1;
            match self.transform(value, segment, now) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    stats.skipped += 1;
                    debug!(
                        segment = %segment,
                        symbol = value.get("symbol").and_then(|s| s.as_str()).unwrap_or_default(),
                        processed = stats.processed,
                        skipped = stats.skipped,
                        "[transform] skipped: {reason}"
                    );
                }
            }
        }

        info!(
            segment = %segment,
            processed = stats.processed,
            skipped = stats.skipped,
            rows = rows.len(),
            "[transform] segment transformed"
        );
        (rows, stats)
    }
}

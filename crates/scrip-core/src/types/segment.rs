//! Segment identifiers and their cash/derivative classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which transformer path and which whitelists apply to a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentClass {
    #[default]
    Cash,
    Derivative,
}

impl SegmentClass {
    /// Asset class string stored on every row of this class.
    pub fn asset_class(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Derivative => "derivative",
        }
    }
}

/// An upstream segment id such as `nse_cm` or `mcx_fo`.
///
/// Stored lowercase; anything that is not one of the two cash segments is a
/// derivative segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Segment(String);

impl Segment {
    pub const NSE_CM: &'static str = "nse_cm";
    pub const BSE_CM: &'static str = "bse_cm";
    pub const MCX_FO: &'static str = "mcx_fo";
    pub const NCX_FO: &'static str = "ncx_fo";

    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn class(&self) -> SegmentClass {
        if self.is_cash() { SegmentClass::Cash } else { SegmentClass::Derivative }
    }

    pub fn is_cash(&self) -> bool {
        matches!(self.0.as_str(), Self::NSE_CM | Self::BSE_CM)
    }

    /// Commodity F&O segments quote with a general/price numerator ratio.
    pub fn uses_price_multiplier(&self) -> bool {
        matches!(self.0.as_str(), Self::MCX_FO | Self::NCX_FO)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Segment> for String {
    fn from(s: Segment) -> Self {
        s.0
    }
}

//! Whitelists and display settings shared by both transformer paths.

use std::collections::HashSet;

use chrono::FixedOffset;
use scrip_core::config::AppSettings;
use scrip_core::time_util;

/// BSE scrip-code prefixes admitted regardless of series.
pub const BSE_EXEMPT_PREFIXES: [char; 3] = ['7', '5', '8'];

/// Segment-specific admission rules, built once from config.
#[derive(Debug, Clone)]
pub struct Rules {
    nse_series: HashSet<String>,
    bse_series: HashSet<String>,
    index_instruments: HashSet<String>,
    display_offset: FixedOffset,
}

impl Rules {
    pub fn new<S: Into<String>>(
        nse_series: impl IntoIterator<Item = S>,
        bse_series: impl IntoIterator<Item = S>,
        index_instruments: impl IntoIterator<Item = S>,
        display_offset_secs: i32,
    ) -> Self {
        Self {
            nse_series: nse_series.into_iter().map(Into::into).collect(),
            bse_series: bse_series.into_iter().map(Into::into).collect(),
            index_instruments: index_instruments.into_iter().map(Into::into).collect(),
            display_offset: time_util::display_offset(display_offset_secs),
        }
    }

    pub fn from_settings(app: &AppSettings) -> Self {
        Self::new(
            app.nse_series.iter().cloned(),
            app.bse_series.iter().cloned(),
            app.index_instruments.iter().cloned(),
            app.display_utc_offset_secs,
        )
    }

    pub fn nse_series_allowed(&self, series: &str) -> bool {
        self.nse_series.contains(series)
    }

    /// A BSE record is admitted by scrip-code prefix or by series.
    pub fn bse_admits(&self, scrip_code: &str, series: &str) -> bool {
        scrip_code.starts_with(BSE_EXEMPT_PREFIXES) || self.bse_series.contains(series)
    }

    pub fn is_index_instrument(&self, instrument_type: &str) -> bool {
        self.index_instruments.contains(instrument_type)
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }
}

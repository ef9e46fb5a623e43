//! Epoch clock and date rendering.
//!
//! Upstream dates arrive as Unix seconds encoded in strings. The sink stores
//! them human-readable, rendered in a fixed display offset (IST for the
//! Indian exchanges by default) so output does not depend on the host zone.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Expiry placeholder written for cash instruments.
pub const CASH_EXPIRY: &str = "01 Jan 1980";

/// Maturity placeholder when upstream sends nothing (or zero).
pub const NO_MATURITY: &str = "-";

const EXPIRY_FORMAT: &str = "%d %b %Y";
const MATURITY_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Current wall-clock time as **seconds** since Unix epoch.
#[inline]
pub fn now_epoch_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or_default()
}

/// Build the display offset, falling back to UTC on an out-of-range value.
pub fn display_offset(offset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix())
}

fn render(epoch_secs: i64, offset: FixedOffset, format: &str) -> Option<String> {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.with_timezone(&offset).format(format).to_string())
}

/// Render an expiry (Unix seconds) as `02 Jan 2006`.
pub fn format_expiry(epoch_secs: i64, offset: FixedOffset) -> Option<String> {
    render(epoch_secs, offset, EXPIRY_FORMAT)
}

/// Render a raw maturity string as `2006/01/02 15:04`, or `-` when it is
/// empty, zero, or not a number.
pub fn format_maturity(raw: &str, offset: FixedOffset) -> String {
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => NO_MATURITY.to_string(),
        Ok(secs) => {
            render(secs, offset, MATURITY_FORMAT).unwrap_or_else(|| NO_MATURITY.to_string())
        }
    }
}

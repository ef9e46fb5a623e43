//! Cash-market path (`nse_cm`, `bse_cm`).
//!
//! Skip rules, in order:
//!
//! 1. remarks `SP` (suspended) or empty symbol
//! 2. `nse_cm`: series not in the NSE whitelist
//! 3. `bse_cm`: scrip code not prefixed 7/5/8 and series not in the BSE whitelist

use scrip_core::format::Scale;
use scrip_core::time_util::{CASH_EXPIRY, NO_MATURITY};
use scrip_core::{NormalizedInstrument, RawRecord, Segment, SegmentClass};

use crate::row::base_row;
use crate::{Rules, SkipReason};

const SUSPENDED: &str = "SP";

pub fn transform(
    record: &RawRecord,
    segment: &Segment,
    rules: &Rules,
) -> Result<NormalizedInstrument, SkipReason> {
    if record.remarks_text == SUSPENDED {
        return Err(SkipReason::Suspended);
    }
    if record.symbol.is_empty() {
        return Err(SkipReason::EmptySymbol);
    }

    let admitted = match segment.as_str() {
        Segment::NSE_CM => rules.nse_series_allowed(&record.series),
        // BSE symbols are numeric scrip codes.
        Segment::BSE_CM => rules.bse_admits(&record.symbol, &record.series),
        _ => true,
    };
    if !admitted {
        return Err(SkipReason::SeriesNotAllowed(record.series.clone()));
    }

    let scale = Scale::for_market_segment(&record.market_segment_id);
    let details = if record.security_desc.is_empty() {
        NO_MATURITY.to_string()
    } else {
        record.security_desc.clone()
    };

    Ok(NormalizedInstrument {
        expiry_display: CASH_EXPIRY.to_string(),
        description: details.clone(),
        detail_text: details,
        ..base_row(record, SegmentClass::Cash, scale, rules)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cash_json, rules};

    fn record(edit: impl FnOnce(&mut serde_json::Value)) -> RawRecord {
        let mut v = cash_json();
        edit(&mut v);
        RawRecord::decode(&v).unwrap()
    }

    fn run(segment: &str, r: &RawRecord) -> Result<NormalizedInstrument, SkipReason> {
        transform(r, &Segment::new(segment), &rules())
    }

    #[test]
    fn nse_row_columns() {
        let row = run("nse_cm", &record(|_| {})).unwrap();
        assert_eq!(row.token, "INFY_1");
        assert_eq!(row.asset_class, SegmentClass::Cash);
        assert_eq!((row.divider, row.precision), (100, 2));
        assert_eq!(row.tick_size, "0.05");
        assert_eq!(row.freeze_percent, "20.00");
        assert_eq!(row.expiry_display, "01 Jan 1980");
        assert_eq!(row.maturity_date, "-");
        assert_eq!(row.detail_text, "INFOSYS LTD");
        assert_eq!(row.price_num, 1);
        assert_eq!(row.to_params().len(), 41);
    }

    #[test]
    fn empty_description_becomes_dash() {
        let row = run("nse_cm", &record(|v| v["securityDesc"] = "".into())).unwrap();
        assert_eq!(row.detail_text, "-");
        assert_eq!(row.description, "-");
    }

    #[test]
    fn nse_series_whitelist() {
        let r = record(|v| v["series"] = "GS".into());
        assert_eq!(run("nse_cm", &r), Err(SkipReason::SeriesNotAllowed("GS".into())));
    }

    #[test]
    fn suspended_checked_before_series() {
        let r = record(|v| {
            v["remarksText"] = "SP".into();
            v["series"] = "GS".into();
        });
        assert_eq!(run("nse_cm", &r), Err(SkipReason::Suspended));
    }

    #[test]
    fn bse_prefix_exemption() {
        let exempt = record(|v| {
            v["symbol"] = "500325".into();
            v["series"] = "Z".into();
        });
        assert!(run("bse_cm", &exempt).is_ok());

        let listed = record(|v| {
            v["symbol"] = "912345".into();
            v["series"] = "A".into();
        });
        assert!(run("bse_cm", &listed).is_ok());

        let rejected = record(|v| {
            v["symbol"] = "912345".into();
            v["series"] = "Z".into();
        });
        assert!(matches!(run("bse_cm", &rejected), Err(SkipReason::SeriesNotAllowed(_))));
    }

    #[test]
    fn bse_ignores_nse_whitelist() {
        let r = record(|v| {
            v["symbol"] = "500325".into();
            v["series"] = "EQ".into();
        });
        assert!(run("bse_cm", &r).is_ok());
    }

    #[test]
    fn currency_segment_scale() {
        let row = run(
            "nse_cm",
            &record(|v| {
                v["marketSegmentId"] = "13".into();
                v["priceTick"] = 25000.into();
            }),
        )
        .unwrap();
        assert_eq!((row.divider, row.precision), (10_000_000, 4));
        assert_eq!(row.tick_size, "0.0025");
        assert_eq!(row.token, "INFY_13");
    }
}

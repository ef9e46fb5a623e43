//! Derivative path (every non-cash segment).
//!
//! - `FUT*` / `OPT*`: need a non-empty, unexpired expiry. Options append
//!   option type and scaled strike to the detail text.
//! - Whitelisted index instrument types: detail text is the description.
//! - Anything else is skipped.
//!
//! Commodity segments (`mcx_fo`, `ncx_fo`) carry a price numerator derived
//! from the general and price ratios; it falls back to 1 on a zero
//! denominator.

use scrip_core::format::Scale;
use scrip_core::time_util;
use scrip_core::{NormalizedInstrument, RawRecord, Segment, SegmentClass};

use crate::row::base_row;
use crate::{Rules, SkipReason};

pub fn transform(
    record: &RawRecord,
    segment: &Segment,
    rules: &Rules,
    now: i64,
) -> Result<NormalizedInstrument, SkipReason> {
    let normal_market_allowed = record
        .normal_market_allowed
        .ok_or_else(|| SkipReason::Malformed("missing field `normalMarketAllowed`".into()))?;
    let price_num = if segment.uses_price_multiplier() { price_multiplier(record)? } else { 1 };

    let scale = Scale::for_market_segment(&record.market_segment_id);
    let inst = record.instrument_type.as_str();

    let (expiry_display, detail_text) = if inst.starts_with("FUT") || inst.starts_with("OPT") {
        let expiry = validate_expiry(&record.expiry_date, now)?;
        let display = time_util::format_expiry(expiry, rules.display_offset())
            .ok_or_else(|| SkipReason::InvalidExpiry(record.expiry_date.clone()))?;
        let mut detail = display.clone();
        if inst.starts_with("OPT") {
            let strike = scale.apply(record.strike_price);
            detail.push_str(&format!(" {} {strike}", record.option_type));
        }
        (display, detail)
    } else if rules.is_index_instrument(inst) {
        (record.expiry_date.clone(), record.security_desc.clone())
    } else {
        return Err(SkipReason::NotTradable(record.instrument_type.clone()));
    };

    Ok(NormalizedInstrument {
        normal_market_allowed,
        price_num,
        expiry_display,
        detail_text,
        ..base_row(record, SegmentClass::Derivative, scale, rules)
    })
}

/// Parse an expiry and reject it when it lies strictly before `now`.
///
/// An expiry equal to `now` is still tradable.
pub fn validate_expiry(expiry: &str, now: i64) -> Result<i64, SkipReason> {
    if expiry.is_empty() {
        return Err(SkipReason::EmptyExpiry);
    }
    let epoch: i64 =
        expiry.trim().parse().map_err(|_| SkipReason::InvalidExpiry(expiry.to_string()))?;
    if is_expired(epoch, now) { Err(SkipReason::Expired(epoch)) } else { Ok(epoch) }
}

#[inline]
pub fn is_expired(expiry_epoch: i64, now_epoch: i64) -> bool {
    expiry_epoch < now_epoch
}

/// `genNum / genDen * priceNum / priceDen` in integer arithmetic, evaluated
/// left to right; 1 when either denominator is zero. A step that overflows
/// `i64` makes the record malformed.
pub fn price_multiplier(record: &RawRecord) -> Result<i64, SkipReason> {
    let field = |v: Option<i64>, name: &str| {
        v.ok_or_else(|| SkipReason::Malformed(format!("missing field `{name}`")))
    };
    let gen_num = field(record.gen_num, "genNum")?;
    let gen_den = field(record.gen_den, "genDen")?;
    let price_num = field(record.price_num, "priceNum")?;
    let price_den = field(record.price_den, "priceDen")?;

    if gen_den == 0 || price_den == 0 {
        return Ok(1);
    }
    gen_num
        .checked_div(gen_den)
        .and_then(|v| v.checked_mul(price_num))
        .and_then(|v| v.checked_div(price_den))
        .ok_or_else(|| SkipReason::Malformed("price multiplier overflow".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{DAY, NOW, derivative_json, rules};

    fn record(
        instrument_type: &str,
        expiry: &str,
        edit: impl FnOnce(&mut serde_json::Value),
    ) -> RawRecord {
        let mut v = derivative_json(instrument_type, expiry);
        edit(&mut v);
        RawRecord::decode(&v).unwrap()
    }

    fn run(segment: &str, r: &RawRecord) -> Result<NormalizedInstrument, SkipReason> {
        transform(r, &Segment::new(segment), &rules(), NOW)
    }

    #[test]
    fn expiry_boundaries() {
        assert_eq!(validate_expiry(&(NOW - 1).to_string(), NOW), Err(SkipReason::Expired(NOW - 1)));
        assert_eq!(validate_expiry(&NOW.to_string(), NOW), Ok(NOW));
        assert_eq!(validate_expiry(&(NOW + 1).to_string(), NOW), Ok(NOW + 1));
        assert_eq!(validate_expiry("", NOW), Err(SkipReason::EmptyExpiry));
        assert!(matches!(validate_expiry("28-03-2024", NOW), Err(SkipReason::InvalidExpiry(_))));
    }

    #[test]
    fn option_detail_text() {
        let expiry = NOW + DAY;
        let row = run("nse_fo", &record("OPTIDX", &expiry.to_string(), |_| {})).unwrap();
        let display = time_util::format_expiry(expiry, rules().display_offset()).unwrap();

        assert_eq!(row.expiry_display, display);
        assert_eq!(row.detail_text, format!("{display} CE 150.00"));
        assert_eq!(row.asset_class, SegmentClass::Derivative);
        assert_eq!(row.expiry_raw, expiry.to_string());
        assert_eq!(row.description, "NIFTY 28MAR24 22000 CE");
        assert_eq!(row.to_params().len(), 42);
    }

    #[test]
    fn future_detail_is_expiry_only() {
        let row = run("nse_fo", &record("FUTSTK", &(NOW + DAY).to_string(), |_| {})).unwrap();
        assert_eq!(row.detail_text, row.expiry_display);
        assert_eq!(row.price_num, 1);
    }

    #[test]
    fn expired_future_skipped() {
        let r = record("FUTIDX", &(NOW - DAY).to_string(), |_| {});
        assert_eq!(run("nse_fo", &r), Err(SkipReason::Expired(NOW - DAY)));
    }

    #[test]
    fn empty_expiry_skipped() {
        assert_eq!(run("nse_fo", &record("OPTSTK", "", |_| {})), Err(SkipReason::EmptyExpiry));
    }

    #[test]
    fn index_instrument_uses_description() {
        let r = record("INDEX", "", |v| v["securityDesc"] = "NIFTY 50".into());
        let row = run("nse_fo", &r).unwrap();
        assert_eq!(row.detail_text, "NIFTY 50");
        assert_eq!(row.expiry_display, "");
    }

    #[test]
    fn unknown_instrument_type_skipped() {
        let r = record("SPOT", &(NOW + DAY).to_string(), |_| {});
        assert_eq!(run("nse_fo", &r), Err(SkipReason::NotTradable("SPOT".into())));
    }

    #[test]
    fn missing_normal_market_is_malformed() {
        let r = record("FUTSTK", &(NOW + DAY).to_string(), |v| {
            v.as_object_mut().unwrap().remove("normalMarketAllowed");
        });
        assert!(matches!(run("nse_fo", &r), Err(SkipReason::Malformed(_))));
    }

    fn with_ratios(gn: i64, gd: i64, pn: i64, pd: i64) -> impl FnOnce(&mut serde_json::Value) {
        move |v| {
            v["genNum"] = gn.into();
            v["genDen"] = gd.into();
            v["priceNum"] = pn.into();
            v["priceDen"] = pd.into();
        }
    }

    #[test]
    fn commodity_multiplier() {
        let r = record("FUTCOM", &(NOW + DAY).to_string(), with_ratios(100, 1, 10, 2));
        assert_eq!(run("mcx_fo", &r).unwrap().price_num, 500);
    }

    #[test]
    fn commodity_multiplier_zero_denominator() {
        let r = record("FUTCOM", &(NOW + DAY).to_string(), with_ratios(100, 0, 10, 2));
        assert_eq!(run("ncx_fo", &r).unwrap().price_num, 1);
        let r = record("FUTCOM", &(NOW + DAY).to_string(), with_ratios(100, 1, 10, 0));
        assert_eq!(run("mcx_fo", &r).unwrap().price_num, 1);
    }

    #[test]
    fn ratios_ignored_outside_commodities() {
        let r = record("FUTSTK", &(NOW + DAY).to_string(), with_ratios(100, 1, 10, 2));
        assert_eq!(run("nse_fo", &r).unwrap().price_num, 1);
    }

    #[test]
    fn commodity_without_ratios_is_malformed() {
        let r = record("FUTCOM", &(NOW + DAY).to_string(), |_| {});
        assert!(matches!(run("mcx_fo", &r), Err(SkipReason::Malformed(_))));
    }

    #[test]
    fn integer_division_is_left_to_right() {
        // 7/2 = 3, 3*5 = 15, 15/4 = 3
        let r = record("FUTCOM", &(NOW + DAY).to_string(), with_ratios(7, 2, 5, 4));
        assert_eq!(price_multiplier(&r), Ok(3));
    }

    #[test]
    fn multiplier_overflow_is_malformed() {
        let overflow = SkipReason::Malformed("price multiplier overflow".into());
        let expiry = (NOW + DAY).to_string();

        let r = record("FUTCOM", &expiry, with_ratios(1_000_000_000_000_000_000, 1, 100, 1));
        assert_eq!(price_multiplier(&r), Err(overflow.clone()));

        // i64::MIN / -1
        let r = record("FUTCOM", &expiry, with_ratios(i64::MIN, -1, 1, 1));
        assert_eq!(price_multiplier(&r), Err(overflow.clone()));
        assert_eq!(run("mcx_fo", &r), Err(overflow));
    }
}

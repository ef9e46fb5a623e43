//! Columns shared by both paths.

use scrip_core::format::Scale;
use scrip_core::time_util;
use scrip_core::{NormalizedInstrument, RawRecord, SegmentClass};

use crate::Rules;

/// Row with every record-derived column filled in. Each path then sets
/// expiry, detail text, and the class-specific columns.
pub(crate) fn base_row(
    record: &RawRecord,
    class: SegmentClass,
    scale: Scale,
    rules: &Rules,
) -> NormalizedInstrument {
    NormalizedInstrument {
        token: format!("{}_{}", record.symbol, record.market_segment_id),
        symbol: record.symbol.clone(),
        name: record.symbol_name.clone(),
        series: record.series.clone(),
        instrument_type: record.instrument_type.clone(),
        normal_market_allowed: record.normal_market_allowed.unwrap_or_default(),
        divider: scale.divider,
        precision: scale.precision as i64,
        asset_class: class,
        maturity_date: time_util::format_maturity(
            &record.issue_maturity_date,
            rules.display_offset(),
        ),
        description: record.security_desc.clone(),
        tick_size: scale.apply(record.price_tick),
        min_lot: record.minimum_lot,
        low_price_range: record.low_price_range,
        high_price_range: record.high_price_range,
        asset_token: record.asset_token.clone(),
        instrument_name: record.instrument_type.clone(),
        expiry_raw: record.expiry_date.clone(),
        expiry_display: record.expiry_date.clone(),
        strike_price: record.strike_price,
        option_type: record.option_type.clone(),
        segment_id: record.market_segment_id.clone(),
        face_value: record.face_value.clone(),
        isin: record.isin_code.clone(),
        price_quot_unit: record.price_quot_unit,
        max_single_trans_qty: record.max_single_trans_qty,
        max_single_trans_value: record.max_single_trans_value,
        qty_units: record.qty_units.clone(),
        price_num: 1,
        price_den: 1,
        market_type: record.market_type.clone(),
        open_interest: record.open_interest,
        total_value_traded: record.total_value_traded,
        detail_text: String::new(),
        freeze_percent: scale.apply(record.freeze_percent),
        delivery_unit: record.delivery_unit.clone(),
        base_price: record.base_price,
        issue_capital: record.issue_capital,
        regular_lot: record.regular_lot,
        price_quot_factor: record.price_quot_factor.clone(),
        issue_start_date: record.issue_start_date.clone(),
        trading_symbol: record.trd_symbol.clone(),
    }
}

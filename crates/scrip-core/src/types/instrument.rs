//! The normalized instrument row written to the scrip master table.

use serde::Serialize;

use super::segment::SegmentClass;
use super::sql::SqlParam;

/// A fully-populated scrip master row.
///
/// Only built from a record that passed every skip rule of its segment, so
/// no field is ever a placeholder for "could not decode".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedInstrument {
    /// `<symbol>_<marketSegmentId>`.
    pub token: String,
    pub symbol: String,
    pub name: String,
    pub series: String,
    pub instrument_type: String,
    pub normal_market_allowed: i64,
    pub divider: i64,
    pub precision: i64,
    pub asset_class: SegmentClass,
    pub maturity_date: String,
    pub description: String,
    /// Scaled tick size.
    pub tick_size: String,
    pub min_lot: i64,
    pub low_price_range: i64,
    pub high_price_range: i64,
    pub asset_token: String,
    pub instrument_name: String,
    pub expiry_raw: String,
    pub expiry_display: String,
    pub strike_price: i64,
    pub option_type: String,
    pub segment_id: String,
    pub face_value: String,
    pub isin: String,
    pub price_quot_unit: i64,
    pub max_single_trans_qty: i64,
    pub max_single_trans_value: i64,
    pub qty_units: String,
    pub price_num: i64,
    pub price_den: i64,
    pub market_type: String,
    pub open_interest: i64,
    pub total_value_traded: i64,
    pub detail_text: String,
    /// Scaled freeze percentage.
    pub freeze_percent: String,
    pub delivery_unit: String,
    pub base_price: i64,
    pub issue_capital: i64,
    pub regular_lot: i64,
    pub price_quot_factor: String,
    pub issue_start_date: String,
    pub trading_symbol: String,
}

impl NormalizedInstrument {
    /// Positional bind list for the insert statement of this row's class.
    ///
    /// The derivative statement carries `normal_market_allowed` as its 6th
    /// column; the equity statement does not have it.
    pub fn to_params(&self) -> Vec<SqlParam> {
        let mut p: Vec<SqlParam> = Vec::with_capacity(42);
        p.push(self.token.as_str().into());
        p.push(self.symbol.as_str().into());
        p.push(self.name.as_str().into());
        p.push(self.series.as_str().into());
        p.push(self.instrument_type.as_str().into());
        if self.asset_class == SegmentClass::Derivative {
            p.push(self.normal_market_allowed.into());
        }
        p.push(self.divider.into());
        p.push(self.precision.into());
        p.push(self.asset_class.asset_class().into());
        p.push(self.maturity_date.as_str().into());
        p.push(self.description.as_str().into());
        p.push(self.tick_size.as_str().into());
        p.push(self.min_lot.into());
        p.push(self.low_price_range.into());
        p.push(self.high_price_range.into());
        p.push(self.asset_token.as_str().into());
        p.push(self.instrument_name.as_str().into());
        p.push(self.expiry_raw.as_str().into());
        p.push(self.expiry_display.as_str().into());
        p.push(self.strike_price.into());
        p.push(self.option_type.as_str().into());
        p.push(self.segment_id.as_str().into());
        p.push(self.face_value.as_str().into());
        p.push(self.isin.as_str().into());
        p.push(self.price_quot_unit.into());
        p.push(self.max_single_trans_qty.into());
        p.push(self.max_single_trans_value.into());
        p.push(self.qty_units.as_str().into());
        p.push(self.price_num.into());
        p.push(self.price_den.into());
        p.push(self.market_type.as_str().into());
        p.push(self.open_interest.into());
        p.push(self.total_value_traded.into());
        p.push(self.detail_text.as_str().into());
        p.push(self.freeze_percent.as_str().into());
        p.push(self.delivery_unit.as_str().into());
        p.push(self.base_price.into());
        p.push(self.issue_capital.into());
        p.push(self.regular_lot.into());
        p.push(self.price_quot_factor.as_str().into());
        p.push(self.issue_start_date.as_str().into());
        p.push(self.trading_symbol.as_str().into());
        p
    }
}

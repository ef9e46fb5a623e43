//! Typed view of one upstream security-info element.
//!
//! Upstream gives no schema guarantee, so every element of a page is decoded
//! on its own. A missing field or one of the wrong JSON type fails that
//! element only; callers turn the error into a per-record skip.
//!
//! Numeric fields arrive as JSON numbers (sometimes with a fractional part)
//! and are truncated to integers, matching how the exchange publishes them.

use serde::{Deserialize, Deserializer};

/// One decoded security-info record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub symbol: String,
    pub symbol_name: String,
    pub series: String,
    pub instrument_type: String,
    pub remarks_text: String,
    pub market_segment_id: String,
    pub issue_maturity_date: String,
    pub security_desc: String,
    pub asset_token: String,
    pub expiry_date: String,
    pub option_type: String,
    pub face_value: String,
    pub isin_code: String,
    pub qty_units: String,
    pub market_type: String,
    pub delivery_unit: String,
    pub price_quot_factor: String,
    pub issue_start_date: String,
    pub trd_symbol: String,

    #[serde(deserialize_with = "truncated")]
    pub price_tick: i64,
    #[serde(deserialize_with = "truncated")]
    pub minimum_lot: i64,
    #[serde(deserialize_with = "truncated")]
    pub low_price_range: i64,
    #[serde(deserialize_with = "truncated")]
    pub high_price_range: i64,
    #[serde(deserialize_with = "truncated")]
    pub strike_price: i64,
    #[serde(deserialize_with = "truncated")]
    pub price_quot_unit: i64,
    #[serde(deserialize_with = "truncated")]
    pub max_single_trans_qty: i64,
    #[serde(deserialize_with = "truncated")]
    pub max_single_trans_value: i64,
    #[serde(deserialize_with = "truncated")]
    pub open_interest: i64,
    #[serde(deserialize_with = "truncated")]
    pub total_value_traded: i64,
    #[serde(deserialize_with = "truncated")]
    pub freeze_percent: i64,
    #[serde(deserialize_with = "truncated")]
    pub base_price: i64,
    #[serde(deserialize_with = "truncated")]
    pub issue_capital: i64,
    #[serde(deserialize_with = "truncated")]
    pub regular_lot: i64,

    // Derivative-only fields. Their absence is checked by the derivative path.
    #[serde(default, deserialize_with = "truncated_opt")]
    pub normal_market_allowed: Option<i64>,
    #[serde(default, deserialize_with = "truncated_opt")]
    pub gen_num: Option<i64>,
    #[serde(default, deserialize_with = "truncated_opt")]
    pub gen_den: Option<i64>,
    #[serde(default, deserialize_with = "truncated_opt")]
    pub price_num: Option<i64>,
    #[serde(default, deserialize_with = "truncated_opt")]
    pub price_den: Option<i64>,
}

impl RawRecord {
    /// Decode one page element. The error text names the offending field.
    pub fn decode(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

fn truncated<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    f64::deserialize(d).map(|v| v as i64)
}

fn truncated_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Option::<f64>::deserialize(d).map(|v| v.map(|n| n as i64))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A complete cash record; tests override individual fields.

    pub fn cash_json() -> serde_json::Value {
        serde_json::json!({
            "symbol": "INFY", "symbolName": "INFOSYS LIMITED", "series": "EQ",
            "instrumentType": "EQUITY", "remarksText": "", "marketSegmentId": "1",
            "issueMaturityDate": "0", "securityDesc": "INFOSYS LTD", "assetToken": "1594",
            "expiryDate": "", "optionType": "", "faceValue": "5", "isinCode": "INE009A01021",
            "qtyUnits": "1", "marketType": "N", "deliveryUnit": "1", "priceQuotFactor": "1",
            "issueStartDate": "0", "trdSymbol": "INFY-EQ",
            "priceTick": 5.0, "minimumLot": 1, "lowPriceRange": 135000, "highPriceRange": 165000,
            "strikePrice": 0, "priceQuotUnit": 1, "maxSingleTransQty": 100000,
            "maxSingleTransValue": 0, "openInterest": 0, "totalValueTraded": 0,
            "freezePercent": 2000, "basePrice": 150000, "issueCapital": 4150000000.0,
            "regularLot": 1
        })
    }
}

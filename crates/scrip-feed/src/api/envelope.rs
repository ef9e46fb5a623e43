//! Upstream response envelopes.
//!
//! Every upstream response wraps its payload as
//! `{ "message": "...", "errcode": "...", "data": { ... } }`. Success is the
//! literal `success` in `message`, compared case-insensitively; the payload
//! is only read after that check.

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Literal success marker carried in `message`.
pub const SUCCESS: &str = "success";

/// Generic response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: String,
    /// Error code; upstream sends it as a string or a number.
    #[serde(default)]
    pub errcode: Option<serde_json::Value>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.message.eq_ignore_ascii_case(SUCCESS)
    }

    /// Error code rendered as text; empty when upstream sent none.
    pub fn error_code(&self) -> String {
        match &self.errcode {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub accesstoken: String,
}

/// One security-info page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub has_last_page: bool,
    /// Next page number. Arrives as a JSON float.
    pub next_page: f64,
    /// Raw records, decoded one by one by the transformer.
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl PageData {
    /// Cursor for the following request: `nextPage` rounded to the nearest
    /// integer (halves away from zero), never truncated.
    pub fn next_cursor(&self) -> String {
        (self.next_page.round() as i64).to_string()
    }
}

/// Stock-master payload.
#[derive(Debug, Clone, Deserialize)]
pub struct StockMasterData {
    #[serde(default)]
    pub stock_master: Vec<StockMasterEntry>,
}

/// One `{sid, isin}` mapping. Either side may be JSON `null` or the string `"null"`.
#[derive(Debug, Clone, Deserialize)]
pub struct StockMasterEntry {
    #[serde(default)]
    pub sid: Option<serde_json::Value>,
    #[serde(default)]
    pub isin: Option<serde_json::Value>,
}

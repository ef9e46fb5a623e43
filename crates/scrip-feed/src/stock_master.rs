//! Secondary stock-master feed.
//!
//! A single unauthenticated GET returning `{sid, isin}` pairs used to
//! reconcile internal stock ids against ISINs after the load. Both JSON
//! `null` and the string `"null"` count as empty; entries without an ISIN
//! are dropped here so the store only sees usable mappings.

use async_trait::async_trait;
use tracing::{error, info};

use scrip_core::{SyncError, SyncResult};

use crate::api::UpstreamClient;
use crate::api::envelope::{Envelope, StockMasterData, StockMasterEntry};

/// One usable stock id → ISIN mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockIdMapping {
    pub sid: String,
    pub isin: String,
}

/// Result of reading the feed: usable mappings plus how many were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockMaster {
    pub mappings: Vec<StockIdMapping>,
    pub skipped: usize,
}

/// Source of the stock-master feed.
#[async_trait]
pub trait StockMasterSource: Send + Sync {
    async fn fetch_stock_master(&self) -> SyncResult<StockMaster>;
}

#[async_trait]
impl StockMasterSource for UpstreamClient {
    async fn fetch_stock_master(&self) -> SyncResult<StockMaster> {
        let url = &self.config().stock_master_url;
        let resp = self.http().get(url).send().await.map_err(|e| {
            error!(url = %url, "[stock-master] request failed: {e}");
            SyncError::Enrichment(format!("stock master request: {e}"))
        })?;
        let body = resp
            .bytes()
            .await
            .map_err(|e| SyncError::Enrichment(format!("stock master body: {e}")))?;
        let master = parse_stock_master(&body)?;
        info!(
            mappings = master.mappings.len(),
            skipped = master.skipped,
            "[stock-master] feed read"
        );
        Ok(master)
    }
}

/// Parse a stock-master response body.
pub fn parse_stock_master(body: &[u8]) -> SyncResult<StockMaster> {
    let env: Envelope<StockMasterData> = Envelope::parse(body)
        .map_err(|e| SyncError::Enrichment(format!("malformed stock master response: {e}")))?;
    if !env.is_success() {
        let message = format!("stock master upstream message: {}", env.message);
        return Err(SyncError::Enrichment(message));
    }

    let entries = env.data.map(|d| d.stock_master).unwrap_or_default();
    let mut master = StockMaster::default();
    for entry in entries {
        match normalize(entry) {
            Some(mapping) => master.mappings.push(mapping),
            None => master.skipped += 1,
        }
    }
    Ok(master)
}

fn normalize(entry: StockMasterEntry) -> Option<StockIdMapping> {
    let isin = text_or_empty(entry.isin);
    if isin.is_empty() {
        return None;
    }
    Some(StockIdMapping { sid: text_or_empty(entry.sid), isin })
}

/// `null`, `"null"`, and missing all become empty; numbers are rendered.
fn text_or_empty(v: Option<serde_json::Value>) -> String {
    match v {
        Some(serde_json::Value::String(s)) if s != "null" => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

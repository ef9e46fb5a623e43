//! Upstream REST client.
//!
//! # Architecture
//!
//! ```text
//! UpstreamClient
//! ├── SessionAuthenticator   (POST login → bearer token)
//! ├── SecInfoApi impl        (GET ?exchange=<segment>&page=<n>)
//! └── StockMasterSource impl (GET secondary feed, no auth)
//! ```
//!
//! One `reqwest::Client` is shared by all calls of a run; it is cheap to
//! clone and safe to use from several tasks.

pub mod auth;
pub mod config;
pub mod envelope;

use async_trait::async_trait;
use tracing::{debug, error};

use scrip_core::{Segment, SyncError, SyncResult};

pub use self::auth::SessionAuthenticator;
use self::config::UpstreamConfig;
use self::envelope::{Envelope, PageData};
use crate::SecInfoApi;

/// HTTP client bound to one environment's endpoints.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("http client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

#[async_trait]
impl SecInfoApi for UpstreamClient {
    async fn fetch_page(&self, segment: &Segment, page: &str, token: &str) -> SyncResult<PageData> {
        let fetch_err = |reason: String| SyncError::Fetch {
            segment: segment.to_string(),
            page: page.to_string(),
            reason,
        };

        let resp = self
            .http
            .get(&self.config.sec_info_url)
            .query(&[("exchange", segment.as_str()), ("page", page)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!(segment = %segment, page, "[sec-info] request failed: {e}");
                fetch_err(e.to_string())
            })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| fetch_err(format!("reading body: {e}")))?;
        debug!(segment = %segment, page, %status, bytes = body.len(), "[sec-info] page received");

        let env: Envelope<PageData> = Envelope::parse(&body)
            .map_err(|e| fetch_err(format!("HTTP {status}, malformed envelope: {e}")))?;
        if !env.is_success() {
            return Err(fetch_err(format!("HTTP {status}, upstream message: {}", env.message)));
        }
        env.data.ok_or_else(|| fetch_err("success envelope without data".into()))
    }
}

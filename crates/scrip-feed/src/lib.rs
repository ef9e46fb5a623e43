//! # scrip-feed
//!
//! Upstream HTTP access for the scrip master synchronizer.
//!
//! The lifecycle is: [`api::SessionAuthenticator::authenticate`] once →
//! [`fetcher::SegmentFetcher`] per segment → [`stock_master`] feed after the
//! load. Page fetching goes through the [`SecInfoApi`] seam so the pagination
//! loop can be driven by any page source.
//!
//! ## Endpoints
//!
//! | Call          | Method | Auth                   | Pagination          |
//! |---------------|--------|------------------------|---------------------|
//! | Login         | POST   | identity headers       | -                   |
//! | Security info | GET    | `Bearer <accesstoken>` | `page` / `nextPage` |
//! | Stock master  | GET    | none                   | -                   |

pub mod api;
pub mod fetcher;
pub mod stock_master;

use async_trait::async_trait;
use scrip_core::{Segment, SyncResult};

use crate::api::envelope::PageData;
use crate::stock_master::StockMasterSource;

/// Exchanges the configured credentials for a bearer token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> SyncResult<String>;
}

/// Source of security-info pages for one segment.
///
/// Implementations return the page payload only for a success envelope; any
/// transport failure or non-success message is a [`scrip_core::SyncError::Fetch`].
#[async_trait]
pub trait SecInfoApi: Send + Sync {
    /// Request exactly one page (`page` is the upstream cursor, starting at `"1"`).
    async fn fetch_page(&self, segment: &Segment, page: &str, token: &str) -> SyncResult<PageData>;
}

/// Everything a run needs from upstream, as one bound.
pub trait Upstream: Authenticator + SecInfoApi + StockMasterSource {}

impl<T: Authenticator + SecInfoApi + StockMasterSource> Upstream for T {}

//! Per-segment pagination.
//!
//! The cursor starts at `"1"`. Each request asks for exactly one page; the
//! response says whether it was the last one and which page comes next.
//! Pages are yielded in request order and record order inside a page is
//! preserved. Any failed page ends the segment and discards what was fetched.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use scrip_core::{Segment, SyncError, SyncResult};

use crate::SecInfoApi;

/// Raw records of one page, still undecoded.
pub type RawBatch = Vec<serde_json::Value>;

/// First upstream page cursor.
pub const FIRST_PAGE: &str = "1";

/// Lazy, finite page sequence for one segment.
///
/// Call [`next_batch`](SegmentPages::next_batch) until it yields `None`.
pub struct SegmentPages<'a, A: SecInfoApi + ?Sized> {
    api: &'a A,
    segment: &'a Segment,
    token: &'a str,
    /// `None` once the last page has been returned.
    cursor: Option<String>,
}

impl<'a, A: SecInfoApi + ?Sized> SegmentPages<'a, A> {
    /// Request the page at the cursor and advance it.
    pub async fn next_batch(&mut self) -> SyncResult<Option<(String, RawBatch)>> {
        let Some(page) = self.cursor.take() else {
            return Ok(None);
        };

        let data = self.api.fetch_page(self.segment, &page, self.token).await?;
        if !data.has_last_page {
            self.cursor = Some(data.next_cursor());
        }
        debug!(
            segment = %self.segment,
            page = %page,
            records = data.data.len(),
            last = data.has_last_page,
            "[fetcher] page"
        );
        Ok(Some((page, data.data)))
    }
}

/// Paginates the security-info endpoint segment by segment.
pub struct SegmentFetcher<'a, A: SecInfoApi + ?Sized> {
    api: &'a A,
    token: &'a str,
}

impl<'a, A: SecInfoApi + ?Sized> SegmentFetcher<'a, A> {
    pub fn new(api: &'a A, token: &'a str) -> Self {
        Self { api, token }
    }

    /// Page sequence for `segment`, starting at page `"1"`.
    pub fn pages(&self, segment: &'a Segment) -> SegmentPages<'a, A> {
        SegmentPages {
            api: self.api,
            segment,
            token: self.token,
            cursor: Some(FIRST_PAGE.to_string()),
        }
    }

    /// Fetch every page of `segment`.
    ///
    /// Stops between pages when `shutdown` flips to `true`.
    pub async fn fetch_segment(
        &self,
        segment: &'a Segment,
        shutdown: &watch::Receiver<bool>,
    ) -> SyncResult<Vec<RawBatch>> {
        let mut pages = self.pages(segment);
        let mut batches = Vec::new();

        loop {
            if *shutdown.borrow() {
                warn!(
                    segment = %segment,
                    pages = batches.len(),
                    "[fetcher] cancelled, discarding fetched pages"
                );
                return Err(SyncError::Cancelled);
            }
            match pages.next_batch().await? {
                Some((_, batch)) => batches.push(batch),
                None => break,
            }
        }

        let records: usize = batches.iter().map(Vec::len).sum();
        info!(segment = %segment, pages = batches.len(), records, "[fetcher] segment fetched");
        Ok(batches)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedApi;
    use super::*;

    fn no_shutdown() -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        std::mem::forget(tx);
        rx
    }

    #[tokio::test]
    async fn stops_at_last_page_in_order() {
        let api = ScriptedApi::new(vec![
            ScriptedApi::page(2.0, false, 3),
            ScriptedApi::page(3.0, false, 2),
            ScriptedApi::page(0.0, true, 1),
        ]);
        let seg = Segment::new("nse_cm");
        let fetcher = SegmentFetcher::new(&api, "tok");
        let batches = fetcher.fetch_segment(&seg, &no_shutdown()).await.unwrap();

        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(*api.requested.lock().unwrap(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn float_cursor_is_rounded() {
        let api = ScriptedApi::new(vec![
            ScriptedApi::page(1.6, false, 1),
            ScriptedApi::page(0.0, true, 1),
        ]);
        let seg = Segment::new("nse_fo");
        SegmentFetcher::new(&api, "tok").fetch_segment(&seg, &no_shutdown()).await.unwrap();
        assert_eq!(*api.requested.lock().unwrap(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn single_page_segment() {
        let api = ScriptedApi::new(vec![ScriptedApi::page(0.0, true, 4)]);
        let seg = Segment::new("bse_cm");
        let fetcher = SegmentFetcher::new(&api, "tok");
        let batches = fetcher.fetch_segment(&seg, &no_shutdown()).await.unwrap();
        assert_eq!(batches.len(), 1);
    }

    #[tokio::test]
    async fn failure_discards_segment() {
        let api = ScriptedApi::new(vec![
            ScriptedApi::page(2.0, false, 5),
            Err(SyncError::Fetch {
                segment: "mcx_fo".into(),
                page: "2".into(),
                reason: "HTTP 502".into(),
            }),
        ]);
        let seg = Segment::new("mcx_fo");
        let fetcher = SegmentFetcher::new(&api, "tok");
        let err = fetcher.fetch_segment(&seg, &no_shutdown()).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch { ref page, .. } if page == "2"));
    }

    #[tokio::test]
    async fn lazy_pages_yield_then_end() {
        let api = ScriptedApi::new(vec![
            ScriptedApi::page(2.0, false, 1),
            ScriptedApi::page(0.0, true, 1),
        ]);
        let seg = Segment::new("nse_cm");
        let fetcher = SegmentFetcher::new(&api, "tok");
        let mut pages = fetcher.pages(&seg);

        assert_eq!(pages.next_batch().await.unwrap().unwrap().0, "1");
        assert_eq!(pages.next_batch().await.unwrap().unwrap().0, "2");
        assert!(pages.next_batch().await.unwrap().is_none());
        assert!(pages.next_batch().await.unwrap().is_none());
        assert_eq!(api.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_stops_between_pages() {
        let api = ScriptedApi::new(vec![ScriptedApi::page(2.0, false, 1)]);
        let seg = Segment::new("nse_cm");
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let err = SegmentFetcher::new(&api, "tok").fetch_segment(&seg, &rx).await.unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert!(api.requested.lock().unwrap().is_empty());
    }
}

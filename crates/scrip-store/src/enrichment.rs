//! Post-load enrichment: market cap refresh, then stock-id reconciliation.
//!
//! Both jobs run only after every segment loader has finished. They are
//! best-effort: failures are logged at `error` and reported back, but the
//! caller never turns them into a failed run.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use scrip_core::config::Statements;
use scrip_core::{SqlParam, SyncError, SyncResult};
use scrip_feed::stock_master::StockMasterSource;

use crate::connection::ConnectionManager;
use crate::database::Statement;

/// Outcome of the stock-id reconciliation job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockIdReport {
    pub updated: usize,
    /// Feed entries dropped for an empty ISIN.
    pub skipped: usize,
    pub failed: usize,
}

/// Results of both jobs; a job that failed as a whole carries its error.
#[derive(Debug)]
pub struct EnrichmentReport {
    pub market_cap: SyncResult<u64>,
    pub stock_id: SyncResult<StockIdReport>,
}

pub struct EnrichmentJobs {
    manager: Arc<ConnectionManager>,
    statements: Arc<Statements>,
    source: Arc<dyn StockMasterSource>,
}

impl EnrichmentJobs {
    pub fn new(
        manager: Arc<ConnectionManager>,
        statements: Arc<Statements>,
        source: Arc<dyn StockMasterSource>,
    ) -> Self {
        Self { manager, statements, source }
    }

    /// Market cap first, then stock ids. The second job runs even if the
    /// first one failed.
    pub async fn run_all(&self, shutdown: &watch::Receiver<bool>) -> EnrichmentReport {
        let market_cap =
            self.market_cap().await.inspect_err(|e| error!("[enrich] market cap failed: {e}"));
        let stock_id = self
            .stock_ids(shutdown)
            .await
            .inspect_err(|e| error!("[enrich] stock id reconciliation failed: {e}"));
        EnrichmentReport { market_cap, stock_id }
    }

    /// Execute the market-cap procedure once.
    pub async fn market_cap(&self) -> SyncResult<u64> {
        let stmt = Statement::new("market_cap_proc", &self.statements.market_cap_proc);
        let mut conn = self.manager.acquire().await.map_err(as_enrichment)?;
        let result = conn.execute(stmt, &[]).await;
        conn.close().await;
        let rows = result.map_err(as_enrichment)?;
        info!(rows, "[enrich] market cap updated");
        Ok(rows)
    }

    /// Fetch the stock-master feed and update one mapping per statement.
    ///
    /// Binds `$1 = sid`, `$2 = isin`. Stops between mappings once `shutdown`
    /// flips and returns [`SyncError::Cancelled`].
    pub async fn stock_ids(&self, shutdown: &watch::Receiver<bool>) -> SyncResult<StockIdReport> {
        let master = self.source.fetch_stock_master().await.map_err(as_enrichment)?;
        let stmt = Statement::new("stock_id_update", &self.statements.stock_id_update);
        let mut report = StockIdReport { skipped: master.skipped, ..StockIdReport::default() };

        let mut conn = self.manager.acquire().await.map_err(as_enrichment)?;
        for mapping in &master.mappings {
            if *shutdown.borrow() {
                warn!(updated = report.updated, "[enrich] shutdown, stock ids stopped");
                conn.close().await;
                return Err(SyncError::Cancelled);
            }
            let params =
                [SqlParam::from(mapping.sid.as_str()), SqlParam::from(mapping.isin.as_str())];
            match conn.execute(stmt, &params).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        statement = stmt.name,
                        isin = %mapping.isin,
                        failed = report.failed,
                        "[enrich] stock id update failed: {e}"
                    );
                }
            }
        }
        conn.close().await;

        info!(
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "[enrich] stock ids reconciled"
        );
        Ok(report)
    }
}

fn as_enrichment(e: SyncError) -> SyncError {
    match e {
        SyncError::Enrichment(_) | SyncError::Cancelled => e,
        other => SyncError::Enrichment(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use scrip_feed::stock_master::{StockIdMapping, StockMaster};

    use super::*;
    use crate::testing::{MemoryConnector, statements};

    struct FixedFeed(SyncResult<StockMaster>);

    #[async_trait]
    impl StockMasterSource for FixedFeed {
        async fn fetch_stock_master(&self) -> SyncResult<StockMaster> {
            match &self.0 {
                Ok(m) => Ok(m.clone()),
                Err(e) => Err(SyncError::Enrichment(e.to_string())),
            }
        }
    }

    fn mapping(sid: &str, isin: &str) -> StockIdMapping {
        StockIdMapping { sid: sid.into(), isin: isin.into() }
    }

    fn jobs(db: &MemoryConnector, feed: SyncResult<StockMaster>) -> EnrichmentJobs {
        let manager = ConnectionManager::new(Arc::new(db.clone()), 1).with_backoff(Duration::ZERO);
        EnrichmentJobs::new(Arc::new(manager), Arc::new(statements()), Arc::new(FixedFeed(feed)))
    }

    fn running() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn feed() -> SyncResult<StockMaster> {
        Ok(StockMaster {
            mappings: vec![mapping("100", "INE009A01021"), mapping("101", "INE467B01029")],
            skipped: 2,
        })
    }

    #[tokio::test]
    async fn runs_market_cap_then_stock_ids() {
        let db = MemoryConnector::new();
        let report = jobs(&db, feed()).run_all(&running()).await;

        assert!(report.market_cap.is_ok());
        assert_eq!(report.stock_id.unwrap(), StockIdReport { updated: 2, skipped: 2, failed: 0 });
        assert_eq!(db.executed(), vec!["market_cap_proc", "stock_id_update", "stock_id_update"]);
        assert_eq!(
            db.params_of("stock_id_update")[0],
            vec![SqlParam::Text("100".into()), SqlParam::Text("INE009A01021".into())]
        );
    }

    #[tokio::test]
    async fn market_cap_failure_does_not_block_stock_ids() {
        let db = MemoryConnector::new();
        db.fail_statement("market_cap_proc");
        let report = jobs(&db, feed()).run_all(&running()).await;

        assert!(matches!(report.market_cap, Err(SyncError::Enrichment(_))));
        assert_eq!(report.stock_id.unwrap().updated, 2);
    }

    #[tokio::test]
    async fn failed_mapping_is_isolated() {
        let db = MemoryConnector::new();
        db.fail_row("100");
        let report = jobs(&db, feed()).stock_ids(&running()).await.unwrap();
        assert_eq!(report, StockIdReport { updated: 1, skipped: 2, failed: 1 });
    }

    #[tokio::test]
    async fn feed_failure_is_enrichment_error() {
        let db = MemoryConnector::new();
        let feed = Err(SyncError::Enrichment("HTTP 503".into()));
        let report = jobs(&db, feed).run_all(&running()).await;
        assert!(matches!(report.stock_id, Err(SyncError::Enrichment(_))));
        assert_eq!(db.executed(), vec!["market_cap_proc"]);
    }

    #[tokio::test]
    async fn unreachable_sink_is_enrichment_error() {
        let db = MemoryConnector::new();
        db.fail_next_opens(4);
        let report = jobs(&db, feed()).run_all(&running()).await;
        assert!(matches!(report.market_cap, Err(SyncError::Enrichment(_))));
        assert!(matches!(report.stock_id, Err(SyncError::Enrichment(_))));
    }

    #[tokio::test]
    async fn shutdown_stops_stock_id_updates() {
        let db = MemoryConnector::new();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let err = jobs(&db, feed()).stock_ids(&rx).await.unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert!(db.executed().is_empty());
        assert_eq!(db.opened(), db.closed());
    }
}

//! Per-segment row writer.
//!
//! Each call acquires its own connection, executes one insert per row with
//! the row's bind list, and closes the connection. A failed row is logged
//! and counted; the batch carries on. When a failure also leaves the handle
//! dead, the loader runs one reconnect cycle and continues on the new
//! handle, or gives the segment up if the cycle is exhausted.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use scrip_core::config::Statements;
use scrip_core::{NormalizedInstrument, Segment, SegmentClass, SyncError, SyncResult};

use crate::connection::ConnectionManager;
use crate::database::Statement;

/// Outcome of loading one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub failed: usize,
}

pub struct StorageLoader {
    manager: Arc<ConnectionManager>,
    statements: Arc<Statements>,
}

impl StorageLoader {
    pub fn new(manager: Arc<ConnectionManager>, statements: Arc<Statements>) -> Self {
        Self { manager, statements }
    }

    fn insert_for(&self, class: SegmentClass) -> Statement<'_> {
        match class {
            SegmentClass::Cash => Statement::new("eq_insert", &self.statements.eq_insert),
            SegmentClass::Derivative => Statement::new("derv_insert", &self.statements.derv_insert),
        }
    }

    /// Insert `rows` for `segment`, each attempted exactly once.
    ///
    /// Checks `shutdown` between rows and returns [`SyncError::Cancelled`]
    /// once it flips.
    pub async fn load(
        &self,
        segment: &Segment,
        rows: &[NormalizedInstrument],
        shutdown: &watch::Receiver<bool>,
    ) -> SyncResult<LoadReport> {
        let mut conn = self.manager.acquire().await.inspect_err(|e| {
            error!(segment = %segment, "[loader] no connection, segment abandoned: {e}");
        })?;
        let mut report = LoadReport::default();

        for row in rows {
            if *shutdown.borrow() {
                warn!(
                    segment = %segment,
                    inserted = report.inserted,
                    failed = report.failed,
                    "[loader] cancelled"
                );
                conn.close().await;
                return Err(SyncError::Cancelled);
            }

            let stmt = self.insert_for(row.asset_class);
            if let Err(e) = conn.execute(stmt, &row.to_params()).await {
                report.failed += 1;
                error!(
                    segment = %segment,
                    statement = stmt.name,
                    token = %row.token,
                    failed = report.failed,
                    "[loader] row failed: {e}"
                );

                if conn.ping().await.is_err() {
                    warn!(segment = %segment, "[loader] connection lost mid-batch");
                    conn.close().await;
                    conn = self.manager.reconnect().await.inspect_err(|e| {
                        error!(
                            segment = %segment,
                            inserted = report.inserted,
                            failed = report.failed,
                            "[loader] segment abandoned: {e}"
                        );
                    })?;
                }
                continue;
            }
            report.inserted += 1;
        }

        conn.close().await;
        info!(
            segment = %segment,
            inserted = report.inserted,
            failed = report.failed,
            "[loader] segment loaded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{MemoryConnector, statements};

    fn loader(db: &MemoryConnector) -> StorageLoader {
        let manager = ConnectionManager::new(Arc::new(db.clone()), 2).with_backoff(Duration::ZERO);
        StorageLoader::new(Arc::new(manager), Arc::new(statements()))
    }

    fn row(token: &str, class: SegmentClass) -> NormalizedInstrument {
        NormalizedInstrument {
            token: token.into(),
            asset_class: class,
            ..NormalizedInstrument::default()
        }
    }

    fn running() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    fn cash_rows(tokens: &[&str]) -> Vec<NormalizedInstrument> {
        tokens.iter().map(|t| row(t, SegmentClass::Cash)).collect()
    }

    #[tokio::test]
    async fn inserts_every_row_with_class_statement() {
        let db = MemoryConnector::new();
        let (_tx, rx) = running();
        let rows = vec![row("INFY_1", SegmentClass::Cash), row("TCS_1", SegmentClass::Cash)];

        let report = loader(&db).load(&Segment::new("nse_cm"), &rows, &rx).await.unwrap();
        assert_eq!(report, LoadReport { inserted: 2, failed: 0 });
        assert_eq!(db.executed(), vec!["eq_insert", "eq_insert"]);
        assert_eq!(db.params_of("eq_insert")[0].len(), 41);
        assert_eq!((db.opened(), db.closed()), (1, 1));
    }

    #[tokio::test]
    async fn derivative_rows_bind_normal_market_column() {
        let db = MemoryConnector::new();
        let (_tx, rx) = running();
        let rows = vec![row("NIFTY_2", SegmentClass::Derivative)];
        loader(&db).load(&Segment::new("nse_fo"), &rows, &rx).await.unwrap();
        assert_eq!(db.params_of("derv_insert")[0].len(), 42);
    }

    #[tokio::test]
    async fn failed_row_does_not_stop_batch() {
        let db = MemoryConnector::new();
        db.fail_row("B_1");
        let (_tx, rx) = running();
        let rows = cash_rows(&["A_1", "B_1", "C_1"]);

        let report = loader(&db).load(&Segment::new("nse_cm"), &rows, &rx).await.unwrap();
        assert_eq!(report, LoadReport { inserted: 2, failed: 1 });
        assert_eq!(db.opened(), 1);
    }

    #[tokio::test]
    async fn lost_connection_reconnects_and_continues() {
        let db = MemoryConnector::new();
        db.sever_on_row("B_1");
        let (_tx, rx) = running();
        let rows = cash_rows(&["A_1", "B_1", "C_1"]);

        let report = loader(&db).load(&Segment::new("bse_cm"), &rows, &rx).await.unwrap();
        assert_eq!(report, LoadReport { inserted: 2, failed: 1 });
        assert_eq!(db.opened(), 2);
        assert_eq!(db.closed(), 2);
    }

    #[tokio::test]
    async fn exhausted_reconnect_abandons_segment() {
        let db = MemoryConnector::new();
        db.fail_next_opens(3);
        let (_tx, rx) = running();
        let rows = cash_rows(&["A_1"]);
        let err = loader(&db).load(&Segment::new("nse_cm"), &rows, &rx).await.unwrap_err();
        assert!(matches!(err, SyncError::ConnectionExhausted { attempts: 2 }));
        assert!(db.executed().is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_between_rows() {
        let db = MemoryConnector::new();
        let (tx, rx) = running();
        tx.send(true).unwrap();
        let rows = cash_rows(&["A_1"]);
        let err = loader(&db).load(&Segment::new("nse_cm"), &rows, &rx).await.unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert!(db.executed().is_empty());
        assert_eq!(db.closed(), 1);
    }

    #[tokio::test]
    async fn empty_segment_is_a_clean_load() {
        let db = MemoryConnector::new();
        let (_tx, rx) = running();
        let report = loader(&db).load(&Segment::new("mcx_fo"), &[], &rx).await.unwrap();
        assert_eq!(report, LoadReport::default());
    }
}

//! Bounded reconnect around a [`Connector`].
//!
//! [`ConnectionManager::acquire`] opens and pings once. If that handle is
//! not alive it runs exactly one [`reconnect`](ConnectionManager::reconnect)
//! cycle of `attempts` open+ping tries, backing off between tries. When the
//! cycle ends without a live handle the caller gets
//! [`SyncError::ConnectionExhausted`] and abandons its unit of work.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use scrip_core::{SyncError, SyncResult};

use crate::database::{Connection, Connector};

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    attempts: u32,
    initial_backoff: Duration,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, attempts: u32) -> Self {
        Self { connector, attempts, initial_backoff: INITIAL_BACKOFF }
    }

    /// Override the first backoff delay (doubles per attempt, capped at 5s).
    pub fn with_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// A live connection, reconnecting at most one cycle.
    pub async fn acquire(&self) -> SyncResult<Box<dyn Connection>> {
        match self.connect().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                warn!("[db] connection not alive: {e}, reconnecting");
                self.reconnect().await
            }
        }
    }

    /// Up to `attempts` open+ping tries; the first live handle wins.
    pub async fn reconnect(&self) -> SyncResult<Box<dyn Connection>> {
        let mut backoff = self.initial_backoff;
        for attempt in 1..=self.attempts {
            match self.connect().await {
                Ok(conn) => {
                    info!(attempt, attempts = self.attempts, "[db] reconnected");
                    return Ok(conn);
                }
                Err(e) => {
                    warn!(attempt, attempts = self.attempts, "[db] reconnect attempt failed: {e}");
                    if attempt < self.attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }
        Err(SyncError::ConnectionExhausted { attempts: self.attempts })
    }

    /// Open and ping once; a handle that fails the ping is closed.
    pub async fn connect(&self) -> SyncResult<Box<dyn Connection>> {
        let mut conn = self.connector.open().await?;
        if let Err(e) = conn.ping().await {
            conn.close().await;
            return Err(e);
        }
        debug!("[db] connection open");
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryConnector;

    fn manager(connector: &MemoryConnector, attempts: u32) -> ConnectionManager {
        ConnectionManager::new(Arc::new(connector.clone()), attempts).with_backoff(Duration::ZERO)
    }

    #[tokio::test]
    async fn first_open_succeeds() {
        let db = MemoryConnector::new();
        manager(&db, 3).acquire().await.unwrap();
        assert_eq!(db.opened(), 1);
    }

    #[tokio::test]
    async fn dead_handle_triggers_one_cycle() {
        let db = MemoryConnector::new();
        db.fail_next_opens(2);
        manager(&db, 3).acquire().await.unwrap();
        // initial + two more inside the cycle
        assert_eq!(db.opened(), 3);
    }

    #[tokio::test]
    async fn failed_ping_is_not_alive() {
        let db = MemoryConnector::new();
        db.fail_next_pings(1);
        manager(&db, 3).acquire().await.unwrap();
        assert_eq!(db.opened(), 2);
        assert_eq!(db.closed(), 1);
    }

    #[tokio::test]
    async fn exhausted_after_configured_attempts() {
        let db = MemoryConnector::new();
        db.fail_next_opens(10);
        let err = manager(&db, 4).acquire().await.err().unwrap();
        assert!(matches!(err, SyncError::ConnectionExhausted { attempts: 4 }));
        assert_eq!(db.opened(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let db = MemoryConnector::new();
        db.fail_next_opens(2);
        let mgr = ConnectionManager::new(Arc::new(db.clone()), 3)
            .with_backoff(Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        mgr.reconnect().await.unwrap();
        // 100ms + 200ms before the third attempt
        let waited = started.elapsed();
        assert!(
            waited >= Duration::from_millis(300) && waited < Duration::from_millis(400),
            "{waited:?}"
        );
    }
}

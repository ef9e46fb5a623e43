//! Sink connection seam and its Postgres implementation.
//!
//! A [`Connection`] is one physical handle used for one logical operation:
//! open, ping, execute some statements, close. Nothing here pools or shares
//! handles; every segment worker opens its own.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection as _;
use tracing::debug;

use scrip_core::config::DatabaseConfig;
use scrip_core::{SqlParam, SyncError, SyncResult};

/// A configured statement together with the logical name it is logged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    pub name: &'static str,
    pub sql: &'a str,
}

impl<'a> Statement<'a> {
    pub fn new(name: &'static str, sql: &'a str) -> Self {
        Self { name, sql }
    }

    pub(crate) fn failed(&self, reason: impl std::fmt::Display) -> SyncError {
        SyncError::Query { statement: self.name.to_string(), reason: reason.to_string() }
    }
}

/// One live sink handle.
#[async_trait]
pub trait Connection: Send {
    /// Liveness check.
    async fn ping(&mut self) -> SyncResult<()>;

    /// Execute `stmt` with positional bind parameters; returns rows affected.
    async fn execute(&mut self, stmt: Statement<'_>, params: &[SqlParam]) -> SyncResult<u64>;

    /// Close the handle. Errors are logged, not returned.
    async fn close(self: Box<Self>);
}

/// Opens fresh [`Connection`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self) -> SyncResult<Box<dyn Connection>>;
}

/// Postgres connector built from the `database` config section.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn new(cfg: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&cfg.server)
            .port(cfg.port)
            .database(&cfg.database)
            .username(&cfg.user)
            .password(&cfg.password)
            .application_name("scrip-sync");
        Self { options, connect_timeout: Duration::from_secs(cfg.connect_timeout_secs) }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn open(&self) -> SyncResult<Box<dyn Connection>> {
        let connect = PgConnection::connect_with(&self.options);
        let conn = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                SyncError::Connection(format!("connect timed out after {:?}", self.connect_timeout))
            })?
            .map_err(|e| SyncError::Connection(e.to_string()))?;
        Ok(Box::new(PgHandle { conn }))
    }
}

struct PgHandle {
    conn: PgConnection,
}

#[async_trait]
impl Connection for PgHandle {
    async fn ping(&mut self) -> SyncResult<()> {
        self.conn.ping().await.map_err(|e| SyncError::Connection(format!("ping: {e}")))
    }

    async fn execute(&mut self, stmt: Statement<'_>, params: &[SqlParam]) -> SyncResult<u64> {
        let mut query = sqlx::query(stmt.sql);
        for param in params {
            query = match param {
                SqlParam::Text(s) => query.bind(s.as_str()),
                SqlParam::Int(n) => query.bind(*n),
            };
        }
        let done = query.execute(&mut self.conn).await.map_err(|e| stmt.failed(e))?;
        Ok(done.rows_affected())
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.close().await {
            debug!("[db] close failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_carries_statement_name() {
        let stmt = Statement::new("eq_insert", "INSERT INTO scrip_master VALUES ($1)");
        let err = stmt.failed("duplicate key");
        assert!(matches!(err, SyncError::Query { ref statement, .. } if statement == "eq_insert"));
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn connector_uses_configured_timeout() {
        let cfg = DatabaseConfig {
            server: "localhost".into(),
            port: 5432,
            database: "scrips".into(),
            user: "sync".into(),
            password: "secret".into(),
            connect_timeout_secs: 7,
        };
        let connector = PgConnector::new(&cfg);
        assert_eq!(connector.connect_timeout, Duration::from_secs(7));
        assert_eq!(connector.options.get_port(), 5432);
        assert_eq!(connector.options.get_database(), Some("scrips"));
    }
}

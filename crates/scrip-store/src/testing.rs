//! In-memory [`Connector`] for tests.
//!
//! Records every executed statement and can be told to fail opens, pings,
//! specific rows (matched on the first bind parameter), or whole statements.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use scrip_core::config::Statements;
use scrip_core::{SqlParam, SyncError, SyncResult};

use crate::database::{Connection, Connector, Statement};

/// Statement set with recognizable SQL for each logical name.
pub fn statements() -> Statements {
    Statements {
        eq_insert: "CALL insert_eq_scrip($1)".into(),
        derv_insert: "CALL insert_derv_scrip($1)".into(),
        backup_proc: "CALL backup_scrip_master()".into(),
        delete_derv_proc: "CALL delete_derv_scrips()".into(),
        delete_eq_proc: "CALL delete_eq_scrips()".into(),
        market_cap_proc: "CALL update_market_cap()".into(),
        stock_id_update: "UPDATE scrip_master SET stock_id = $1 WHERE isin = $2".into(),
    }
}

#[derive(Debug, Default)]
struct State {
    open_failures: u32,
    ping_failures: u32,
    failing_keys: HashSet<String>,
    severing_keys: HashSet<String>,
    failing_statements: HashSet<&'static str>,
    hanging_statements: HashSet<&'static str>,
    rows_per_statement: u64,
    executed: Vec<(&'static str, Vec<SqlParam>)>,
    opened: usize,
    closed: usize,
}

/// Shared handle; clones observe the same state.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(State { rows_per_statement: 1, ..State::default() })) }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_next_opens(&self, n: u32) {
        self.state().open_failures = n;
    }

    pub fn fail_next_pings(&self, n: u32) {
        self.state().ping_failures = n;
    }

    /// Rows whose first parameter equals `key` fail with a query error.
    pub fn fail_row(&self, key: &str) {
        self.state().failing_keys.insert(key.to_string());
    }

    /// Rows whose first parameter equals `key` kill the handle executing them.
    pub fn sever_on_row(&self, key: &str) {
        self.state().severing_keys.insert(key.to_string());
    }

    pub fn fail_statement(&self, name: &'static str) {
        self.state().failing_statements.insert(name);
    }

    /// Executions of `name` never complete, like a sink that stopped answering.
    pub fn hang_statement(&self, name: &'static str) {
        self.state().hanging_statements.insert(name);
    }

    /// Rows affected reported by every successful statement.
    pub fn set_rows_affected(&self, n: u64) {
        self.state().rows_per_statement = n;
    }

    pub fn opened(&self) -> usize {
        self.state().opened
    }

    pub fn closed(&self) -> usize {
        self.state().closed
    }

    /// Names of successfully executed statements, in order.
    pub fn executed(&self) -> Vec<&'static str> {
        self.state().executed.iter().map(|(name, _)| *name).collect()
    }

    /// Bind lists of successful executions of `name`.
    pub fn params_of(&self, name: &str) -> Vec<Vec<SqlParam>> {
        self.state()
            .executed
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self) -> SyncResult<Box<dyn Connection>> {
        let mut state = self.state();
        state.opened += 1;
        if state.open_failures > 0 {
            state.open_failures -= 1;
            return Err(SyncError::Connection("connection refused".into()));
        }
        Ok(Box::new(MemoryHandle { connector: self.clone(), alive: true }))
    }
}

struct MemoryHandle {
    connector: MemoryConnector,
    alive: bool,
}

#[async_trait]
impl Connection for MemoryHandle {
    async fn ping(&mut self) -> SyncResult<()> {
        let mut state = self.connector.state();
        if state.ping_failures > 0 {
            state.ping_failures -= 1;
            return Err(SyncError::Connection("ping: no response".into()));
        }
        if !self.alive {
            return Err(SyncError::Connection("ping: connection reset".into()));
        }
        Ok(())
    }

    async fn execute(&mut self, stmt: Statement<'_>, params: &[SqlParam]) -> SyncResult<u64> {
        if !self.alive {
            return Err(stmt.failed("connection reset"));
        }
        let hangs = self.connector.state().hanging_statements.contains(stmt.name);
        if hangs {
            std::future::pending::<()>().await;
        }
        let mut state = self.connector.state();
        let key = match params.first() {
            Some(SqlParam::Text(s)) => s.clone(),
            Some(SqlParam::Int(n)) => n.to_string(),
            None => String::new(),
        };
        if state.severing_keys.contains(&key) {
            self.alive = false;
            return Err(stmt.failed("connection reset"));
        }
        if state.failing_statements.contains(stmt.name) || state.failing_keys.contains(&key) {
            return Err(stmt.failed("constraint violation"));
        }
        state.executed.push((stmt.name, params.to_vec()));
        Ok(state.rows_per_statement)
    }

    async fn close(self: Box<Self>) {
        self.connector.state().closed += 1;
    }
}

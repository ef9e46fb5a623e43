//! Backup-before-destroy gate.
//!
//! The run's backup state starts `false`. One successful backup procedure
//! flips it to `true` for the rest of the process; nothing flips it back.
//! Every delete checks the flag first and is a no-op while it is `false`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use scrip_core::SyncResult;
use scrip_core::config::Statements;

use crate::connection::ConnectionManager;
use crate::database::Statement;

/// Which half of the scrip master a delete procedure clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteKind {
    Equity,
    Derivative,
}

impl DeleteKind {
    /// Run order for the pre-load deletes.
    pub const ALL: [DeleteKind; 2] = [DeleteKind::Equity, DeleteKind::Derivative];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No backup in this run; the sink was not touched.
    Skipped,
    Deleted(u64),
}

pub struct BackupCoordinator {
    manager: Arc<ConnectionManager>,
    statements: Arc<Statements>,
    backed_up: AtomicBool,
}

impl BackupCoordinator {
    pub fn new(manager: Arc<ConnectionManager>, statements: Arc<Statements>) -> Self {
        Self { manager, statements, backed_up: AtomicBool::new(false) }
    }

    pub fn is_backed_up(&self) -> bool {
        self.backed_up.load(Ordering::Acquire)
    }

    /// Run the backup procedure once. Returns the resulting backup state.
    ///
    /// A failure is logged and leaves the state unchanged.
    pub async fn backup(&self) -> bool {
        if self.is_backed_up() {
            return true;
        }
        let stmt = Statement::new("backup_proc", &self.statements.backup_proc);
        match self.run(stmt).await {
            Ok(_) => {
                self.backed_up.store(true, Ordering::Release);
                info!("[backup] snapshot taken, deletes enabled");
                true
            }
            Err(e) => {
                error!(
                    statement = stmt.name,
                    "[backup] failed, deletes disabled for this run: {e}"
                );
                false
            }
        }
    }

    /// Clear one half of the table, if a backup exists.
    pub async fn delete(&self, kind: DeleteKind) -> SyncResult<DeleteOutcome> {
        if !self.is_backed_up() {
            warn!(?kind, "[backup] no backup in this run, delete skipped");
            return Ok(DeleteOutcome::Skipped);
        }
        let stmt = match kind {
            DeleteKind::Equity => Statement::new("delete_eq_proc", &self.statements.delete_eq_proc),
            DeleteKind::Derivative => {
                Statement::new("delete_derv_proc", &self.statements.delete_derv_proc)
            }
        };
        let rows = self.run(stmt).await?;
        info!(?kind, rows, "[backup] delete done");
        Ok(DeleteOutcome::Deleted(rows))
    }

    async fn run(&self, stmt: Statement<'_>) -> SyncResult<u64> {
        let mut conn = self.manager.acquire().await?;
        let result = conn.execute(stmt, &[]).await;
        conn.close().await;
        result
    }
}

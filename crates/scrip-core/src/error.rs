//! Typed error definitions for the scrip master synchronizer.
//!
//! Provides [`SyncError`] for the failures a run can hit, ordered roughly by
//! how far they propagate. All variants implement `std::error::Error` via
//! `thiserror`, so they integrate with `anyhow::Result` at the binary edge.
//!
//! | Variant                 | Scope                                   |
//! |-------------------------|-----------------------------------------|
//! | `Config`                | fatal, raised before any network I/O    |
//! | `Auth`                  | fatal, run aborts                       |
//! | `Fetch`                 | fails one segment                       |
//! | `Decode`                | envelope could not be read              |
//! | `Connection[Exhausted]` | fails the operation holding the handle  |
//! | `Query`                 | one statement, logged and skipped       |
//! | `Enrichment`            | logged, never changes the exit status   |
//! | `Cancelled`             | shutdown signal or run deadline reached |
//! | `Timeout`               | fatal, run outlived its hard limit      |
//! | `Task`                  | a segment task panicked or was aborted  |

use thiserror::Error;

/// Domain-specific errors for a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Login was rejected or could not be completed.
    #[error("authentication failed: {code} {message}")]
    Auth { code: String, message: String },

    /// A page request failed or returned a non-success envelope.
    #[error("fetch failed for segment {segment} page {page}: {reason}")]
    Fetch { segment: String, page: String, reason: String },

    /// An upstream envelope did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Opening or pinging a sink connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Every reconnect attempt failed its liveness check.
    #[error("connection exhausted after {attempts} reconnect attempt(s)")]
    ConnectionExhausted { attempts: u32 },

    /// A single statement failed to execute.
    #[error("query `{statement}` failed: {reason}")]
    Query { statement: String, reason: String },

    /// A post-load enrichment job failed.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// The run was cancelled before the operation finished.
    #[error("cancelled")]
    Cancelled,

    /// The run did not wind down within its hard time limit.
    #[error("run exceeded its {secs}s time limit")]
    Timeout { secs: u64 },

    /// A spawned segment task panicked or was aborted.
    #[error("segment task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Whether this error should end the whole run rather than one task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth { .. } | Self::Timeout { .. })
    }
}

/// Convenience alias used by component contracts.
pub type SyncResult<T> = Result<T, SyncError>;

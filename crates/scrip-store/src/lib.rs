//! # scrip-store
//!
//! Sink side of the synchronizer.
//!
//! ## Architecture
//!
//! ```text
//! Connector (PgConnector | MemoryConnector)
//!     └── ConnectionManager      open + ping, bounded reconnect
//!           ├── BackupCoordinator   backup flag, gated deletes
//!           ├── StorageLoader       one insert per row, per segment
//!           └── EnrichmentJobs      market cap, stock-id reconciliation
//! ```
//!
//! Every component acquires its own connection per operation and closes it
//! when done; concurrent segment loaders never share a handle. Statements
//! come from configuration by logical name and are executed with bound
//! parameters only.

pub mod backup;
pub mod connection;
pub mod database;
pub mod enrichment;
pub mod loader;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use backup::{BackupCoordinator, DeleteKind, DeleteOutcome};
pub use connection::ConnectionManager;
pub use database::{Connection, Connector, PgConnector, Statement};
pub use enrichment::{EnrichmentJobs, EnrichmentReport, StockIdReport};
pub use loader::{LoadReport, StorageLoader};

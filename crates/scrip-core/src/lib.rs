//! # scrip-core
//!
//! Core crate for the scrip master synchronizer, providing:
//!
//! - **Types** (`types`): segments, raw upstream records, normalized instrument rows
//! - **Configuration** (`config`): JSON config deserialization and validation
//! - **Error types** (`error`): the run's `SyncError` taxonomy via thiserror
//! - **Formatting** (`format`): divider/precision selection and money scaling
//! - **Time utilities** (`time_util`): epoch clock and date rendering
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod time_util;
pub mod types;

pub use error::{SyncError, SyncResult};
// Re-export types at crate root for convenience.
pub use types::*;

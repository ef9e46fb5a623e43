//! Domain types shared by the feed, transform, and store crates.

pub mod instrument;
pub mod record;
pub mod segment;
pub mod sql;

pub use instrument::*;
pub use record::*;
pub use segment::*;
pub use sql::*;

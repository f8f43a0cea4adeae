//! Storage layer.
//!
//! Two backends implement [`LedgerStore`]:
//! - [`SqliteLedgerStore`]: the durable single-file store used by the binary
//! - [`MemoryLedgerStore`]: a non-persistent store for tests and embedding

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod memory;
pub mod sqlite;
mod traits;

pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;
pub use traits::LedgerStore;

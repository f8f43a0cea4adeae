//! `SQLite` ledger backend.
//!
//! ## Module Structure
//!
//! - [`connection`]: lock acquisition, pragma configuration, error mapping
//! - [`schema`]: table definitions, immutability triggers, schema version
//! - [`rows`]: row conversion between `SQLite` and ledger models
//! - [`ledger`]: the [`SqliteLedgerStore`] itself

mod connection;
mod ledger;
mod rows;
mod schema;

pub use connection::{BUSY_TIMEOUT_MS, acquire_lock, configure_connection};
pub use ledger::SqliteLedgerStore;
pub use schema::SCHEMA_VERSION;

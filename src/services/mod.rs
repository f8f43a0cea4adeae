//! Ledger services.
//!
//! Services sit on top of a [`crate::storage::LedgerStore`] and provide the
//! high-level operations: reference resolution, diffs, status, and the
//! [`PromptLedger`] handle that ties them together.

pub mod demo;
pub mod diff;
mod ledger;
pub mod resolver;
pub mod status;

pub use demo::seed_demo;
pub use diff::{DiffEngine, diff_content, diff_lines, diff_metadata};
pub use ledger::PromptLedger;
pub use resolver::resolve;
pub use status::{PromptStatus, StatusSummary};

//! Status summary of the whole ledger.

use crate::Result;
use crate::storage::LedgerStore;
use serde::{Deserialize, Serialize};

pub use crate::models::PromptStatus;

/// Status of every known prompt, ordered by prompt id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// One entry per prompt.
    pub prompts: Vec<PromptStatus>,
}

impl StatusSummary {
    /// Returns true if the ledger holds no prompts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Looks up the entry of one prompt.
    #[must_use]
    pub fn get(&self, prompt_id: &str) -> Option<&PromptStatus> {
        self.prompts.iter().find(|p| p.prompt_id == prompt_id)
    }
}

/// Builds the status summary.
///
/// Every prompt's latest version and labels come from one store snapshot, so
/// a label never points past the latest version it is reported with.
///
/// # Errors
///
/// Returns an error if the storage cannot be accessed.
pub fn status(store: &dyn LedgerStore) -> Result<StatusSummary> {
    let prompts = store.status_snapshot()?;
    tracing::debug!(prompts = prompts.len(), "built status summary");
    Ok(StatusSummary { prompts })
}

//! Ledger storage trait definition.

use crate::Result;
use crate::models::{LabelKey, LabelMove, LabelView, NewVersion, PromptStatus, PromptVersion};
use std::collections::{BTreeMap, BTreeSet};

/// Trait for ledger storage backends.
///
/// A backend owns two things: the append-only version ledger keyed by
/// `(prompt_id, version)`, and the label registry (a move log plus the
/// current-pointer table derived from it).
///
/// Implementations must make "compute next version" and "insert" one atomic
/// step, and must apply a label move and its log entry together.
pub trait LedgerStore: Send + Sync {
    /// Appends a new version of a prompt.
    ///
    /// The version number is one past the highest existing version for
    /// `prompt_id`, or 1 for a new prompt. `input.env` is ignored here; use
    /// [`LedgerStore::append_labeled`] to set an initial label atomically.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for a rejected id or input,
    /// [`crate::Error::Conflict`] if another writer claimed the same version
    /// number, or [`crate::Error::OperationFailed`] if the write fails.
    fn append(&self, prompt_id: &str, input: &NewVersion) -> Result<PromptVersion>;

    /// Appends a new version and points `label` at it in the same transaction.
    ///
    /// # Errors
    ///
    /// Same as [`LedgerStore::append`], plus [`crate::Error::InvalidInput`]
    /// for a rejected label name.
    fn append_labeled(
        &self,
        prompt_id: &str,
        input: &NewVersion,
        label: &str,
        actor: Option<&str>,
    ) -> Result<(PromptVersion, LabelMove)>;

    /// Gets one version.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the version does not exist.
    fn get(&self, prompt_id: &str, version: u32) -> Result<PromptVersion>;

    /// Returns true if the version exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn version_exists(&self, prompt_id: &str, version: u32) -> Result<bool>;

    /// Returns the highest version of a prompt, `None` if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn latest_version(&self, prompt_id: &str) -> Result<Option<u32>>;

    /// Lists every version of a prompt in ascending version order.
    ///
    /// Unknown prompt ids yield an empty list. Each call reads a fresh,
    /// consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn list_versions(&self, prompt_id: &str) -> Result<Vec<PromptVersion>>;

    /// Lists all known prompt ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn list_ids(&self) -> Result<BTreeSet<String>>;

    /// Points a label at an existing version and logs the move.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the version does not exist,
    /// [`crate::Error::InvalidInput`] for a rejected label name, or
    /// [`crate::Error::OperationFailed`] if the write fails.
    fn set_label(
        &self,
        prompt_id: &str,
        version: u32,
        label: &str,
        actor: Option<&str>,
    ) -> Result<LabelMove>;

    /// Returns the version a label points at.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the label was never set.
    fn get_label(&self, prompt_id: &str, label: &str) -> Result<u32>;

    /// Returns the current label-to-version mapping of one prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn labels_for(&self, prompt_id: &str) -> Result<BTreeMap<String, u32>>;

    /// Returns the label move log, oldest first, optionally for one prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn label_history(&self, prompt_id: Option<&str>) -> Result<Vec<LabelMove>>;

    /// Returns the materialized current-pointer table.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn label_view(&self) -> Result<LabelView>;

    /// Returns the status of every prompt, ordered by prompt id.
    ///
    /// Latest versions and labels are read from one consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn status_snapshot(&self) -> Result<Vec<PromptStatus>>;

    /// Rebuilds the current-pointer table by replaying the move log.
    ///
    /// Returns the number of labels in the rebuilt table.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn rebuild_labels(&self) -> Result<usize>;

    /// Flushes buffered writes to durable storage.
    ///
    /// Called when a ledger handle is closed. Backends without buffering
    /// keep the default no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn checkpoint(&self) -> Result<()> {
        Ok(())
    }

    /// Lists labels whose stored pointer disagrees with the replayed move log.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn verify_labels(&self) -> Result<Vec<LabelKey>> {
        let replayed = LabelView::replay(&self.label_history(None)?);
        Ok(self.label_view()?.divergence(&replayed))
    }
}

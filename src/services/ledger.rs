//! The ledger handle.
//!
//! [`PromptLedger`] is the explicitly constructed entry point to the ledger.
//! It owns a [`LedgerStore`] and routes every request through the resolver,
//! the diff engine and the status service. No global state is involved: each
//! handle is independent, and several handles may share one database file.

use crate::models::{
    DiffMode, DiffResult, LabelKey, LabelMove, NewVersion, PromptVersion, VersionRef,
};
use crate::services::diff::DiffEngine;
use crate::services::resolver::resolve;
use crate::services::status::{StatusSummary, status};
use crate::storage::{LedgerStore, MemoryLedgerStore, SqliteLedgerStore};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle to one prompt ledger.
#[derive(Clone)]
pub struct PromptLedger {
    store: Arc<dyn LedgerStore>,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for PromptLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptLedger")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl PromptLedger {
    /// Creates the database (and its directory) if needed and opens it.
    ///
    /// Calling `init` on an existing ledger is a no-op apart from opening it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the directory or the schema
    /// cannot be created.
    pub fn init(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let store = SqliteLedgerStore::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "initialized prompt ledger");
        Ok(Self {
            store: Arc::new(store),
            db_path: Some(db_path),
        })
    }

    /// Opens an existing ledger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no database exists at `db_path`, or
    /// [`Error::OperationFailed`] if it cannot be opened.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if !db_path.exists() {
            return Err(Error::NotFound(format!(
                "no ledger at {} (run `promptledger init` first)",
                db_path.display()
            )));
        }
        let store = SqliteLedgerStore::open(&db_path)?;
        Ok(Self {
            store: Arc::new(store),
            db_path: Some(db_path),
        })
    }

    /// Opens a fresh ledger backed by an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_store(Arc::new(SqliteLedgerStore::in_memory()?)))
    }

    /// Opens a fresh ledger backed by [`MemoryLedgerStore`].
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::with_store(Arc::new(MemoryLedgerStore::new()))
    }

    /// Wraps an existing store.
    #[must_use]
    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            db_path: None,
        }
    }

    /// Returns the database path, `None` for in-memory ledgers.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// Flushes pending writes and releases this handle.
    ///
    /// The connection itself closes once the last clone of the handle is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn close(self) -> Result<()> {
        self.store.checkpoint()?;
        tracing::debug!(path = ?self.db_path, "closed prompt ledger");
        Ok(())
    }

    /// Records a new version of a prompt.
    ///
    /// When `input.env` is set, the label of that name is pointed at the new
    /// version in the same transaction. A write that loses a race for the
    /// version number is retried once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a rejected id, content, metric or
    /// label, [`Error::Conflict`] if the retry also loses, or a storage error.
    pub fn add(&self, prompt_id: &str, input: NewVersion) -> Result<PromptVersion> {
        match self.append_once(prompt_id, &input) {
            Err(Error::Conflict(cause)) => {
                tracing::warn!(prompt_id, %cause, "version conflict, retrying append");
                self.append_once(prompt_id, &input)
            },
            other => other,
        }
    }

    fn append_once(&self, prompt_id: &str, input: &NewVersion) -> Result<PromptVersion> {
        match input.env.as_deref() {
            Some(env) => self
                .store
                .append_labeled(prompt_id, input, env, input.actor.as_deref())
                .map(|(version, _)| version),
            None => self.store.append(prompt_id, input),
        }
    }

    /// Points a label at an existing version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the version does not exist or
    /// [`Error::InvalidInput`] for a rejected label name.
    pub fn set_label(&self, prompt_id: &str, version: u32, label: &str) -> Result<LabelMove> {
        self.store.set_label(prompt_id, version, label, None)
    }

    /// Points a label at an existing version, recording who moved it.
    ///
    /// # Errors
    ///
    /// Same as [`PromptLedger::set_label`].
    pub fn set_label_as(
        &self,
        prompt_id: &str,
        version: u32,
        label: &str,
        actor: &str,
    ) -> Result<LabelMove> {
        self.store.set_label(prompt_id, version, label, Some(actor))
    }

    /// Resolves a reference and returns that version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the reference does not resolve.
    pub fn get(&self, prompt_id: &str, reference: &VersionRef) -> Result<PromptVersion> {
        let version = resolve(self.store(), prompt_id, reference)?;
        self.store.get(prompt_id, version)
    }

    /// Resolves a reference to its version number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the reference does not resolve.
    pub fn resolve(&self, prompt_id: &str, reference: &VersionRef) -> Result<u32> {
        resolve(self.store(), prompt_id, reference)
    }

    /// Returns the version a label points at.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the label was never set.
    pub fn get_label(&self, prompt_id: &str, label: &str) -> Result<u32> {
        self.store.get_label(prompt_id, label)
    }

    /// Returns the current labels of a prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn labels_for(&self, prompt_id: &str) -> Result<BTreeMap<String, u32>> {
        self.store.labels_for(prompt_id)
    }

    /// Returns every version of a prompt, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn history(&self, prompt_id: &str) -> Result<Vec<PromptVersion>> {
        self.store.list_versions(prompt_id)
    }

    /// Diffs two references of one prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if either reference does not resolve.
    pub fn diff(
        &self,
        prompt_id: &str,
        from: &VersionRef,
        to: &VersionRef,
        mode: DiffMode,
    ) -> Result<DiffResult> {
        DiffEngine::new(self.store()).diff(prompt_id, from, to, mode)
    }

    /// Summarizes every prompt in the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn status(&self) -> Result<StatusSummary> {
        status(self.store())
    }

    /// Returns the label move log, optionally for one prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn label_history(&self, prompt_id: Option<&str>) -> Result<Vec<LabelMove>> {
        self.store.label_history(prompt_id)
    }

    /// Lists all prompt ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn list_ids(&self) -> Result<BTreeSet<String>> {
        self.store.list_ids()
    }

    /// Rebuilds the label table from the move log.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn rebuild_labels(&self) -> Result<usize> {
        self.store.rebuild_labels()
    }

    /// Lists labels whose table entry disagrees with the move log.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    pub fn verify_labels(&self) -> Result<Vec<LabelKey>> {
        self.store.verify_labels()
    }
}

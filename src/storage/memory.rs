//! In-memory ledger backend.
//!
//! Provides a non-persistent implementation of [`LedgerStore`] for unit tests
//! and for embedding the ledger without a database file.

use crate::models::{
    LabelMove, LabelView, NewVersion, PromptStatus, PromptVersion, validate_label_name,
    validate_prompt_id,
};
use crate::storage::LedgerStore;
use crate::storage::sqlite::acquire_lock;
use crate::{Error, Result, current_timestamp};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct LedgerState {
    /// Versions per prompt id; index `i` holds version `i + 1`.
    versions: BTreeMap<String, Vec<PromptVersion>>,
    moves: Vec<LabelMove>,
    labels: LabelView,
}

impl LedgerState {
    fn insert_version(&mut self, prompt_id: &str, input: &NewVersion) -> Result<PromptVersion> {
        let history = self.versions.entry(prompt_id.to_string()).or_default();
        let version = u32::try_from(history.len() + 1)
            .map_err(|_| Error::operation("append_version", "version counter overflow"))?;
        let record = input
            .clone()
            .into_version(prompt_id, version, current_timestamp());
        history.push(record.clone());
        Ok(record)
    }

    fn contains(&self, prompt_id: &str, version: u32) -> bool {
        self.versions
            .get(prompt_id)
            .is_some_and(|h| version >= 1 && (version as usize) <= h.len())
    }

    fn move_label(
        &mut self,
        prompt_id: &str,
        version: u32,
        label: &str,
        actor: Option<&str>,
    ) -> Result<LabelMove> {
        if !self.contains(prompt_id, version) {
            return Err(Error::NotFound(format!(
                "prompt '{prompt_id}' version {version}"
            )));
        }

        let id = self.moves.last().map_or(1, |m| m.id + 1);
        let mv = LabelMove {
            id,
            prompt_id: prompt_id.to_string(),
            label: label.to_string(),
            from_version: self.labels.get(prompt_id, label),
            to_version: version,
            moved_at: current_timestamp(),
            actor: actor.map(str::to_string),
        };
        self.labels.apply(&mv);
        self.moves.push(mv.clone());
        Ok(mv)
    }
}

/// In-memory ledger backend.
///
/// All state sits behind one mutex, so every operation observes and produces
/// a consistent snapshot. Data is not persisted between runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl MemoryLedgerStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of versions across all prompts.
    #[must_use]
    pub fn version_count(&self) -> usize {
        acquire_lock(&self.state).versions.values().map(Vec::len).sum()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append(&self, prompt_id: &str, input: &NewVersion) -> Result<PromptVersion> {
        validate_prompt_id(prompt_id)?;
        input.validate()?;

        let version =
            acquire_lock(&self.state).insert_version(prompt_id, &input.applied_env(None))?;
        metrics::counter!("promptledger_versions_appended_total").increment(1);
        tracing::debug!(prompt_id, version = version.version, "appended prompt version");
        Ok(version)
    }

    fn append_labeled(
        &self,
        prompt_id: &str,
        input: &NewVersion,
        label: &str,
        actor: Option<&str>,
    ) -> Result<(PromptVersion, LabelMove)> {
        validate_prompt_id(prompt_id)?;
        input.validate()?;
        validate_label_name(label)?;

        let mut state = acquire_lock(&self.state);
        let version = state.insert_version(prompt_id, &input.applied_env(Some(label)))?;
        let mv = state.move_label(prompt_id, version.version, label, actor)?;
        drop(state);

        metrics::counter!("promptledger_versions_appended_total").increment(1);
        metrics::counter!("promptledger_label_moves_total").increment(1);
        Ok((version, mv))
    }

    fn get(&self, prompt_id: &str, version: u32) -> Result<PromptVersion> {
        validate_prompt_id(prompt_id)?;
        let state = acquire_lock(&self.state);
        version
            .checked_sub(1)
            .and_then(|idx| state.versions.get(prompt_id)?.get(idx as usize))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("prompt '{prompt_id}' version {version}")))
    }

    fn version_exists(&self, prompt_id: &str, version: u32) -> Result<bool> {
        Ok(acquire_lock(&self.state).contains(prompt_id, version))
    }

    fn latest_version(&self, prompt_id: &str) -> Result<Option<u32>> {
        Ok(acquire_lock(&self.state)
            .versions
            .get(prompt_id)
            .and_then(|h| h.last())
            .map(|v| v.version))
    }

    fn list_versions(&self, prompt_id: &str) -> Result<Vec<PromptVersion>> {
        validate_prompt_id(prompt_id)?;
        Ok(acquire_lock(&self.state)
            .versions
            .get(prompt_id)
            .cloned()
            .unwrap_or_default())
    }

    fn list_ids(&self) -> Result<BTreeSet<String>> {
        Ok(acquire_lock(&self.state).versions.keys().cloned().collect())
    }

    fn set_label(
        &self,
        prompt_id: &str,
        version: u32,
        label: &str,
        actor: Option<&str>,
    ) -> Result<LabelMove> {
        validate_prompt_id(prompt_id)?;
        validate_label_name(label)?;

        let mv = acquire_lock(&self.state).move_label(prompt_id, version, label, actor)?;
        metrics::counter!("promptledger_label_moves_total").increment(1);
        tracing::debug!(prompt_id, label, to = version, "moved label");
        Ok(mv)
    }

    fn get_label(&self, prompt_id: &str, label: &str) -> Result<u32> {
        acquire_lock(&self.state)
            .labels
            .get(prompt_id, label)
            .ok_or_else(|| Error::NotFound(format!("label '{label}' for prompt '{prompt_id}'")))
    }

    fn labels_for(&self, prompt_id: &str) -> Result<BTreeMap<String, u32>> {
        Ok(acquire_lock(&self.state).labels.labels_for(prompt_id))
    }

    fn label_history(&self, prompt_id: Option<&str>) -> Result<Vec<LabelMove>> {
        Ok(acquire_lock(&self.state)
            .moves
            .iter()
            .filter(|m| prompt_id.is_none_or(|p| m.prompt_id == p))
            .cloned()
            .collect())
    }

    fn label_view(&self) -> Result<LabelView> {
        Ok(acquire_lock(&self.state).labels.clone())
    }

    fn status_snapshot(&self) -> Result<Vec<PromptStatus>> {
        let state = acquire_lock(&self.state);
        Ok(state
            .versions
            .iter()
            .filter_map(|(prompt_id, history)| {
                let latest = history.last()?;
                Some(PromptStatus {
                    prompt_id: prompt_id.clone(),
                    latest_version: latest.version,
                    version_count: history.len(),
                    labels: state.labels.labels_for(prompt_id),
                })
            })
            .collect())
    }

    fn rebuild_labels(&self) -> Result<usize> {
        let mut state = acquire_lock(&self.state);
        state.labels = LabelView::replay(&state.moves);
        Ok(state.labels.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_and_get() {
        let store = MemoryLedgerStore::new();
        let v1 = store.append("p", &NewVersion::new("one")).unwrap();
        let v2 = store.append("p", &NewVersion::new("two")).unwrap();

        assert_eq!((v1.version, v2.version), (1, 2));
        assert_eq!(store.get("p", 2).unwrap(), v2);
        assert!(matches!(store.get("p", 0), Err(Error::NotFound(_))));
        assert!(matches!(store.get("p", 3), Err(Error::NotFound(_))));
        assert_eq!(store.version_count(), 2);
    }

    #[test]
    fn test_labels_follow_moves() {
        let store = MemoryLedgerStore::new();
        store.append("p", &NewVersion::new("one")).unwrap();
        store.append("p", &NewVersion::new("two")).unwrap();

        store.set_label("p", 1, "prod", None).unwrap();
        let mv = store.set_label("p", 2, "prod", Some("bob")).unwrap();

        assert_eq!(mv.id, 2);
        assert_eq!(mv.from_version, Some(1));
        assert_eq!(store.get_label("p", "prod").unwrap(), 2);
        assert!(store.verify_labels().unwrap().is_empty());
        assert!(matches!(
            store.set_label("p", 3, "prod", None),
            Err(Error::NotFound(_))
        ));
        assert_eq!(store.label_history(Some("p")).unwrap().len(), 2);
        assert!(store.label_history(Some("q")).unwrap().is_empty());
    }

    #[test]
    fn test_status_snapshot() {
        let store = MemoryLedgerStore::new();
        store.append("b", &NewVersion::new("one")).unwrap();
        store.append("a", &NewVersion::new("one")).unwrap();
        store
            .append_labeled("a", &NewVersion::new("two"), "dev", None)
            .unwrap();

        let snapshot = store.status_snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].prompt_id, "a");
        assert_eq!(snapshot[0].latest_version, 2);
        assert_eq!(snapshot[0].version_count, 2);
        assert_eq!(snapshot[0].labels.get("dev"), Some(&2));
        assert!(snapshot[1].labels.is_empty());
    }

    #[test]
    fn test_rebuild_labels() {
        let store = MemoryLedgerStore::new();
        store
            .append_labeled("p", &NewVersion::new("one"), "dev", None)
            .unwrap();
        store
            .append_labeled("q", &NewVersion::new("one"), "dev", None)
            .unwrap();

        assert_eq!(store.rebuild_labels().unwrap(), 2);
        assert_eq!(store.get_label("q", "dev").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_appends_are_gapless() {
        let store = Arc::new(MemoryLedgerStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..10 {
                        store
                            .append("shared", &NewVersion::new(format!("{i}-{j}")))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let numbers: Vec<u32> = store
            .list_versions("shared")
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, (1..=80).collect::<Vec<_>>());
    }
}

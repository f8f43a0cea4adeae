//! Labels and the label move log.
//!
//! The move log is the source of truth. The current pointer of every label is
//! derived from it: the `to_version` of the latest move for that
//! `(prompt_id, label)` pair. [`LabelView`] performs that derivation in memory
//! and is what storage backends use to rebuild or check their pointer tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current state of one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Prompt identifier.
    pub prompt_id: String,
    /// Label name.
    pub name: String,
    /// Version the label points at.
    pub current_version: u32,
    /// Time of the move that set the current pointer.
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one label move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMove {
    /// Position in the move log. Strictly increasing in append order.
    pub id: i64,
    /// Prompt identifier.
    pub prompt_id: String,
    /// Label name.
    pub label: String,
    /// Previous pointer, `None` for the first move of a label.
    pub from_version: Option<u32>,
    /// New pointer.
    pub to_version: u32,
    /// When the move happened.
    pub moved_at: DateTime<Utc>,
    /// Who moved it, if known.
    pub actor: Option<String>,
}

/// Key of the label table.
pub type LabelKey = (String, String);

/// Current-pointer view derived by replaying label moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelView {
    labels: BTreeMap<LabelKey, Label>,
}

impl LabelView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays a move log, oldest first, into a view.
    #[must_use]
    pub fn replay<'a, I>(moves: I) -> Self
    where
        I: IntoIterator<Item = &'a LabelMove>,
    {
        let mut view = Self::new();
        for mv in moves {
            view.apply(mv);
        }
        view
    }

    /// Applies one move on top of the view.
    pub fn apply(&mut self, mv: &LabelMove) {
        self.labels.insert(
            (mv.prompt_id.clone(), mv.label.clone()),
            Label {
                prompt_id: mv.prompt_id.clone(),
                name: mv.label.clone(),
                current_version: mv.to_version,
                updated_at: mv.moved_at,
            },
        );
    }

    /// Returns the version a label points at.
    #[must_use]
    pub fn get(&self, prompt_id: &str, label: &str) -> Option<u32> {
        self.labels
            .get(&(prompt_id.to_string(), label.to_string()))
            .map(|l| l.current_version)
    }

    /// Returns the label-to-version mapping for one prompt.
    #[must_use]
    pub fn labels_for(&self, prompt_id: &str) -> BTreeMap<String, u32> {
        self.labels
            .values()
            .filter(|l| l.prompt_id == prompt_id)
            .map(|l| (l.name.clone(), l.current_version))
            .collect()
    }

    /// Iterates over every label in `(prompt_id, name)` order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    /// Number of labels in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if no label has ever been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Lists the keys whose pointer differs between two views.
    #[must_use]
    pub fn divergence(&self, other: &Self) -> Vec<LabelKey> {
        let mut keys: Vec<LabelKey> = self
            .labels
            .keys()
            .chain(other.labels.keys())
            .filter(|k| {
                self.labels.get(*k).map(|l| l.current_version)
                    != other.labels.get(*k).map(|l| l.current_version)
            })
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl FromIterator<Label> for LabelView {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|l| ((l.prompt_id.clone(), l.name.clone()), l))
                .collect(),
        }
    }
}

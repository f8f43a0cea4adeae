//! Structured diff results.
//!
//! These types describe what changed between two versions. Turning them into
//! text is left to presentation code (see [`crate::cli::render`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::{Error, Result};

/// Which aspect of two versions to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Line-level comparison of the prompt bodies.
    #[default]
    Content,
    /// Field-level comparison of reason, author, tags and metrics.
    Metadata,
}

impl DiffMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Metadata => "metadata",
        }
    }
}

impl FromStr for DiffMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "metadata" | "meta" => Ok(Self::Metadata),
            other => Err(Error::InvalidInput(format!(
                "unknown diff mode '{other}', expected 'content' or 'metadata'"
            ))),
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing two versions of one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiffResult {
    /// Content comparison.
    Content(ContentDiff),
    /// Metadata comparison.
    Metadata(MetadataDiff),
}

impl DiffResult {
    /// Returns true if the two sides are equivalent in the compared aspect.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Content(diff) => diff.is_empty(),
            Self::Metadata(diff) => diff.is_empty(),
        }
    }

    /// Returns the mode that produced this result.
    #[must_use]
    pub const fn mode(&self) -> DiffMode {
        match self {
            Self::Content(_) => DiffMode::Content,
            Self::Metadata(_) => DiffMode::Metadata,
        }
    }

    /// Returns `(from_version, to_version)`.
    #[must_use]
    pub const fn versions(&self) -> (u32, u32) {
        match self {
            Self::Content(d) => (d.from_version, d.to_version),
            Self::Metadata(d) => (d.from_version, d.to_version),
        }
    }

    /// Returns the content diff, if this is one.
    #[must_use]
    pub const fn as_content(&self) -> Option<&ContentDiff> {
        match self {
            Self::Content(d) => Some(d),
            Self::Metadata(_) => None,
        }
    }

    /// Returns the metadata diff, if this is one.
    #[must_use]
    pub const fn as_metadata(&self) -> Option<&MetadataDiff> {
        match self {
            Self::Metadata(d) => Some(d),
            Self::Content(_) => None,
        }
    }
}

/// Tag on a run of diff lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunkKind {
    /// Lines present on both sides.
    Unchanged,
    /// Lines only in the newer side.
    Added,
    /// Lines only in the older side.
    Removed,
}

/// A maximal run of lines sharing one [`HunkKind`].
///
/// Ranges are 0-based and half-open. An `Added` hunk has an empty `old_range`
/// positioned where the lines were inserted; a `Removed` hunk has an empty
/// `new_range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// Kind of change.
    pub kind: HunkKind,
    /// Line range in the older body.
    pub old_range: Range<usize>,
    /// Line range in the newer body.
    pub new_range: Range<usize>,
    /// The lines of this hunk, without line terminators.
    pub lines: Vec<String>,
}

/// Line counts of a content diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Lines only in the newer body.
    pub added: usize,
    /// Lines only in the older body.
    pub removed: usize,
    /// Lines on both sides.
    pub unchanged: usize,
}

/// Line-level diff of two prompt bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDiff {
    /// Older version.
    pub from_version: u32,
    /// Newer version.
    pub to_version: u32,
    /// Ordered hunks; empty when the bodies are identical.
    pub hunks: Vec<DiffHunk>,
}

impl ContentDiff {
    /// Returns true if the bodies are identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hunks.iter().all(|h| h.kind == HunkKind::Unchanged)
    }

    /// Counts lines per kind.
    #[must_use]
    pub fn stats(&self) -> DiffStats {
        self.hunks.iter().fold(DiffStats::default(), |mut acc, h| {
            match h.kind {
                HunkKind::Added => acc.added += h.lines.len(),
                HunkKind::Removed => acc.removed += h.lines.len(),
                HunkKind::Unchanged => acc.unchanged += h.lines.len(),
            }
            acc
        })
    }
}

/// Comparison of one scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldChange {
    /// Same value on both sides.
    Unchanged {
        /// The shared value.
        value: String,
    },
    /// Value differs.
    Changed {
        /// Older value.
        old: String,
        /// Newer value.
        new: String,
    },
}

impl FieldChange {
    /// Compares two values.
    #[must_use]
    pub fn compare(old: &str, new: &str) -> Self {
        if old == new {
            Self::Unchanged {
                value: old.to_string(),
            }
        } else {
            Self::Changed {
                old: old.to_string(),
                new: new.to_string(),
            }
        }
    }

    /// Returns true for [`FieldChange::Changed`].
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Set difference of two tag sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDiff {
    /// Tags only in the newer version.
    pub added: BTreeSet<String>,
    /// Tags only in the older version.
    pub removed: BTreeSet<String>,
}

impl TagDiff {
    /// Returns true if both tag sets are equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Comparison of one metric key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricChange {
    /// Only in the newer version.
    Added {
        /// Newer value.
        value: f64,
    },
    /// Only in the older version.
    Removed {
        /// Older value.
        value: f64,
    },
    /// On both sides.
    Delta {
        /// Older value.
        old: f64,
        /// Newer value.
        new: f64,
        /// `new - old`.
        delta: f64,
    },
}

impl MetricChange {
    /// Returns true unless this is a zero delta.
    #[must_use]
    pub fn is_change(&self) -> bool {
        match self {
            Self::Added { .. } | Self::Removed { .. } => true,
            Self::Delta { delta, .. } => *delta != 0.0,
        }
    }
}

/// Field-level diff of two versions' metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDiff {
    /// Older version.
    pub from_version: u32,
    /// Newer version.
    pub to_version: u32,
    /// Reason comparison.
    pub reason: FieldChange,
    /// Author comparison.
    pub author: FieldChange,
    /// Tag set difference.
    pub tags: TagDiff,
    /// Per-key metric comparison; keys absent on both sides never appear.
    pub metrics: BTreeMap<String, MetricChange>,
}

impl MetadataDiff {
    /// Returns true if no field differs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.reason.is_changed()
            && !self.author.is_changed()
            && self.tags.is_empty()
            && !self.metrics.values().any(MetricChange::is_change)
    }
}

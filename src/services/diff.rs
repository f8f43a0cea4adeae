//! Diff engine.
//!
//! Content diffs are line-level and computed from a longest-common-subsequence
//! table. The walk over the table is deterministic: on a tie between dropping
//! a line of the older body and taking a line of the newer body, the removal
//! is emitted first. Consecutive lines of one kind are merged into a single
//! [`DiffHunk`].
//!
//! Metadata diffs compare reason, author, tags and metrics field by field.

use crate::models::{
    ContentDiff, DiffHunk, DiffMode, DiffResult, FieldChange, HunkKind, MetadataDiff,
    MetricChange, PromptVersion, TagDiff, VersionRef,
};
use crate::services::resolver::resolve;
use crate::storage::LedgerStore;
use crate::Result;
use std::collections::BTreeMap;
use std::ops::Range;

/// Compares two resolvable references of one prompt.
pub struct DiffEngine<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> DiffEngine<'a> {
    /// Creates an engine reading from `store`.
    #[must_use]
    pub const fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    /// Resolves both references and diffs the two versions.
    ///
    /// Diffing a version against itself yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if either reference cannot be
    /// resolved, or a storage error if a version cannot be read.
    pub fn diff(
        &self,
        prompt_id: &str,
        from: &VersionRef,
        to: &VersionRef,
        mode: DiffMode,
    ) -> Result<DiffResult> {
        let from_version = resolve(self.store, prompt_id, from)?;
        let to_version = resolve(self.store, prompt_id, to)?;
        tracing::debug!(prompt_id, from_version, to_version, %mode, "computing diff");

        let old = self.store.get(prompt_id, from_version)?;
        let new = if to_version == from_version {
            old.clone()
        } else {
            self.store.get(prompt_id, to_version)?
        };

        Ok(match mode {
            DiffMode::Content => DiffResult::Content(diff_content(&old, &new)),
            DiffMode::Metadata => DiffResult::Metadata(diff_metadata(&old, &new)),
        })
    }
}

/// Line-level diff of two versions' bodies.
#[must_use]
pub fn diff_content(old: &PromptVersion, new: &PromptVersion) -> ContentDiff {
    ContentDiff {
        from_version: old.version,
        to_version: new.version,
        hunks: diff_lines(&old.content, &new.content),
    }
}

/// Field-level diff of two versions' metadata.
#[must_use]
pub fn diff_metadata(old: &PromptVersion, new: &PromptVersion) -> MetadataDiff {
    let tags = TagDiff {
        added: new.tags.difference(&old.tags).cloned().collect(),
        removed: old.tags.difference(&new.tags).cloned().collect(),
    };

    let mut metrics = BTreeMap::new();
    for (name, &old_value) in &old.metrics {
        let change = match new.metrics.get(name) {
            Some(&new_value) => MetricChange::Delta {
                old: old_value,
                new: new_value,
                delta: new_value - old_value,
            },
            None => MetricChange::Removed { value: old_value },
        };
        metrics.insert(name.clone(), change);
    }
    for (name, &value) in &new.metrics {
        if !old.metrics.contains_key(name) {
            metrics.insert(name.clone(), MetricChange::Added { value });
        }
    }

    MetadataDiff {
        from_version: old.version,
        to_version: new.version,
        reason: FieldChange::compare(&old.reason, &new.reason),
        author: FieldChange::compare(&old.author, &new.author),
        tags,
        metrics,
    }
}

/// Diffs two texts line by line.
///
/// Returns no hunks when the texts have identical lines. Lines shared at the
/// start and end are matched directly, so only the differing middle pays for
/// the LCS table.
#[must_use]
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffHunk> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    if a == b {
        return Vec::new();
    }

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut builder = HunkBuilder::default();
    for (k, line) in a[..prefix].iter().enumerate() {
        builder.push(HunkKind::Unchanged, k, k, line);
    }

    let table = LcsTable::build(a_mid, b_mid);
    let (mut i, mut j) = (0, 0);
    while i < a_mid.len() && j < b_mid.len() {
        if a_mid[i] == b_mid[j] {
            builder.push(HunkKind::Unchanged, prefix + i, prefix + j, a_mid[i]);
            i += 1;
            j += 1;
        } else if table.get(i + 1, j) >= table.get(i, j + 1) {
            builder.push(HunkKind::Removed, prefix + i, prefix + j, a_mid[i]);
            i += 1;
        } else {
            builder.push(HunkKind::Added, prefix + i, prefix + j, b_mid[j]);
            j += 1;
        }
    }
    for line in &a_mid[i..] {
        builder.push(HunkKind::Removed, prefix + i, prefix + j, line);
        i += 1;
    }
    for line in &b_mid[j..] {
        builder.push(HunkKind::Added, prefix + i, prefix + j, line);
        j += 1;
    }

    let (old_tail, new_tail) = (a.len() - suffix, b.len() - suffix);
    for k in 0..suffix {
        builder.push(HunkKind::Unchanged, old_tail + k, new_tail + k, a[old_tail + k]);
    }

    builder.finish()
}

/// Suffix LCS lengths over a flat buffer: `get(i, j)` is the LCS length of
/// `a[i..]` and `b[j..]`.
struct LcsTable {
    cells: Vec<u32>,
    width: usize,
}

impl LcsTable {
    fn build(a: &[&str], b: &[&str]) -> Self {
        let width = b.len() + 1;
        let mut table = Self {
            cells: vec![0; (a.len() + 1) * width],
            width,
        };
        for i in (0..a.len()).rev() {
            for j in (0..b.len()).rev() {
                let value = if a[i] == b[j] {
                    table.get(i + 1, j + 1) + 1
                } else {
                    table.get(i + 1, j).max(table.get(i, j + 1))
                };
                table.cells[i * width + j] = value;
            }
        }
        table
    }

    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.width + j]
    }
}

#[derive(Default)]
struct HunkBuilder {
    hunks: Vec<DiffHunk>,
}

impl HunkBuilder {
    /// Appends one line at old index `i` / new index `j`.
    fn push(&mut self, kind: HunkKind, i: usize, j: usize, line: &str) {
        if let Some(last) = self.hunks.last_mut().filter(|h| h.kind == kind) {
            match kind {
                HunkKind::Unchanged => {
                    last.old_range.end += 1;
                    last.new_range.end += 1;
                },
                HunkKind::Removed => last.old_range.end += 1,
                HunkKind::Added => last.new_range.end += 1,
            }
            last.lines.push(line.to_string());
            return;
        }

        let (old_range, new_range): (Range<usize>, Range<usize>) = match kind {
            HunkKind::Unchanged => (i..i + 1, j..j + 1),
            HunkKind::Removed => (i..i + 1, j..j),
            HunkKind::Added => (i..i, j..j + 1),
        };
        self.hunks.push(DiffHunk {
            kind,
            old_range,
            new_range,
            lines: vec![line.to_string()],
        });
    }

    fn finish(self) -> Vec<DiffHunk> {
        self.hunks
    }
}

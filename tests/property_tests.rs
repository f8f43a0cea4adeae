//! Property-based tests for the diff engine, references and the label view.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Content diffs reconstruct both bodies and have contiguous ranges
//! - Identical bodies produce no hunks
//! - Appends are numbered 1..=N with no gaps
//! - Positive integers parse as version references, other names as labels
//! - Replaying a move log keeps the last move per label

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use promptledger::models::{HunkKind, LabelMove, LabelView};
use promptledger::services::diff_lines;
use promptledger::storage::{LedgerStore, MemoryLedgerStore};
use promptledger::{NewVersion, VersionRef};

fn body() -> impl Strategy<Value = Vec<String>> {
    // A small alphabet makes shared lines likely.
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e"]), 0..12)
        .prop_map(|lines| lines.into_iter().map(str::to_string).collect())
}

proptest! {
    /// Property: old lines are Unchanged + Removed, new lines are Unchanged + Added, in order.
    #[test]
    fn prop_diff_reconstructs_both_sides(old in body(), new in body()) {
        let hunks = diff_lines(&old.join("\n"), &new.join("\n"));

        let rebuilt_old: Vec<String> = hunks
            .iter()
            .filter(|h| h.kind != HunkKind::Added)
            .flat_map(|h| h.lines.clone())
            .collect();
        let rebuilt_new: Vec<String> = hunks
            .iter()
            .filter(|h| h.kind != HunkKind::Removed)
            .flat_map(|h| h.lines.clone())
            .collect();

        if old == new {
            prop_assert!(hunks.is_empty());
        } else {
            prop_assert_eq!(rebuilt_old, old);
            prop_assert_eq!(rebuilt_new, new);
        }
    }

    /// Property: hunk ranges tile both bodies without gaps and adjacent hunks differ in kind.
    #[test]
    fn prop_diff_ranges_are_contiguous(old in body(), new in body()) {
        let hunks = diff_lines(&old.join("\n"), &new.join("\n"));

        let (mut old_pos, mut new_pos) = (0, 0);
        for hunk in &hunks {
            prop_assert_eq!(hunk.old_range.start, old_pos);
            prop_assert_eq!(hunk.new_range.start, new_pos);
            let width = match hunk.kind {
                HunkKind::Added => hunk.new_range.len(),
                HunkKind::Removed | HunkKind::Unchanged => hunk.old_range.len(),
            };
            prop_assert_eq!(width, hunk.lines.len());
            old_pos = hunk.old_range.end;
            new_pos = hunk.new_range.end;
        }
        if !hunks.is_empty() {
            prop_assert_eq!(old_pos, old.len());
            prop_assert_eq!(new_pos, new.len());
        }
        prop_assert!(hunks.windows(2).all(|w| w[0].kind != w[1].kind));
    }

    /// Property: a body diffed against itself has no hunks.
    #[test]
    fn prop_identical_bodies_have_no_hunks(lines in body()) {
        let text = lines.join("\n");
        prop_assert!(diff_lines(&text, &text).is_empty());
    }

    /// Property: N appends yield versions 1..=N.
    #[test]
    fn prop_appends_are_gapless(n in 1u32..25) {
        let store = MemoryLedgerStore::new();
        for i in 0..n {
            let v = store.append("p", &NewVersion::new(format!("body {i}"))).unwrap();
            prop_assert_eq!(v.version, i + 1);
        }
        prop_assert_eq!(store.latest_version("p").unwrap(), Some(n));
    }

    /// Property: positive integers parse as explicit versions.
    #[test]
    fn prop_positive_integers_are_versions(n in 1u32..=u32::MAX) {
        prop_assert_eq!(n.to_string().parse::<VersionRef>().unwrap(), VersionRef::Version(n));
    }

    /// Property: non-numeric names parse as labels.
    #[test]
    fn prop_names_are_labels(name in "[a-z][a-z0-9_-]{0,20}") {
        prop_assert_eq!(name.parse::<VersionRef>().unwrap(), VersionRef::Label(name.clone()));
    }

    /// Property: replaying a log points every label at its last move.
    #[test]
    fn prop_replay_keeps_last_move(
        moves in prop::collection::vec((0usize..3, 0usize..3, 1u32..10), 0..40)
    ) {
        let prompts = ["p", "q", "r"];
        let labels = ["dev", "staging", "prod"];

        let log: Vec<LabelMove> = moves
            .iter()
            .enumerate()
            .map(|(i, &(p, l, to))| LabelMove {
                id: i64::try_from(i).unwrap() + 1,
                prompt_id: prompts[p].to_string(),
                label: labels[l].to_string(),
                from_version: None,
                to_version: to,
                moved_at: promptledger::current_timestamp(),
                actor: None,
            })
            .collect();

        let mut expected = BTreeMap::new();
        for mv in &log {
            expected.insert((mv.prompt_id.clone(), mv.label.clone()), mv.to_version);
        }

        let view = LabelView::replay(&log);
        prop_assert_eq!(view.len(), expected.len());
        for ((prompt_id, label), version) in expected {
            prop_assert_eq!(view.get(&prompt_id, &label), Some(version));
        }
    }
}

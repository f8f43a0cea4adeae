//! Concurrent writers on one ledger file.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use promptledger::{NewVersion, PromptLedger};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const WRITERS: usize = 4;
const APPENDS_PER_WRITER: usize = 15;

#[test]
fn test_separate_handles_share_one_gapless_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    PromptLedger::init(&path).unwrap().close().unwrap();

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                // One connection per thread, as separate processes would have.
                let ledger = PromptLedger::open(&path).unwrap();
                barrier.wait();
                for i in 0..APPENDS_PER_WRITER {
                    ledger
                        .add(
                            "shared",
                            NewVersion::new(format!("writer {writer} append {i}"))
                                .with_env(format!("w{writer}")),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ledger = PromptLedger::open(&path).unwrap();
    let versions: Vec<u32> = ledger
        .history("shared")
        .unwrap()
        .iter()
        .map(|v| v.version)
        .collect();
    let total = u32::try_from(WRITERS * APPENDS_PER_WRITER).unwrap();
    assert_eq!(versions, (1..=total).collect::<Vec<_>>());

    assert_eq!(
        ledger.label_history(Some("shared")).unwrap().len(),
        WRITERS * APPENDS_PER_WRITER
    );
    assert!(ledger.verify_labels().unwrap().is_empty());
}

#[test]
fn test_cloned_handle_across_threads() {
    let ledger = PromptLedger::in_memory().unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for i in 0..APPENDS_PER_WRITER {
                    ledger
                        .add(&format!("p{}", i % 3), NewVersion::new(format!("{writer}-{i}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let summary = ledger.status().unwrap();
    let total: usize = summary.prompts.iter().map(|p| p.version_count).sum();
    assert_eq!(total, WRITERS * APPENDS_PER_WRITER);
    for prompt in &summary.prompts {
        let history = ledger.history(&prompt.prompt_id).unwrap();
        assert!(
            history
                .iter()
                .enumerate()
                .all(|(i, v)| v.version as usize == i + 1)
        );
    }
}

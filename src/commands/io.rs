//! Export, demo and maintenance command handlers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use promptledger::PromptLedger;
use promptledger::services::seed_demo;

use super::CommandContext;

/// Export command: one JSON object per version, ordered by prompt id then version.
pub fn cmd_export(ctx: &CommandContext, output: Option<&Path>) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut count = 0usize;
    for id in ledger.list_ids()? {
        for version in ledger.history(&id)? {
            serde_json::to_writer(&mut writer, &version)?;
            writeln!(writer)?;
            count += 1;
        }
    }
    writer.flush()?;

    if let Some(path) = output {
        eprintln!("Exported {count} versions to {}", path.display());
    }
    Ok(())
}

/// Demo command: creates the ledger if needed and seeds the demo prompts.
pub fn cmd_demo(ctx: &CommandContext) -> anyhow::Result<()> {
    let db_path = ctx.config.db_path();
    let ledger = PromptLedger::init(&db_path)?;
    seed_demo(&ledger)?;
    ledger.close()?;

    println!("Demo DB created at {}", db_path.display());
    println!("Try: promptledger status");
    println!("Try: promptledger label history");
    println!("Try: promptledger diff --id onboarding_email --from prod --to staging");
    println!("Try: promptledger diff --id support_reply --from 1 --to 2 --mode metadata");
    Ok(())
}

/// Rebuild-labels command.
pub fn cmd_rebuild_labels(ctx: &CommandContext, check: bool) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;

    if check {
        let diverged = ledger.verify_labels()?;
        return ctx.emit(&diverged, || {
            if diverged.is_empty() {
                "Label table matches the move log.\n".to_string()
            } else {
                diverged
                    .iter()
                    .map(|(prompt_id, label)| format!("diverged: {prompt_id}:{label}\n"))
                    .collect()
            }
        });
    }

    let count = ledger.rebuild_labels()?;
    ledger.close()?;
    ctx.emit(&count, || format!("Rebuilt {count} labels from the move log\n"))
}

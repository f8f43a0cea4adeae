//! Core command handlers.
//!
//! Contains the implementation of core CLI commands:
//! init, add, get, history, diff, status.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use promptledger::cli::render;
use promptledger::models::DiffMode;
use promptledger::{Error, NewVersion, PromptLedger, VersionRef};

use super::CommandContext;

/// Arguments for the `add` command.
///
/// Encapsulates all parameters to avoid function with too many arguments.
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    /// Read the body from this file.
    pub file: Option<PathBuf>,
    /// Inline body.
    pub content: Option<String>,
    /// Reason.
    pub reason: String,
    /// Author; falls back to the configured default.
    pub author: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Initial label.
    pub env: Option<String>,
    /// Raw `name=value` metrics.
    pub metrics: Vec<String>,
    /// Actor for the initial label move.
    pub actor: Option<String>,
}

/// Parses a `name=value` metric argument.
///
/// Malformed input is an [`Error::InvalidInput`], so it exits with the
/// validation status like every other rejected argument.
pub fn parse_metric(raw: &str) -> promptledger::Result<(String, f64)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::InvalidInput(format!("metric '{raw}' must be NAME=VALUE")))?;
    let value: f64 = value.trim().parse().map_err(|_| {
        Error::InvalidInput(format!("metric '{raw}' has a non-numeric value"))
    })?;
    Ok((name.trim().to_string(), value))
}

/// Init command.
pub fn cmd_init(ctx: &CommandContext) -> anyhow::Result<()> {
    let db_path = ctx.config.db_path();
    let ledger = PromptLedger::init(&db_path)?;
    ledger.close()?;
    println!("Initialized ledger at {}", db_path.display());
    Ok(())
}

/// Add command.
pub fn cmd_add(ctx: &CommandContext, id: &str, args: AddArgs) -> anyhow::Result<()> {
    let content = match (args.file, args.content) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(content)) => content,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt body from stdin")?;
            buf
        },
    };

    let author = args
        .author
        .or_else(|| ctx.config.default_author.clone())
        .unwrap_or_default();

    let mut input = NewVersion::new(content)
        .with_reason(args.reason)
        .with_author(author)
        .with_tags(args.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()));
    for raw in &args.metrics {
        let (name, value) = parse_metric(raw)?;
        input = input.with_metric(name, value);
    }
    if let Some(env) = args.env {
        input = input.with_env(env);
    }
    if let Some(actor) = args.actor {
        input = input.with_actor(actor);
    }

    let ledger = ctx.open_ledger()?;
    let version = ledger.add(id, input)?;
    ctx.emit(&version, || {
        format!("Added {}@v{}\n", version.prompt_id, version.version)
    })?;
    ledger.close()?;
    Ok(())
}

/// Get command.
pub fn cmd_get(ctx: &CommandContext, id: &str, reference: Option<&str>) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let reference = match reference {
        Some(raw) => raw.parse::<VersionRef>()?,
        None => {
            let latest = ledger
                .history(id)?
                .last()
                .map(|v| v.version)
                .ok_or_else(|| promptledger::Error::NotFound(format!("prompt '{id}'")))?;
            VersionRef::Version(latest)
        },
    };

    let version = ledger.get(id, &reference)?;
    ctx.emit(&version, || render::render_version(&version))
}

/// History command.
pub fn cmd_history(ctx: &CommandContext, id: &str) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let versions = ledger.history(id)?;
    ctx.emit(&versions, || render::render_history(id, &versions))
}

/// Diff command.
pub fn cmd_diff(
    ctx: &CommandContext,
    id: &str,
    from: &str,
    to: &str,
    mode: DiffMode,
) -> anyhow::Result<()> {
    let from: VersionRef = from.parse()?;
    let to: VersionRef = to.parse()?;

    let ledger = ctx.open_ledger()?;
    let diff = ledger.diff(id, &from, &to, mode)?;
    ctx.emit(&diff, || render::render_diff(id, &diff))
}

/// Status command.
pub fn cmd_status(ctx: &CommandContext) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let summary = ledger.status()?;
    ctx.emit(&summary, || render::render_status(&summary))
}

//! Text and JSON rendering of ledger results.
//!
//! Every renderer returns a `String`; printing is left to the command
//! handlers.

use crate::models::{
    ContentDiff, DiffResult, FieldChange, HunkKind, LabelMove, MetadataDiff, MetricChange,
    PromptVersion,
};
use crate::services::StatusSummary;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Pretty-prints any serializable value as JSON.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::operation("serialize_json", e))
}

fn join_tags<'a>(tags: impl IntoIterator<Item = &'a String>) -> String {
    let tags: Vec<&str> = tags.into_iter().map(String::as_str).collect();
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(",")
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

/// Renders one version: a metadata header, a blank line, then the body.
#[must_use]
pub fn render_version(version: &PromptVersion) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "prompt:  {}", version.prompt_id);
    let _ = writeln!(out, "version: {}", version.version);
    let _ = writeln!(out, "created: {}", version.created_at.to_rfc3339());
    let _ = writeln!(out, "author:  {}", or_dash(&version.author));
    let _ = writeln!(out, "reason:  {}", or_dash(&version.reason));
    let _ = writeln!(out, "tags:    {}", join_tags(&version.tags));
    if let Some(env) = &version.env {
        let _ = writeln!(out, "env:     {env}");
    }
    if !version.metrics.is_empty() {
        let metrics: Vec<String> = version
            .metrics
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let _ = writeln!(out, "metrics: {}", metrics.join(" "));
    }
    out.push('\n');
    out.push_str(&version.content);
    if !version.content.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Renders a version history table.
#[must_use]
pub fn render_history(prompt_id: &str, versions: &[PromptVersion]) -> String {
    if versions.is_empty() {
        return format!("No versions for '{prompt_id}'.\n");
    }

    let mut out = format!(
        "{:<8} {:<20} {:<12} {:<20} REASON\n",
        "VERSION", "CREATED", "AUTHOR", "TAGS"
    );
    for v in versions {
        let _ = writeln!(
            out,
            "{:<8} {:<20} {:<12} {:<20} {}",
            v.version,
            v.created_at.format("%Y-%m-%d %H:%M:%S"),
            or_dash(&v.author),
            join_tags(&v.tags),
            or_dash(&v.reason),
        );
    }
    out
}

/// Renders a diff result.
#[must_use]
pub fn render_diff(prompt_id: &str, diff: &DiffResult) -> String {
    match diff {
        DiffResult::Content(content) => render_content_diff(prompt_id, content),
        DiffResult::Metadata(metadata) => render_metadata_diff(prompt_id, metadata),
    }
}

/// Renders a content diff with unified-style line prefixes.
#[must_use]
pub fn render_content_diff(prompt_id: &str, diff: &ContentDiff) -> String {
    let mut out = format!(
        "--- {prompt_id}@v{}\n+++ {prompt_id}@v{}\n",
        diff.from_version, diff.to_version
    );
    if diff.is_empty() {
        out.push_str("No differences.\n");
        return out;
    }

    for hunk in &diff.hunks {
        let prefix = match hunk.kind {
            HunkKind::Unchanged => ' ',
            HunkKind::Added => '+',
            HunkKind::Removed => '-',
        };
        for line in &hunk.lines {
            let _ = writeln!(out, "{prefix}{line}");
        }
    }

    let stats = diff.stats();
    let _ = writeln!(out, "({} added, {} removed)", stats.added, stats.removed);
    out
}

fn render_field(out: &mut String, name: &str, change: &FieldChange) {
    match change {
        FieldChange::Unchanged { value } => {
            let _ = writeln!(out, "{name}: unchanged ({})", or_dash(value));
        },
        FieldChange::Changed { old, new } => {
            let _ = writeln!(out, "{name}: {} -> {}", or_dash(old), or_dash(new));
        },
    }
}

/// Renders a metadata diff, one field per line.
#[must_use]
pub fn render_metadata_diff(prompt_id: &str, diff: &MetadataDiff) -> String {
    let mut out = format!(
        "metadata {prompt_id}@v{} -> v{}\n",
        diff.from_version, diff.to_version
    );
    render_field(&mut out, "reason", &diff.reason);
    render_field(&mut out, "author", &diff.author);

    if diff.tags.is_empty() {
        out.push_str("tags: unchanged\n");
    } else {
        let mut parts: Vec<String> = diff.tags.added.iter().map(|t| format!("+{t}")).collect();
        parts.extend(diff.tags.removed.iter().map(|t| format!("-{t}")));
        let _ = writeln!(out, "tags: {}", parts.join(" "));
    }

    if diff.metrics.is_empty() {
        out.push_str("metrics: none\n");
    }
    for (name, change) in &diff.metrics {
        let _ = match change {
            MetricChange::Added { value } => writeln!(out, "metric {name}: added {value}"),
            MetricChange::Removed { value } => writeln!(out, "metric {name}: removed {value}"),
            MetricChange::Delta { old, new, delta } => {
                writeln!(out, "metric {name}: {old} -> {new} ({delta:+.4})")
            },
        };
    }
    out
}

/// Renders the status summary.
#[must_use]
pub fn render_status(summary: &StatusSummary) -> String {
    if summary.is_empty() {
        return "No prompts yet.\n".to_string();
    }

    let mut out = format!("{:<24} {:<8} LABELS\n", "PROMPT", "LATEST");
    for prompt in &summary.prompts {
        let _ = writeln!(
            out,
            "{:<24} {:<8} {}",
            prompt.prompt_id,
            prompt.latest_version,
            render_label_map(&prompt.labels)
        );
    }
    out
}

/// Renders `name=version` pairs separated by spaces, or `-` when empty.
#[must_use]
pub fn render_label_map(labels: &BTreeMap<String, u32>) -> String {
    if labels.is_empty() {
        return "-".to_string();
    }
    labels
        .iter()
        .map(|(name, version)| format!("{name}={version}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the label move log.
#[must_use]
pub fn render_label_moves(moves: &[LabelMove]) -> String {
    if moves.is_empty() {
        return "No label moves.\n".to_string();
    }

    let mut out = format!(
        "{:<20} {:<24} {:<12} {:<10} ACTOR\n",
        "MOVED", "PROMPT", "LABEL", "CHANGE"
    );
    for mv in moves {
        let change = mv.from_version.map_or_else(
            || format!("-> {}", mv.to_version),
            |from| format!("{from} -> {}", mv.to_version),
        );
        let _ = writeln!(
            out,
            "{:<20} {:<24} {:<12} {:<10} {}",
            mv.moved_at.format("%Y-%m-%d %H:%M:%S"),
            mv.prompt_id,
            mv.label,
            change,
            mv.actor.as_deref().unwrap_or("-"),
        );
    }
    out
}

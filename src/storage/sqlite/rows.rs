//! Row conversion between `SQLite` and ledger models.

use crate::models::{Label, LabelMove, PromptVersion};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use std::collections::{BTreeMap, BTreeSet};

/// Column list matching [`VersionRow::from_row`].
pub const VERSION_COLUMNS: &str =
    "prompt_id, version, content, reason, author, tags, metrics, env, created_at";

/// Column list matching [`MoveRow::from_row`].
pub const MOVE_COLUMNS: &str = "id, prompt_id, label, from_version, to_version, moved_at, actor";

/// Column list matching [`LabelRow::from_row`].
pub const LABEL_COLUMNS: &str = "prompt_id, name, version, updated_at";

/// Formats a timestamp for storage (RFC 3339, microseconds, `Z` suffix).
///
/// The fixed width keeps lexicographic order equal to time order.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the text is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::operation("parse_timestamp", format!("'{value}': {e}")))
}

/// Converts a stored integer to a version number.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the value does not fit.
pub fn to_version(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::operation("read_version", format!("{value} is not a valid version")))
}

/// Raw `prompt_versions` row before JSON decoding.
#[derive(Debug)]
pub struct VersionRow {
    prompt_id: String,
    version: i64,
    content: String,
    reason: String,
    author: String,
    tags_json: String,
    metrics_json: String,
    env: Option<String>,
    created_at: String,
}

impl VersionRow {
    /// Reads a row selected with [`VERSION_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns the rusqlite error for a missing or mistyped column.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            prompt_id: row.get(0)?,
            version: row.get(1)?,
            content: row.get(2)?,
            reason: row.get(3)?,
            author: row.get(4)?,
            tags_json: row.get(5)?,
            metrics_json: row.get(6)?,
            env: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    /// Decodes the row into a [`PromptVersion`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if a JSON column or the timestamp
    /// cannot be decoded.
    pub fn into_version(self) -> Result<PromptVersion> {
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags_json)
            .map_err(|e| Error::operation("decode_tags", e))?;
        let metrics: BTreeMap<String, f64> = serde_json::from_str(&self.metrics_json)
            .map_err(|e| Error::operation("decode_metrics", e))?;

        Ok(PromptVersion {
            prompt_id: self.prompt_id,
            version: to_version(self.version)?,
            content: self.content,
            reason: self.reason,
            author: self.author,
            tags,
            metrics,
            env: self.env,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Raw `label_moves` row.
#[derive(Debug)]
pub struct MoveRow {
    id: i64,
    prompt_id: String,
    label: String,
    from_version: Option<i64>,
    to_version: i64,
    moved_at: String,
    actor: Option<String>,
}

impl MoveRow {
    /// Reads a row selected with [`MOVE_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns the rusqlite error for a missing or mistyped column.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            prompt_id: row.get(1)?,
            label: row.get(2)?,
            from_version: row.get(3)?,
            to_version: row.get(4)?,
            moved_at: row.get(5)?,
            actor: row.get(6)?,
        })
    }

    /// Decodes the row into a [`LabelMove`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] for out-of-range versions or a bad timestamp.
    pub fn into_move(self) -> Result<LabelMove> {
        Ok(LabelMove {
            id: self.id,
            prompt_id: self.prompt_id,
            label: self.label,
            from_version: self.from_version.map(to_version).transpose()?,
            to_version: to_version(self.to_version)?,
            moved_at: parse_timestamp(&self.moved_at)?,
            actor: self.actor,
        })
    }
}

/// Raw `labels` row.
#[derive(Debug)]
pub struct LabelRow {
    prompt_id: String,
    name: String,
    version: i64,
    updated_at: String,
}

impl LabelRow {
    /// Reads a row selected with [`LABEL_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns the rusqlite error for a missing or mistyped column.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            prompt_id: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    /// Decodes the row into a [`Label`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] for an out-of-range version or a bad timestamp.
    pub fn into_label(self) -> Result<Label> {
        Ok(Label {
            prompt_id: self.prompt_id,
            name: self.name,
            current_version: to_version(self.version)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

//! Prompt versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::validate::{validate_content, validate_label_name, validate_metrics};
use crate::Result;

/// One immutable revision of a prompt.
///
/// Versions are numbered per prompt id starting at 1 with no gaps. Once
/// written, no field of a version ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    /// Prompt identifier.
    pub prompt_id: String,
    /// Version number (1-based, gapless per prompt id).
    pub version: u32,
    /// Prompt body.
    pub content: String,
    /// Why this revision was made.
    pub reason: String,
    /// Who made it.
    pub author: String,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Numeric evaluation metrics, keyed by metric name.
    pub metrics: BTreeMap<String, f64>,
    /// Environment label the revision was added under, if any.
    ///
    /// Recorded once at `add` time; later label moves do not change it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    /// When the revision was recorded.
    pub created_at: DateTime<Utc>,
}

impl PromptVersion {
    /// Returns true if the version carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns the value of a metric, if recorded.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Input for `add`: everything a caller supplies for a new revision.
///
/// The version number and timestamp are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVersion {
    /// Prompt body.
    pub content: String,
    /// Why this revision was made.
    pub reason: String,
    /// Who made it.
    pub author: String,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Numeric evaluation metrics.
    pub metrics: BTreeMap<String, f64>,
    /// Label to point at the new version once it exists, e.g. `dev`.
    pub env: Option<String>,
    /// Actor recorded on the label move made for `env`.
    pub actor: Option<String>,
}

impl NewVersion {
    /// Creates a new revision input with the given content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Replaces the tag set.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Sets the initial label.
    #[must_use]
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Sets the actor recorded for the initial label move.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Checks content, metrics and the initial label name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if any field is rejected.
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.content)?;
        validate_metrics(&self.metrics)?;
        if let Some(env) = &self.env {
            validate_label_name(env)?;
        }
        Ok(())
    }

    /// Returns a copy whose `env` names the label actually applied on append.
    #[must_use]
    pub(crate) fn applied_env(&self, label: Option<&str>) -> Self {
        Self {
            env: label.map(str::to_string),
            ..self.clone()
        }
    }

    /// Materializes the stored record for an assigned version number.
    #[must_use]
    pub fn into_version(
        self,
        prompt_id: impl Into<String>,
        version: u32,
        created_at: DateTime<Utc>,
    ) -> PromptVersion {
        PromptVersion {
            prompt_id: prompt_id.into(),
            version,
            content: self.content,
            reason: self.reason,
            author: self.author,
            tags: self.tags,
            metrics: self.metrics,
            env: self.env,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_fields() {
        let input = NewVersion::new("Write a friendly onboarding email.")
            .with_reason("initial draft")
            .with_author("demo")
            .with_tags(["draft", "marketing", "draft"])
            .with_metric("score", 0.7)
            .with_env("dev");

        assert_eq!(input.tags.len(), 2);
        assert_eq!(input.metrics.get("score"), Some(&0.7));
        assert_eq!(input.env.as_deref(), Some("dev"));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_env() {
        let input = NewVersion::new("body").with_env("not valid");
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_into_version_keeps_metadata() {
        let now = crate::current_timestamp();
        let version = NewVersion::new("body")
            .with_reason("why")
            .with_author("me")
            .with_tags(["a"])
            .with_metric("score", 1.5)
            .into_version("p", 3, now);

        assert_eq!(version.prompt_id, "p");
        assert_eq!(version.version, 3);
        assert_eq!(version.created_at, now);
        assert!(version.has_tag("a"));
        assert_eq!(version.metric("score"), Some(1.5));
        assert_eq!(version.metric("missing"), None);
    }
}

//! Per-prompt status records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-prompt status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptStatus {
    /// Prompt identifier.
    pub prompt_id: String,
    /// Highest version.
    pub latest_version: u32,
    /// Number of versions (equal to `latest_version`, versions are gapless).
    pub version_count: usize,
    /// Current label-to-version mapping.
    pub labels: BTreeMap<String, u32>,
}

//! Version references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Caller input selecting one version of a prompt.
///
/// Text input is parsed with [`VersionRef::parse`]: canonical positive
/// integers become [`VersionRef::Version`], other positive integer text
/// (`"007"`, `"+3"`, numbers past `u32::MAX`) becomes [`VersionRef::Numeric`]
/// so the caller's spelling survives, and everything else is a
/// [`VersionRef::Label`]. Resolution against a store happens in
/// [`crate::services::resolve`], which falls back to a label literally named
/// like the reference text when no such version exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VersionRef {
    /// Explicit version number.
    Version(u32),
    /// Label name such as `prod`.
    Label(String),
    /// Positive integer text that is not spelled like a version number.
    Numeric(String),
}

impl VersionRef {
    /// Creates a label reference.
    #[must_use]
    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }

    /// Parses caller text into a reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for empty input and for integers that
    /// are zero or negative.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidInput(
                "version reference must not be empty".to_string(),
            ));
        }

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Self::Label(input.to_string()));
        }
        if negative || digits.bytes().all(|b| b == b'0') {
            return Err(Error::InvalidInput(format!(
                "version reference must be positive, got {input}"
            )));
        }

        match digits.parse::<u32>() {
            Ok(n) if n.to_string() == input => Ok(Self::Version(n)),
            _ => Ok(Self::Numeric(input.to_string())),
        }
    }

    /// Returns the version number this reference names, if it fits one.
    #[must_use]
    pub fn as_version(&self) -> Option<u32> {
        match self {
            Self::Version(v) => Some(*v),
            Self::Numeric(text) => text.trim_start_matches('+').parse().ok(),
            Self::Label(_) => None,
        }
    }
}

impl FromStr for VersionRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u32> for VersionRef {
    fn from(version: u32) -> Self {
        Self::Version(version)
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(v) => write!(f, "{v}"),
            Self::Label(name) | Self::Numeric(name) => f.write_str(name),
        }
    }
}

//! # promptledger
//!
//! A local version-control ledger for the text prompts that drive LLM workflows.
//!
//! Every `add` records a new immutable revision of a prompt under its string
//! identifier, numbered `1, 2, 3, ...` without gaps. Revisions carry a reason,
//! an author, a tag set and numeric metrics. Movable labels such as `dev`,
//! `staging` and `prod` point at one revision each, and every move is kept in
//! an append-only audit log.
//!
//! ## Features
//!
//! - Single-file `SQLite` store with transactional, gapless version numbering
//! - Label registry whose current pointers are a replayable view of the move log
//! - Line-level (LCS) content diffs and field-level metadata diffs
//! - References by explicit version number or by label name
//!
//! ## Example
//!
//! ```rust
//! use promptledger::{DiffMode, NewVersion, PromptLedger, VersionRef};
//!
//! let ledger = PromptLedger::in_memory()?;
//! ledger.add("greeting", NewVersion::new("Say hello.").with_reason("first draft"))?;
//! ledger.add("greeting", NewVersion::new("Say hello warmly.").with_env("prod"))?;
//!
//! let prod = ledger.get("greeting", &VersionRef::label("prod"))?;
//! assert_eq!(prod.version, 2);
//!
//! let diff = ledger.diff(
//!     "greeting",
//!     &VersionRef::Version(1),
//!     &VersionRef::label("prod"),
//!     DiffMode::Content,
//! )?;
//! assert!(!diff.is_empty());
//! # Ok::<(), promptledger::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::LedgerConfig;
pub use models::{
    DiffMode, DiffResult, Label, LabelMove, LabelView, NewVersion, PromptVersion, VersionRef,
};
pub use services::{PromptLedger, StatusSummary};
pub use storage::{LedgerStore, MemoryLedgerStore, SqliteLedgerStore};

/// Error type for ledger operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `NotFound` | Unknown prompt id, version, or label |
/// | `InvalidInput` | Empty or malformed identifiers, empty content, non-finite metrics, non-positive version references |
/// | `OperationFailed` | `SQLite` or filesystem failures, unreadable rows, config files that fail to parse |
/// | `Conflict` | Two writers raced for the same `(prompt_id, version)` slot |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The requested prompt, version, or label does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A prompt id or label name is empty, too long, or has disallowed characters
    /// - Prompt content is empty or whitespace only
    /// - A metric value is `NaN` or infinite
    /// - An explicit version reference is zero or negative
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A storage operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements or transactions fail
    /// - The store directory cannot be created
    /// - Stored JSON columns cannot be decoded
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A concurrent append claimed the same version number first.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// The four error kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown prompt id, version, or label.
    NotFound,
    /// Rejected input.
    Validation,
    /// I/O or persistence failure.
    Storage,
    /// Concurrent-append race.
    Conflict,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::Validation,
            Self::OperationFailed { .. } => ErrorKind::Storage,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }

    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current UTC time, truncated to microseconds.
///
/// Stores persist timestamps with microsecond precision, so records returned
/// by a write compare equal to the same records read back later.
#[must_use]
pub fn current_timestamp() -> chrono::DateTime<chrono::Utc> {
    use chrono::SubsecRound;
    chrono::Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "append_version".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'append_version' failed: disk full");

        let err = Error::NotFound("prompt 'p' version 3".to_string());
        assert_eq!(err.to_string(), "not found: prompt 'p' version 3");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::NotFound(String::new()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::InvalidInput(String::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::operation("x", "y").kind(), ErrorKind::Storage);
        assert_eq!(Error::Conflict(String::new()).kind(), ErrorKind::Conflict);
    }
}

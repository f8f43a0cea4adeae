//! Data models for promptledger.
//!
//! This module contains the records the ledger stores (versions, labels, label
//! moves), the reference type callers use to select a version, and the
//! structured diff results.

mod diff;
mod label;
mod reference;
mod status;
mod validate;
mod version;

pub use diff::{
    ContentDiff, DiffHunk, DiffMode, DiffResult, DiffStats, FieldChange, HunkKind, MetadataDiff,
    MetricChange, TagDiff,
};
pub use label::{Label, LabelKey, LabelMove, LabelView};
pub use reference::VersionRef;
pub use status::PromptStatus;
pub use validate::{
    MAX_IDENTIFIER_LENGTH, validate_content, validate_label_name, validate_metrics,
    validate_prompt_id,
};
pub use version::{NewVersion, PromptVersion};

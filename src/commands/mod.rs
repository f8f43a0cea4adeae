//! Command handlers module.
//!
//! This module organizes the CLI command implementations into separate files:
//! - `core.rs`: Core commands (init, add, get, history, diff, status)
//! - `label.rs`: Label management (set, get, list, history)
//! - `io.rs`: Export, demo seeding, label table rebuild

mod core;
mod io;
mod label;

use clap::Subcommand;
use promptledger::cli::OutputFormat;
use promptledger::cli::render::to_json;
use promptledger::{LedgerConfig, PromptLedger};
use serde::Serialize;

pub use self::core::{AddArgs, cmd_add, cmd_diff, cmd_get, cmd_history, cmd_init, cmd_status};
pub use io::{cmd_demo, cmd_export, cmd_rebuild_labels};
pub use label::cmd_label;

/// Label subcommands.
#[derive(Subcommand)]
pub enum LabelAction {
    /// Point a label at a version.
    Set {
        /// Prompt identifier.
        #[arg(long)]
        id: String,

        /// Version number.
        #[arg(long)]
        version: u32,

        /// Label name.
        #[arg(long)]
        name: String,

        /// Who is moving the label.
        #[arg(long)]
        actor: Option<String>,
    },

    /// Show the version a label points at.
    Get {
        /// Prompt identifier.
        #[arg(long)]
        id: String,

        /// Label name.
        #[arg(long)]
        name: String,
    },

    /// List the current labels of a prompt.
    List {
        /// Prompt identifier.
        #[arg(long)]
        id: String,
    },

    /// Show the label move log.
    History {
        /// Restrict to one prompt.
        #[arg(long)]
        id: Option<String>,
    },
}

/// Shared state for command handlers.
pub struct CommandContext {
    /// Resolved configuration.
    pub config: LedgerConfig,
    /// Output format.
    pub format: OutputFormat,
}

impl CommandContext {
    /// Creates a new context.
    pub const fn new(config: LedgerConfig, format: OutputFormat) -> Self {
        Self { config, format }
    }

    /// Opens the configured ledger, which must already exist.
    pub fn open_ledger(&self) -> promptledger::Result<PromptLedger> {
        PromptLedger::open(self.config.db_path())
    }

    /// Prints `value` as JSON or the text produced by `text`.
    pub fn emit<T, F>(&self, value: &T, text: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        match self.format {
            OutputFormat::Json => println!("{}", to_json(value)?),
            OutputFormat::Text => print!("{}", text()),
        }
        Ok(())
    }
}

//! CLI support shared by the `promptledger` binary.
//!
//! The binary owns argument parsing and dispatch; this module holds the
//! pieces worth testing on their own: the output format switch and the
//! renderers.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Create the ledger database |
//! | `add` | Record a new version of a prompt |
//! | `get` | Show one version by number or label |
//! | `history` | List every version of a prompt |
//! | `diff` | Compare two references by content or metadata |
//! | `status` | Summarize all prompts and their labels |
//! | `label` | Set, get, list labels and show the move log |
//! | `export` | Dump every version as JSON Lines |
//! | `demo` | Seed a demo data set |
//! | `rebuild-labels` | Rebuild the label table from the move log |
//!
//! # Example Usage
//!
//! ```bash
//! promptledger init
//! promptledger add --id onboarding_email --file prompt.txt --reason "first draft" --env dev
//! promptledger label set --id onboarding_email --version 1 --name prod
//! promptledger diff --id onboarding_email --from prod --to dev --mode metadata
//! ```

pub mod render;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

//! Binary entry point for promptledger.
//!
//! This binary provides the CLI interface for the prompt ledger.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{CommandContext, LabelAction};
use promptledger::cli::OutputFormat;
use promptledger::config::{CONFIG_ENV, ConfigSources, HOME_ENV, LedgerConfig};
use promptledger::models::DiffMode;
use promptledger::observability::{self, LoggingConfig};
use promptledger::{Error, ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;

/// promptledger - a local version-control ledger for LLM prompts.
#[derive(Parser)]
#[command(name = "promptledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ledger home directory.
    #[arg(long, global = true, env = HOME_ENV)]
    home: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the ledger database.
    Init,

    /// Record a new version of a prompt.
    Add {
        /// Prompt identifier.
        #[arg(long)]
        id: String,

        /// Read the prompt body from a file.
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Prompt body (read from stdin when neither this nor --file is given).
        #[arg(long)]
        content: Option<String>,

        /// Why this version was made.
        #[arg(long, default_value = "")]
        reason: String,

        /// Who made it (defaults to `default_author` from the config file).
        #[arg(long)]
        author: Option<String>,

        /// Tags (comma-separated or repeated).
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Point this label at the new version.
        #[arg(long)]
        env: Option<String>,

        /// Metric as `name=value` (repeatable).
        #[arg(long = "metric", value_name = "NAME=VALUE")]
        metrics: Vec<String>,

        /// Actor recorded on the label move made for --env.
        #[arg(long)]
        actor: Option<String>,
    },

    /// Show one version.
    Get {
        /// Prompt identifier.
        #[arg(long)]
        id: String,

        /// Version number or label name (default: latest version).
        #[arg(long = "ref", value_name = "REF")]
        reference: Option<String>,
    },

    /// List every version of a prompt.
    History {
        /// Prompt identifier.
        #[arg(long)]
        id: String,
    },

    /// Compare two versions.
    Diff {
        /// Prompt identifier.
        #[arg(long)]
        id: String,

        /// Older reference (version number or label).
        #[arg(long)]
        from: String,

        /// Newer reference (version number or label).
        #[arg(long)]
        to: String,

        /// `content` or `metadata`.
        #[arg(long, default_value = "content")]
        mode: DiffMode,
    },

    /// Summarize all prompts and their labels.
    Status,

    /// Manage labels.
    Label {
        /// Label action.
        #[command(subcommand)]
        action: LabelAction,
    },

    /// Dump every version as JSON Lines.
    Export {
        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Seed the demo data set.
    Demo,

    /// Rebuild the label table from the move log.
    RebuildLabels {
        /// Only report labels that disagree with the move log.
        #[arg(long)]
        check: bool,
    },
}

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let sources = ConfigSources::new(cli.home.clone(), cli.config.clone());
    let config = match LedgerConfig::resolve(&sources) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = match LoggingConfig::from_env(&config.logging, cli.verbose) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("Failed to configure logging: {e}");
            return ExitCode::FAILURE;
        },
    };
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code(&e)
        },
    }
}

/// Maps an error to a process exit code by its ledger error kind.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>().map(Error::kind) {
        Some(ErrorKind::Validation) => ExitCode::from(2),
        Some(ErrorKind::NotFound) => ExitCode::from(3),
        Some(ErrorKind::Conflict) => ExitCode::from(4),
        Some(ErrorKind::Storage) | None => ExitCode::FAILURE,
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: LedgerConfig) -> anyhow::Result<()> {
    let ctx = CommandContext::new(config, cli.format);

    match cli.command {
        Commands::Init => commands::cmd_init(&ctx),

        Commands::Add {
            id,
            file,
            content,
            reason,
            author,
            tags,
            env,
            metrics,
            actor,
        } => commands::cmd_add(
            &ctx,
            &id,
            commands::AddArgs {
                file,
                content,
                reason,
                author,
                tags,
                env,
                metrics,
                actor,
            },
        ),

        Commands::Get { id, reference } => commands::cmd_get(&ctx, &id, reference.as_deref()),

        Commands::History { id } => commands::cmd_history(&ctx, &id),

        Commands::Diff { id, from, to, mode } => commands::cmd_diff(&ctx, &id, &from, &to, mode),

        Commands::Status => commands::cmd_status(&ctx),

        Commands::Label { action } => commands::cmd_label(&ctx, action),

        Commands::Export { output } => commands::cmd_export(&ctx, output.as_deref()),

        Commands::Demo => commands::cmd_demo(&ctx),

        Commands::RebuildLabels { check } => commands::cmd_rebuild_labels(&ctx, check),
    }
}

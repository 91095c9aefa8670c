//! CLI parser and dispatch to command-specific modules.

mod download;
mod export;
mod helpers;
mod listen;
mod organize;
mod provision;
mod recover;
mod status;
mod submit;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "docbatch")]
#[command(about = "Batch PDF document-analysis pipeline")]
#[command(version)]
pub struct Cli {
    /// Settings file path (default: docbatch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Partition loose PDFs in the source bucket into batch prefixes
    Organize {
        /// Plan only, move nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Create one dedicated bucket per batch and copy its files in
    Provision,

    /// Submit analysis jobs for a batch (or every batch)
    Submit {
        /// Batch prefix to submit, e.g. batch-1/
        prefix: Option<String>,
        /// Submit every batch prefix in the bucket
        #[arg(long)]
        all: bool,
    },

    /// Consume completion notifications and write result documents
    Listen {
        /// Keep polling after the queue drains
        #[arg(short, long)]
        daemon: bool,
        /// Long-poll wait per receive, in seconds
        #[arg(short, long, default_value = "20")]
        wait: u32,
        /// Consecutive empty polls before exiting (ignored with --daemon)
        #[arg(long, default_value = "3")]
        idle_polls: u32,
    },

    /// Re-query stuck jobs and write any results the service still holds
    Recover {
        /// Apply fixes (without this, only report what would happen)
        #[arg(long)]
        confirm: bool,
    },

    /// Download result documents to a local directory
    Download {
        /// Restrict to one batch prefix, e.g. batch-1/
        #[arg(short, long)]
        batch: Option<String>,
        /// Destination directory
        #[arg(short, long, default_value = "results")]
        dest: PathBuf,
    },

    /// Export downloaded result documents to CSV views for review
    Export {
        /// Directory of downloaded result documents
        #[arg(short, long, default_value = "results")]
        input: PathBuf,
        /// Destination directory
        #[arg(short, long, default_value = "export")]
        dest: PathBuf,
    },

    /// Summarize tracked jobs
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Organize { dry_run } => organize::cmd_organize(&settings, dry_run).await,
        Commands::Provision => provision::cmd_provision(&settings).await,
        Commands::Submit { prefix, all } => submit::cmd_submit(&settings, prefix, all).await,
        Commands::Listen {
            daemon,
            wait,
            idle_polls,
        } => listen::cmd_listen(&settings, daemon, wait, idle_polls).await,
        Commands::Recover { confirm } => recover::cmd_recover(&settings, confirm).await,
        Commands::Download { batch, dest } => {
            download::cmd_download(&settings, batch.as_deref(), &dest).await
        }
        Commands::Export { input, dest } => export::cmd_export(&input, &dest).await,
        Commands::Status => status::cmd_status(&settings).await,
    }
}

//! Staffsync keeps the employee contact sheet and the contact store in step.
//!
//! # Usage
//!
//! ```text
//! staffsync serve
//! staffsync sync [--json]
//! staffsync add --name <name> --email <email> [--department <d>] [--phone <p>]
//! staffsync list [--department <d>] [--json]
//! staffsync mirror <event.json>
//! ```
//!
//! Every command takes `--config <path>`; without it the config comes from
//! `~/.staffsync/config.yaml` or the environment.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{add::AddArgs, list::ListArgs, mirror::MirrorArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "staffsync",
    version,
    about = "Sync employee contacts between a Google Sheet and a Supabase table",
    long_about = None,
)]
struct Cli {
    /// Path to a YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP daemon (intake, listing, reconcile, mirror).
    Serve,

    /// Run one full reconciliation between the sheet and the store.
    Sync(SyncArgs),

    /// Add one employee to both the sheet and the store.
    Add(AddArgs),

    /// List employees from the store.
    List(ListArgs),

    /// Apply one store change event to the sheet.
    Mirror(MirrorArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Serve => commands::serve(config),
        Commands::Sync(args) => args.run(config),
        Commands::Add(args) => args.run(config),
        Commands::List(args) => args.run(config),
        Commands::Mirror(args) => args.run(config),
    }
}

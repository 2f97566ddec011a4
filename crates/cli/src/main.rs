//! Batch front end for the character progression engine.
//!
//! Run with: `character <command>`. The roster location and content directory
//! come from `ROSTER_PATH` / `CONTENT_DIR` (a `.env` file is honored) and can
//! be overridden per invocation.

mod commands;
mod config;
mod prompt;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{
    Allocate, Create, Delete, ImportSheet, LevelUp, List, Session, SetMeta, Show, Validate,
};
use config::CliConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Character sheets with tiered class, profession and race progression
#[derive(Parser)]
#[command(name = "character")]
#[command(about = "Manage character sheets and their progression", long_about = None)]
#[command(version)]
struct Cli {
    /// Roster file (overrides ROSTER_PATH)
    #[arg(long, global = true, value_name = "FILE")]
    roster: Option<PathBuf>,

    /// Content directory (overrides CONTENT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    content: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create a character
    Create(Create),

    /// Show a character
    Show(Show),

    /// List stored characters
    List(List),

    /// Level characters up
    LevelUp(LevelUp),

    /// Spend free points
    Allocate(Allocate),

    /// Set a meta attribute
    Set(SetMeta),

    /// Audit a character's stats against its progression
    Validate(Validate),

    /// Reverse-engineer a character sheet
    ImportSheet(ImportSheet),

    /// Delete a character
    Delete(Delete),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for ROSTER_PATH and CONTENT_DIR)
    let _ = dotenvy::dotenv();
    setup_logging();

    let cli = Cli::parse();
    let mut config = CliConfig::from_env();
    if let Some(roster) = cli.roster {
        config.roster_path = roster;
    }
    if let Some(content) = cli.content {
        config.content_dir = Some(content);
    }
    let session = Session::open(&config)?;

    match cli.command {
        Command::Create(cmd) => cmd.execute(&session),
        Command::Show(cmd) => cmd.execute(&session),
        Command::List(cmd) => cmd.execute(&session),
        Command::LevelUp(cmd) => cmd.execute(&session),
        Command::Allocate(cmd) => cmd.execute(&session),
        Command::Set(cmd) => cmd.execute(&session),
        Command::Validate(cmd) => cmd.execute(&session),
        Command::ImportSheet(cmd) => cmd.execute(&session),
        Command::Delete(cmd) => cmd.execute(&session),
    }
}

/// Logs to stderr; `RUST_LOG` overrides the default `info` level.
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

//! choir — CHOIR participant account CLI.
//!
//! # Usage
//!
//! ```text
//! choir [--mock] config init --server-url <url> --site <site> --account <id> [--token-env VAR]
//! choir [--mock] config show
//! choir [--mock] account show [--json] [--no-wait]
//! choir [--mock] account update [--given-name N] [--family-name N] [--email E] [--phone P] [--clear-phone]
//! choir [--mock] account sign-out
//! choir [--mock] account unenroll
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{account::AccountCommand, config::ConfigCommand};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "choir",
    version,
    about = "View and update your CHOIR participant account",
    long_about = None,
)]
struct Cli {
    /// Use an in-memory participant service instead of the configured site.
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or inspect ~/.choir/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show, update or tear down the signed-in participant account.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Config { command } => commands::config::run(command),
        Commands::Account { command } => commands::account::run(command, cli.mock),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Agora CLI - run AI personality debates from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Run a full debate and judge it
//! agora run "Should homework be banned?" --rounds 2 --winner "The Scientist"
//!
//! # Inspect a persistent registry
//! agora personalities --database sqlite:agora.db
//! agora leaderboard --database sqlite:agora.db
//!
//! # Show version and effective configuration
//! agora info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{info, personalities, run};

/// Agora - multi-round debates between AI personalities
#[derive(Parser)]
#[command(
    name = "agora",
    version,
    about = "Agora CLI - AI personality debates",
    long_about = "Agora stages structured, multi-round debates between AI personalities.\n\n\
                  Debates can be voted on and judged; every verdict feeds the\n\
                  personalities' statistics and the leaderboard."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a complete debate on a topic
    #[command(name = "run")]
    Run(run::RunArgs),

    /// List the registered personalities
    #[command(name = "personalities")]
    Personalities(personalities::ListArgs),

    /// Show the personality leaderboard
    #[command(name = "leaderboard")]
    Leaderboard(personalities::ListArgs),

    /// Show version and configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Personalities(args) => personalities::list(args).await,
        Commands::Leaderboard(args) => personalities::leaderboard(args).await,
        Commands::Info(args) => info::run(args),
    };
    if let Err(e) = &outcome {
        print_error(&format!("{:#}", e));
    }
    outcome
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

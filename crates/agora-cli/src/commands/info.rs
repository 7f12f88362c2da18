//! Info command - Show version and effective configuration
//!
//! Usage:
//! ```bash
//! agora info
//! ```

use agora_core::default_personalities;
use agora_debate::DebateConfig;
use agora_llm::LlmConfig;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let llm = LlmConfig::from_env().context("Invalid LLM configuration")?;
    let debate = DebateConfig::from_env();

    println!("{}", "Agora - AI Personality Debates".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Argument Generator:".bold());
    println!("  {} {}", "Provider:".dimmed(), llm.provider.as_str().green());
    println!("  {} {}", "Model:".dimmed(), llm.model);
    println!("  {} {}s", "Request timeout:".dimmed(), llm.request_timeout.as_secs());
    println!("  {} {}", "Circuit breaker:".dimmed(), on_off(llm.circuit_breaker));
    match llm.validate() {
        Ok(()) => println!("  {} configuration valid", "✓".green()),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }
    println!();

    println!("{}", "Debate Engine:".bold());
    println!("  {} {}", "Rounds per debate:".dimmed(), debate.max_rounds);
    println!(
        "  {} {}-{} chars",
        "Argument length:".dimmed(),
        debate.min_argument_length,
        debate.max_argument_length
    );
    println!("  {} {}s", "Round timeout:".dimmed(), debate.round_timeout.as_secs());
    println!("  {} {}", "Worker pool:".dimmed(), debate.worker_pool_size);
    println!();

    println!("{}", "Storage:".bold());
    match std::env::var("DATABASE_URL") {
        Ok(url) => println!("  {} {}", "Database:".dimmed(), url),
        Err(_) => println!("  {} in-memory (set DATABASE_URL or --database)", "Database:".dimmed()),
    }
    println!();

    println!("{}", "Default Personalities:".bold());
    for p in default_personalities() {
        println!("  {} {} {}", "•".cyan(), p.name.green(), format!("({})", p.debate_style).dimmed());
    }
    println!();

    Ok(())
}

fn on_off(enabled: bool) -> colored::ColoredString {
    if enabled {
        "on".green()
    } else {
        "off".yellow()
    }
}

//! Run a complete debate from the terminal

use agora_core::{analytics, Argument, Debate};
use agora_debate::{AdvanceOutcome, DebateConfig, RoundReport};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::personalities::leaderboard_table;
use super::{open_engine, StorageArgs};
use crate::{print_info, print_success, print_warning};

#[derive(Args)]
pub struct RunArgs {
    /// Debate topic (10-500 characters)
    pub topic: String,

    /// Number of rounds (defaults to AGORA_MAX_ROUNDS or 3)
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Declare this personality the winner once the rounds are over
    #[arg(short, long)]
    pub winner: Option<String>,

    /// Judge's reasoning; generated when omitted
    #[arg(long, requires = "winner")]
    pub reasoning: Option<String>,

    /// Creator recorded on the debate
    #[arg(long)]
    pub creator: Option<String>,

    #[command(flatten)]
    pub storage: StorageArgs,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = DebateConfig::from_env();
    if let Some(rounds) = args.rounds {
        if rounds == 0 {
            bail!("--rounds must be at least 1");
        }
        config = config.with_max_rounds(rounds);
    }

    let engine = open_engine(&args.storage, config).await?;
    print_info(&format!("Argument generator: {}", engine.generator_name()));

    let debate = engine
        .create(&args.topic, args.creator.clone())
        .await
        .context("Failed to create debate")?;
    print_header(&debate);

    let report = engine.start(debate.id).await.context("Failed to start debate")?;
    print_round(&report);

    let mut debate = loop {
        match engine
            .advance_round(debate.id)
            .await
            .context("Failed to advance debate")?
        {
            AdvanceOutcome::Round(report) => print_round(&report),
            AdvanceOutcome::Ended(debate) => break debate,
        }
    };
    print_success(&format!(
        "Debate completed after {} rounds with {} arguments",
        debate.max_rounds,
        debate.arguments.len()
    ));

    match &args.winner {
        Some(winner) => {
            debate = engine
                .judge(debate.id, winner, args.reasoning.clone(), Some("cli".to_string()))
                .await
                .with_context(|| format!("Failed to judge debate for '{}'", winner))?;
            println!();
            print_success(&format!("Winner: {}", winner.bold()));
            if let Some(decision) = &debate.judge_decision {
                println!("  {} {}", "Reasoning:".dimmed(), decision);
            }
        }
        None => print_warning("No --winner given, debate left unjudged"),
    }

    print_analytics(&debate);

    if debate.winner.is_some() {
        println!();
        println!("{}", "Leaderboard".bold().cyan());
        println!("{}", leaderboard_table(&engine.registry().leaderboard().await?));
    }
    Ok(())
}

fn print_header(debate: &Debate) {
    println!();
    println!("{}", "Agora Debate".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!("  {} {}", "Topic:".dimmed(), debate.topic.bold());
    println!("  {} {}", "ID:".dimmed(), debate.id);
    println!("  {} {}", "Rounds:".dimmed(), debate.max_rounds);
    println!("  {} {}", "Participants:".dimmed(), debate.participants.join(", "));
}

fn print_round(report: &RoundReport) {
    println!();
    println!(
        "{} {} {}",
        "──".cyan(),
        format!("Round {}/{}", report.round, report.debate.max_rounds).bold(),
        "──".cyan()
    );
    for argument in &report.arguments {
        print_argument(argument);
    }
}

fn print_argument(argument: &Argument) {
    println!();
    println!("{}", argument.personality_id.bold().yellow());
    println!("  {}", argument.content);
}

fn print_analytics(debate: &Debate) {
    let stats = analytics::analyze(debate);

    println!();
    println!("{}", "Analytics".bold().cyan());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Personality").fg(Color::Cyan),
            Cell::new("Arguments").fg(Color::Cyan),
            Cell::new("Votes").fg(Color::Cyan),
            Cell::new("Score").fg(Color::Cyan),
        ]);

    for name in &debate.participants {
        let arguments = stats.arguments_by_personality.get(name).copied().unwrap_or(0);
        let votes = stats.vote_distribution.get(name).copied().unwrap_or(0);
        let score = stats.scores.get(name).copied().unwrap_or(0.0);
        let label = if debate.winner.as_deref() == Some(name.as_str()) {
            Cell::new(format!("{} ★", name)).fg(Color::Green)
        } else {
            Cell::new(name)
        };
        table.add_row(vec![
            label,
            Cell::new(arguments),
            Cell::new(votes),
            Cell::new(format!("{:.2}", score)),
        ]);
    }
    println!("{table}");

    println!(
        "  {} {:.2}  {} {:.1}  {} {:.2}",
        "Engagement:".dimmed(),
        stats.engagement.engagement_score,
        "Avg length:".dimmed(),
        stats.engagement.avg_argument_length,
        "Duration (min):".dimmed(),
        stats.duration_minutes
    );
    println!("  {} {}", "Summary:".dimmed(), stats.summary);
}

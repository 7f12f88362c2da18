//! Personality listing and leaderboard

use agora_core::{LeaderboardEntry, Personality};
use agora_debate::DebateConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::{open_engine, StorageArgs};
use crate::print_info;

#[derive(Args)]
pub struct ListArgs {
    /// Show system prompts as well
    #[arg(long)]
    pub prompts: bool,

    #[command(flatten)]
    pub storage: StorageArgs,
}

pub async fn list(args: ListArgs) -> Result<()> {
    let engine = open_engine(&args.storage, DebateConfig::from_env()).await?;
    let personalities = engine.registry().list_all().await?;

    println!();
    println!("{}", "Registered Personalities".bold().cyan());
    println!("{}", personality_table(&personalities, args.prompts));
    print_info(&format!("{} personalities", personalities.len()));
    Ok(())
}

pub async fn leaderboard(args: ListArgs) -> Result<()> {
    let engine = open_engine(&args.storage, DebateConfig::from_env()).await?;
    let entries = engine.registry().leaderboard().await?;

    println!();
    println!("{}", "Leaderboard".bold().cyan());
    println!("{}", leaderboard_table(&entries));
    if entries.iter().all(|e| e.total_debates == 0) {
        print_info("No judged debates yet");
    }
    Ok(())
}

fn personality_table(personalities: &[Personality], prompts: bool) -> Table {
    let mut header = vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Style").fg(Color::Cyan),
        Cell::new("Traits").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ];
    if prompts {
        header.push(Cell::new("System Prompt").fg(Color::Cyan));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);

    for p in personalities {
        let mut row = vec![
            Cell::new(&p.name).fg(Color::Green),
            Cell::new(&p.debate_style),
            Cell::new(p.personality_traits.join(", ")),
            Cell::new(&p.description),
        ];
        if prompts {
            row.push(Cell::new(&p.system_prompt));
        }
        table.add_row(row);
    }
    table
}

/// Ranked table, best first
pub fn leaderboard_table(entries: &[LeaderboardEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Wins").fg(Color::Cyan),
            Cell::new("Debates").fg(Color::Cyan),
            Cell::new("Win Rate").fg(Color::Cyan),
            Cell::new("Avg Votes").fg(Color::Cyan),
            Cell::new("Arguments").fg(Color::Cyan),
        ]);

    for (rank, e) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&e.name).fg(Color::Green),
            Cell::new(e.wins),
            Cell::new(e.total_debates),
            Cell::new(format!("{:.1}%", e.win_rate)),
            Cell::new(format!("{:.2}", e.average_votes)),
            Cell::new(e.total_arguments),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::default_personalities;

    #[test]
    fn test_personality_table_lists_every_name() {
        let personalities = default_personalities();
        let rendered = personality_table(&personalities, false).to_string();
        for p in &personalities {
            assert!(rendered.contains(&p.name));
        }
        assert!(!rendered.contains("System Prompt"));
    }

    #[test]
    fn test_leaderboard_table_ranks_in_order() {
        let entries: Vec<LeaderboardEntry> = default_personalities()
            .iter()
            .map(|p| p.leaderboard_entry())
            .collect();
        let rendered = leaderboard_table(&entries).to_string();
        let first = rendered.find(&entries[0].name).unwrap();
        let last = rendered.find(&entries[entries.len() - 1].name).unwrap();
        assert!(first < last);
    }
}

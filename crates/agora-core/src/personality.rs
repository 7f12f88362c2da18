//! Debate participants and their running statistics

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::analytics::round2;
use crate::error::RuleViolation;

/// A named debater with a fixed profile and accumulated results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Personality {
    /// Unique key
    pub name: String,
    pub description: String,
    pub personality_traits: Vec<String>,
    pub debate_style: String,
    /// Behavioural instructions handed to the generator
    pub system_prompt: String,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub total_debates: u64,
    #[serde(default)]
    pub total_arguments: u64,
    #[serde(default)]
    pub average_votes: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one judged debate for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebateResult {
    pub won: bool,
    pub votes_received: u64,
    pub arguments_contributed: u64,
}

impl Personality {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        traits: Vec<String>,
        debate_style: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            personality_traits: traits,
            debate_style: debate_style.into(),
            system_prompt: system_prompt.into(),
            wins: 0,
            total_debates: 0,
            total_arguments: 0,
            average_votes: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Placeholder profile for a participant no longer in the registry
    pub fn bare(name: impl Into<String>) -> Self {
        let name = name.into();
        let prompt = format!("You are {}, a participant in a structured debate.", name);
        Self::new(name, String::new(), Vec::new(), String::new(), prompt)
    }

    /// Field rules for creating or editing a personality
    pub fn validate(&self) -> Result<(), RuleViolation> {
        check_len("name", &self.name, 3, 50)?;
        check_len("description", &self.description, 20, 500)?;
        check_len("system_prompt", &self.system_prompt, 50, 2000)?;
        if self.debate_style.trim().is_empty() {
            return Err(RuleViolation::invalid("debate_style is required"));
        }
        let traits = self
            .personality_traits
            .iter()
            .filter(|t| !t.trim().is_empty())
            .count();
        if traits < 2 {
            return Err(RuleViolation::invalid(
                "at least 2 personality traits are required",
            ));
        }
        Ok(())
    }

    /// Fold one judged debate into the running statistics.
    ///
    /// The vote average is a running mean over arguments contributed, kept at
    /// full precision; reports round it.
    pub fn record_result(&mut self, result: DebateResult) {
        let old_n = self.total_arguments;
        let new_n = old_n + result.arguments_contributed;

        self.total_debates += 1;
        if result.won {
            self.wins += 1;
        }
        self.total_arguments = new_n;
        if new_n > 0 {
            let sum = self.average_votes * old_n as f64 + result.votes_received as f64;
            self.average_votes = sum / new_n as f64;
        }
        self.updated_at = Utc::now();
    }

    pub fn reset_stats(&mut self) {
        self.wins = 0;
        self.total_debates = 0;
        self.total_arguments = 0;
        self.average_votes = 0.0;
        self.updated_at = Utc::now();
    }

    pub fn apply_update(&mut self, update: PersonalityUpdate) -> Result<(), RuleViolation> {
        let mut next = self.clone();
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(traits) = update.personality_traits {
            next.personality_traits = traits;
        }
        if let Some(style) = update.debate_style {
            next.debate_style = style;
        }
        if let Some(prompt) = update.system_prompt {
            next.system_prompt = prompt;
        }
        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    /// Percentage of debates won, two decimals
    pub fn win_rate(&self) -> f64 {
        if self.total_debates == 0 {
            return 0.0;
        }
        round2(self.wins as f64 / self.total_debates as f64 * 100.0)
    }

    pub fn losses(&self) -> u64 {
        self.total_debates.saturating_sub(self.wins)
    }

    pub fn arguments_per_debate(&self) -> f64 {
        if self.total_debates == 0 {
            return 0.0;
        }
        round2(self.total_arguments as f64 / self.total_debates as f64)
    }

    pub fn stats(&self) -> PersonalityStats {
        PersonalityStats {
            name: self.name.clone(),
            wins: self.wins,
            total_debates: self.total_debates,
            total_arguments: self.total_arguments,
            win_rate: self.win_rate(),
            average_votes: round2(self.average_votes),
            losses: self.losses(),
            arguments_per_debate: self.arguments_per_debate(),
        }
    }

    pub fn leaderboard_entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            name: self.name.clone(),
            description: self.description.clone(),
            personality_traits: self.personality_traits.clone(),
            debate_style: self.debate_style.clone(),
            wins: self.wins,
            total_debates: self.total_debates,
            total_arguments: self.total_arguments,
            win_rate: self.win_rate(),
            average_votes: round2(self.average_votes),
            updated_at: self.updated_at,
        }
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), RuleViolation> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(RuleViolation::invalid(format!("{} is required", field)));
    }
    if len < min || len > max {
        return Err(RuleViolation::invalid(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

/// Partial edit of a personality profile; statistics are not editable
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PersonalityUpdate {
    pub description: Option<String>,
    pub personality_traits: Option<Vec<String>>,
    pub debate_style: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PersonalityStats {
    pub name: String,
    pub wins: u64,
    pub total_debates: u64,
    pub total_arguments: u64,
    pub win_rate: f64,
    pub average_votes: f64,
    pub losses: u64,
    pub arguments_per_debate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub name: String,
    pub description: String,
    pub personality_traits: Vec<String>,
    pub debate_style: String,
    pub wins: u64,
    pub total_debates: u64,
    pub total_arguments: u64,
    pub win_rate: f64,
    pub average_votes: f64,
    pub updated_at: DateTime<Utc>,
}

/// Ranking key for top-N queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankBy {
    #[default]
    Wins,
    TotalDebates,
    AverageVotes,
}

impl RankBy {
    /// Unknown keys rank by wins
    pub fn from_key(key: &str) -> Self {
        match key {
            "total_debates" => Self::TotalDebates,
            "average_votes" => Self::AverageVotes,
            _ => Self::Wins,
        }
    }

    fn compare(&self, a: &Personality, b: &Personality) -> Ordering {
        match self {
            Self::Wins => b.wins.cmp(&a.wins),
            Self::TotalDebates => b.total_debates.cmp(&a.total_debates),
            Self::AverageVotes => b
                .average_votes
                .partial_cmp(&a.average_votes)
                .unwrap_or(Ordering::Equal),
        }
    }
}

/// Sort by `key` descending, then by total debates descending
pub fn rank(personalities: &mut [Personality], key: RankBy) {
    personalities.sort_by(|a, b| {
        key.compare(a, b)
            .then_with(|| b.total_debates.cmp(&a.total_debates))
    });
}

/// Wins descending, then total debates descending
pub fn leaderboard(mut personalities: Vec<Personality>) -> Vec<LeaderboardEntry> {
    rank(&mut personalities, RankBy::Wins);
    personalities
        .iter()
        .map(Personality::leaderboard_entry)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_personalities;

    fn named(name: &str, wins: u64, total: u64) -> Personality {
        let mut p = Personality::bare(name);
        p.wins = wins;
        p.total_debates = total;
        p
    }

    #[test]
    fn test_record_result_running_average() {
        let mut p = Personality::bare("The Tester");
        p.record_result(DebateResult {
            won: true,
            votes_received: 4,
            arguments_contributed: 2,
        });
        assert_eq!(p.total_debates, 1);
        assert_eq!(p.wins, 1);
        assert_eq!(p.total_arguments, 2);
        assert_eq!(p.average_votes, 2.0);

        p.record_result(DebateResult {
            won: false,
            votes_received: 1,
            arguments_contributed: 1,
        });
        // (2.0 * 2 + 1) / 3
        assert!((p.average_votes - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(p.stats().average_votes, 1.67);
        assert_eq!(p.leaderboard_entry().average_votes, 1.67);
        assert_eq!(p.losses(), 1);
        assert_eq!(p.win_rate(), 50.0);
        assert_eq!(p.arguments_per_debate(), 1.5);
    }

    #[test]
    fn test_running_average_does_not_drift() {
        let mut p = Personality::bare("The Tester");
        let mut votes = 0u64;
        for round in 0..300u64 {
            let received = round % 3;
            votes += received;
            p.record_result(DebateResult {
                won: false,
                votes_received: received,
                arguments_contributed: 1,
            });
        }
        let exact = votes as f64 / 300.0;
        assert!((p.average_votes - exact).abs() < 1e-9);
        assert_eq!(p.stats().average_votes, round2(exact));
    }

    #[test]
    fn test_record_result_without_arguments() {
        let mut p = Personality::bare("The Silent");
        p.record_result(DebateResult {
            won: false,
            votes_received: 0,
            arguments_contributed: 0,
        });
        assert_eq!(p.total_debates, 1);
        assert_eq!(p.average_votes, 0.0);
    }

    #[test]
    fn test_reset_stats() {
        let mut p = named("The Veteran", 5, 9);
        p.total_arguments = 27;
        p.average_votes = 3.2;
        p.reset_stats();
        assert_eq!(p.stats().total_debates, 0);
        assert_eq!(p.win_rate(), 0.0);
        assert_eq!(p.arguments_per_debate(), 0.0);
    }

    #[test]
    fn test_leaderboard_order() {
        let board = leaderboard(vec![
            named("Alpha", 1, 5),
            named("Bravo", 3, 4),
            named("Charlie", 1, 9),
        ]);
        let names: Vec<_> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bravo", "Charlie", "Alpha"]);
        assert_eq!(board[0].win_rate, 75.0);
    }

    #[test]
    fn test_rank_by_key() {
        let mut list = vec![named("Alpha", 1, 5), named("Bravo", 3, 4)];
        list[0].average_votes = 9.0;
        rank(&mut list, RankBy::from_key("average_votes"));
        assert_eq!(list[0].name, "Alpha");
        rank(&mut list, RankBy::from_key("total_debates"));
        assert_eq!(list[0].name, "Alpha");
        rank(&mut list, RankBy::from_key("nonsense"));
        assert_eq!(list[0].name, "Bravo");
    }

    #[test]
    fn test_validation() {
        for p in default_personalities() {
            p.validate().unwrap();
        }

        let mut p = default_personalities().remove(0);
        p.name = "Ab".into();
        assert!(p.validate().is_err());

        let mut p = default_personalities().remove(0);
        p.personality_traits = vec!["lonely".into()];
        assert!(p.validate().is_err());

        let mut p = default_personalities().remove(0);
        p.system_prompt = "Too short.".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_apply_update_is_all_or_nothing() {
        let mut p = default_personalities().remove(1);
        let before = p.clone();

        let bad = PersonalityUpdate {
            description: Some("A perfectly reasonable new description".into()),
            personality_traits: Some(vec![]),
            ..Default::default()
        };
        assert!(p.apply_update(bad).is_err());
        assert_eq!(p, before);

        let good = PersonalityUpdate {
            debate_style: Some("Meta-analyses first, anecdotes never".into()),
            ..Default::default()
        };
        p.apply_update(good).unwrap();
        assert_eq!(p.debate_style, "Meta-analyses first, anecdotes never");
        assert_eq!(p.name, before.name);
    }
}

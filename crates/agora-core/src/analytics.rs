//! Derived views over a debate: scores, engagement, summaries and keywords.
//!
//! Nothing here is cached or written back; every call recomputes from the
//! debate's own arguments and votes.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::debate::{Debate, DebateStatus};

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "this", "that", "these", "those", "is", "are", "was", "were", "be", "been", "have", "has",
    "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "can",
    "shall", "it", "its", "he", "she", "they", "we", "you", "i", "me", "him", "her", "them", "us",
];

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn word_pattern() -> Option<&'static Regex> {
    static WORD: OnceLock<Option<Regex>> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\b[a-zA-Z]{3,}\b").ok())
        .as_ref()
}

/// Most frequent non-stop-words of three or more letters, ties broken by first use
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let Some(pattern) = word_pattern() else {
        return Vec::new();
    };
    let lowered = text.to_lowercase();

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for word in pattern.find_iter(&lowered).map(|m| m.as_str()) {
        if STOP_WORDS.contains(&word) {
            continue;
        }
        match index.get(word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word.to_string(), counts.len());
                counts.push((word.to_string(), 1));
            }
        }
    }

    // Stable sort keeps first-occurrence order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word)
        .collect()
}

/// Participation and vote score per participant that has spoken.
///
/// `10 * arguments + 5 * votes + 20 * votes / arguments`, where votes are the
/// argument-level votes on that participant's arguments.
pub fn participant_scores(debate: &Debate) -> BTreeMap<String, f64> {
    let mut tally: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for argument in &debate.arguments {
        let entry = tally.entry(argument.personality_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += argument.votes;
    }

    tally
        .into_iter()
        .map(|(name, (args, votes))| {
            let args_f = args as f64;
            let votes_f = votes as f64;
            let quality = if args > 0 { votes_f / args_f * 20.0 } else { 0.0 };
            (name.to_string(), round2(args_f * 10.0 + votes_f * 5.0 + quality))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EngagementMetrics {
    pub engagement_score: f64,
    pub avg_argument_length: f64,
    /// Fewest arguments by one participant over the most, as a percentage
    pub participation_rate: f64,
}

pub fn engagement(debate: &Debate) -> EngagementMetrics {
    if debate.arguments.is_empty() {
        return EngagementMetrics::default();
    }

    let total_chars: usize = debate
        .arguments
        .iter()
        .map(|a| a.content.chars().count())
        .sum();
    let avg_len = total_chars as f64 / debate.arguments.len() as f64;

    let per_personality = arguments_by_personality(debate);
    let max = per_personality.values().copied().max().unwrap_or(0);
    let min = per_personality.values().copied().min().unwrap_or(0);
    let participation_rate = if max > 0 {
        min as f64 / max as f64 * 100.0
    } else {
        0.0
    };

    let vote_factor = (debate.total_votes as f64 / 10.0).min(10.0);
    let length_factor = (avg_len / 100.0).min(10.0);
    let score = (vote_factor + length_factor + participation_rate / 10.0) / 3.0;

    EngagementMetrics {
        engagement_score: round2(score),
        avg_argument_length: round2(avg_len),
        participation_rate: round2(participation_rate),
    }
}

pub fn summary(debate: &Debate) -> String {
    if debate.arguments.is_empty() {
        return "No arguments have been made in this debate yet.".to_string();
    }

    let mut text = format!(
        "This debate on '{}' featured {} AI personalities exchanging {} arguments across {} rounds.",
        debate.topic,
        debate.participants.len(),
        debate.arguments.len(),
        debate.current_round
    );
    if let Some(winner) = &debate.winner {
        text.push_str(&format!(" The debate was won by {}.", winner));
    }
    if debate.total_votes > 0 {
        text.push_str(&format!(" The community cast {} votes.", debate.total_votes));
    }
    text
}

fn arguments_by_personality(debate: &Debate) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for argument in &debate.arguments {
        *counts.entry(argument.personality_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Full analytics report for one debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DebateAnalytics {
    pub total_arguments: usize,
    pub arguments_by_round: BTreeMap<u32, u64>,
    pub arguments_by_personality: BTreeMap<String, u64>,
    pub total_votes: u64,
    pub vote_distribution: BTreeMap<String, u64>,
    /// Zero until the debate is completed or judged
    pub duration_minutes: f64,
    pub scores: BTreeMap<String, f64>,
    pub engagement: EngagementMetrics,
    pub summary: String,
}

pub fn analyze(debate: &Debate) -> DebateAnalytics {
    let mut by_round = BTreeMap::new();
    for argument in &debate.arguments {
        *by_round.entry(argument.round_number).or_insert(0) += 1;
    }

    let duration_minutes = match debate.status {
        DebateStatus::Completed | DebateStatus::Judged => {
            let elapsed = debate.updated_at - debate.created_at;
            round2(elapsed.num_milliseconds().max(0) as f64 / 60_000.0)
        }
        _ => 0.0,
    };

    DebateAnalytics {
        total_arguments: debate.arguments.len(),
        arguments_by_round: by_round,
        arguments_by_personality: arguments_by_personality(debate),
        total_votes: debate.total_votes,
        vote_distribution: debate.votes.clone(),
        duration_minutes,
        scores: participant_scores(debate),
        engagement: engagement(debate),
        summary: summary(debate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::Argument;

    fn debate_with(args: &[(&str, &str, u64)]) -> Debate {
        let mut names: Vec<String> = Vec::new();
        for (name, _, _) in args {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        let mut debate = Debate::new("Should cities ban cars?", None, names, 3).unwrap();
        for (name, content, votes) in args {
            let mut arg = Argument::new(*name, *content, 1);
            arg.votes = *votes;
            debate.arguments.push(arg);
        }
        debate
    }

    #[test]
    fn test_empty_debate() {
        let debate = debate_with(&[]);
        assert!(participant_scores(&debate).is_empty());
        assert_eq!(engagement(&debate), EngagementMetrics::default());
        assert_eq!(summary(&debate), "No arguments have been made in this debate yet.");
    }

    #[test]
    fn test_participant_scores() {
        let debate = debate_with(&[("A", "first", 2), ("A", "second", 1), ("B", "only", 0)]);
        let scores = participant_scores(&debate);
        // A: 2 args, 3 votes -> 20 + 15 + 30
        assert_eq!(scores["A"], 65.0);
        assert_eq!(scores["B"], 10.0);
    }

    #[test]
    fn test_engagement() {
        let long = "x".repeat(200);
        let mut debate = debate_with(&[("A", &long, 0), ("A", &long, 0), ("B", &long, 0)]);
        debate.total_votes = 20;

        let metrics = engagement(&debate);
        assert_eq!(metrics.avg_argument_length, 200.0);
        assert_eq!(metrics.participation_rate, 50.0);
        // (2 + 2 + 5) / 3
        assert_eq!(metrics.engagement_score, 3.0);
    }

    #[test]
    fn test_summary_mentions_winner_and_votes() {
        let mut debate = debate_with(&[("A", "hello there", 0), ("B", "general kenobi", 0)]);
        debate.winner = Some("B".into());
        debate.total_votes = 4;

        assert_eq!(
            summary(&debate),
            "This debate on 'Should cities ban cars?' featured 2 AI personalities exchanging 2 arguments across 1 rounds. The debate was won by B. The community cast 4 votes."
        );
    }

    #[test]
    fn test_analyze_counts() {
        let debate = debate_with(&[("A", "one", 0), ("B", "two", 0)]);
        let report = analyze(&debate);
        assert_eq!(report.total_arguments, 2);
        assert_eq!(report.arguments_by_round[&1], 2);
        assert_eq!(report.arguments_by_personality["B"], 1);
        assert_eq!(report.duration_minutes, 0.0);
        assert_eq!(report.vote_distribution.len(), 2);
    }

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords(
            "The climate policy debate: climate matters, and policy shapes the climate.",
            2,
        );
        assert_eq!(keywords, vec!["climate".to_string(), "policy".to_string()]);
        assert!(extract_keywords("", 5).is_empty());
        assert!(extract_keywords("it is to be", 5).is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(66.666_666), 66.67);
    }
}

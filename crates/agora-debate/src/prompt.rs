//! Prompt construction for debaters and the judge

use agora_core::{Argument, Debate, Personality};

use crate::text::preview;

/// How many earlier-round arguments a debater sees
const HISTORY_WINDOW: usize = 8;
const HISTORY_PREVIEW: usize = 150;
/// How many same-round arguments a debater sees
const SAME_ROUND_WINDOW: usize = 2;
const SAME_ROUND_PREVIEW: usize = 100;
/// How many closing arguments the judge sees
const JUDGE_WINDOW: usize = 6;
const JUDGE_PREVIEW: usize = 100;

/// Everything a generator needs to produce one argument
#[derive(Debug, Clone)]
pub struct ArgumentRequest {
    pub personality: Personality,
    pub topic: String,
    pub round: u32,
    /// Rendered "PREVIOUS ROUNDS:" block, empty in round one
    pub history: String,
    /// (speaker, content) of arguments already produced this round, in order
    pub said_this_round: Vec<(String, String)>,
}

impl ArgumentRequest {
    pub fn speaker(&self) -> &str {
        &self.personality.name
    }

    /// User prompt; the personality's system prompt travels separately
    pub fn prompt(&self) -> String {
        let mut sections = vec![format!(
            "DEBATE TOPIC: {}\n{}",
            self.topic,
            round_instruction(self.round)
        )];
        if !self.history.is_empty() {
            sections.push(self.history.clone());
        }
        let same_round = same_round_block(&self.said_this_round);
        if !same_round.is_empty() {
            sections.push(same_round);
        }
        sections.push(format!(
            "As {}, provide your round {} argument. Be specific, compelling, and stay true to your personality.\nArgument:",
            self.speaker(),
            self.round
        ));
        sections.join("\n\n")
    }
}

pub fn round_instruction(round: u32) -> String {
    match round {
        1 => "ROUND 1: Present your opening argument and establish your position.".to_string(),
        2 => "ROUND 2: Respond to previous arguments and strengthen your position.".to_string(),
        n => format!("ROUND {}: Final arguments - make your strongest case.", n),
    }
}

/// The last few arguments from rounds before `round`
pub fn previous_rounds(arguments: &[Argument], round: u32) -> String {
    let lines: Vec<String> = arguments
        .iter()
        .filter(|a| a.round_number < round)
        .map(|a| {
            format!(
                "Round {} - {}: {}...",
                a.round_number,
                a.personality_id,
                preview(&a.content, HISTORY_PREVIEW)
            )
        })
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(HISTORY_WINDOW);
    format!("PREVIOUS ROUNDS:\n{}", lines[start..].join("\n"))
}

fn same_round_block(said: &[(String, String)]) -> String {
    if said.is_empty() {
        return String::new();
    }
    let start = said.len().saturating_sub(SAME_ROUND_WINDOW);
    let mut block = String::from("Other participants in this round have said:");
    for (speaker, content) in &said[start..] {
        block.push_str(&format!(
            "\n- {}: {}...",
            speaker,
            preview(content, SAME_ROUND_PREVIEW)
        ));
    }
    block
}

pub fn judge_prompt(debate: &Debate) -> String {
    let start = debate.arguments.len().saturating_sub(JUDGE_WINDOW);
    let summary: Vec<String> = debate.arguments[start..]
        .iter()
        .map(|a| format!("{}: {}...", a.personality_id, preview(&a.content, JUDGE_PREVIEW)))
        .collect();
    format!(
        "You are an impartial debate judge evaluating arguments on: {}\n\nKey arguments presented:\n{}\n\nProvide a brief analysis of the debate quality and reasoning:",
        debate.topic,
        summary.join("\n")
    )
}

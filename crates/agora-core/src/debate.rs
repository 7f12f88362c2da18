//! The debate aggregate and its lifecycle rules
//!
//! A [`Debate`] moves strictly forward through
//! `created → in_progress → completed → judged`. Every mutator here checks its
//! precondition against the current value and refuses with a [`RuleViolation`]
//! instead of partially applying. Stores re-run these mutators against fresh
//! state inside a compare-and-swap loop, so the checks double as race detection.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::analytics::extract_keywords;
use crate::error::RuleViolation;

/// Rounds per debate unless configured otherwise
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Number of keywords attached to each argument as tags
const ARGUMENT_TAGS: usize = 3;

/// Lifecycle status of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    Created,
    InProgress,
    Completed,
    Judged,
}

impl DebateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Judged => "judged",
        }
    }

    /// Votes are accepted once the debate has started and until it is judged
    pub fn accepts_votes(&self) -> bool {
        matches!(self, Self::InProgress | Self::Completed)
    }
}

impl fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebateStatus {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "judged" => Ok(Self::Judged),
            other => Err(RuleViolation::invalid(format!(
                "unknown debate status '{}'",
                other
            ))),
        }
    }
}

/// A single argument made by one participant in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Argument {
    pub id: Uuid,
    /// Name of the personality that made the argument
    pub personality_id: String,
    pub content: String,
    pub round_number: u32,
    pub timestamp: DateTime<Utc>,
    /// Argument-level votes, distinct from the debate-level tally
    pub votes: u64,
    /// Argument this one replies to (attribution only)
    pub response_to: Option<Uuid>,
    pub tags: Vec<String>,
}

impl Argument {
    pub fn new(personality_id: impl Into<String>, content: impl Into<String>, round_number: u32) -> Self {
        let content = content.into();
        let tags = extract_keywords(&content, ARGUMENT_TAGS);
        Self {
            id: Uuid::new_v4(),
            personality_id: personality_id.into(),
            content,
            round_number,
            timestamp: Utc::now(),
            votes: 0,
            response_to: None,
            tags,
        }
    }
}

/// What an advance-round call should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStep {
    /// Generate this round number
    Generate(u32),
    /// Rounds are exhausted; the debate completes without new arguments
    Complete,
}

/// One debate aggregate: topic, roster, embedded arguments, votes and verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Debate {
    pub id: Uuid,
    pub topic: String,
    pub creator_id: Option<String>,
    pub status: DebateStatus,
    /// Personality names, fixed at creation
    pub participants: Vec<String>,
    /// Append-only, in generation order
    pub arguments: Vec<Argument>,
    pub current_round: u32,
    pub max_rounds: u32,
    /// Debate-level votes per participant
    pub votes: BTreeMap<String, u64>,
    pub total_votes: u64,
    /// Voter id to the participant they voted for
    pub voter_records: BTreeMap<String, String>,
    pub winner: Option<String>,
    pub judge_decision: Option<String>,
    pub judge_id: Option<String>,
    /// Participants whose judged result is not yet in their statistics
    #[serde(default)]
    pub pending_stats: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Debate {
    /// Create a debate in `created` with a snapshot of the roster.
    ///
    /// Duplicate names in `participants` are dropped, keeping first occurrence.
    pub fn new(
        topic: impl Into<String>,
        creator_id: Option<String>,
        participants: Vec<String>,
        max_rounds: u32,
    ) -> Result<Self, RuleViolation> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(RuleViolation::invalid("topic must not be empty"));
        }
        if max_rounds == 0 {
            return Err(RuleViolation::invalid("max_rounds must be at least 1"));
        }

        let mut seen = HashSet::new();
        let participants: Vec<String> = participants
            .into_iter()
            .filter(|name| !name.trim().is_empty() && seen.insert(name.clone()))
            .collect();
        if participants.is_empty() {
            return Err(RuleViolation::invalid(
                "a debate needs at least one participant",
            ));
        }

        let votes = participants.iter().map(|p| (p.clone(), 0)).collect();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            topic,
            creator_id,
            status: DebateStatus::Created,
            participants,
            arguments: Vec::new(),
            current_round: 1,
            max_rounds,
            votes,
            total_votes: 0,
            voter_records: BTreeMap::new(),
            winner: None,
            judge_decision: None,
            judge_id: None,
            pending_stats: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }

    pub fn arguments_in_round(&self, round: u32) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(move |a| a.round_number == round)
    }

    pub fn arguments_by<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Argument> + 'a {
        self.arguments.iter().filter(move |a| a.personality_id == name)
    }

    pub fn votes_for(&self, name: &str) -> u64 {
        self.votes.get(name).copied().unwrap_or(0)
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.voter_records.contains_key(voter_id)
    }

    /// `total_votes` equals the sum of the per-participant tally
    pub fn votes_consistent(&self) -> bool {
        self.votes.values().sum::<u64>() == self.total_votes
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn refuse(&self, action: &'static str) -> RuleViolation {
        RuleViolation::InvalidTransition {
            from: self.status,
            action,
        }
    }

    pub fn ensure_can_start(&self) -> Result<(), RuleViolation> {
        if self.status != DebateStatus::Created {
            return Err(self.refuse("start"));
        }
        Ok(())
    }

    /// `created → in_progress`, appending the round-1 arguments in one step
    pub fn begin(&mut self, round_one: Vec<Argument>) -> Result<(), RuleViolation> {
        self.ensure_can_start()?;
        self.check_round(1, &round_one)?;
        self.arguments.extend(round_one);
        self.current_round = 1;
        self.status = DebateStatus::InProgress;
        self.touch();
        Ok(())
    }

    /// Decide what an advance-round call should do from the current state
    pub fn next_step(&self) -> Result<RoundStep, RuleViolation> {
        if self.status != DebateStatus::InProgress {
            return Err(self.refuse("advance"));
        }
        if self.current_round >= self.max_rounds {
            Ok(RoundStep::Complete)
        } else {
            Ok(RoundStep::Generate(self.current_round + 1))
        }
    }

    /// Append the arguments for `from_round + 1` and move the round pointer.
    ///
    /// Refuses if another caller already advanced past `from_round`.
    pub fn advance(&mut self, from_round: u32, arguments: Vec<Argument>) -> Result<(), RuleViolation> {
        match self.next_step()? {
            RoundStep::Generate(next) if self.current_round == from_round => {
                self.check_round(next, &arguments)?;
                self.arguments.extend(arguments);
                self.current_round = next;
                self.touch();
                Ok(())
            }
            _ => Err(self.refuse("advance")),
        }
    }

    /// `in_progress → completed`
    pub fn complete(&mut self) -> Result<(), RuleViolation> {
        if self.status != DebateStatus::InProgress {
            return Err(self.refuse("end"));
        }
        self.status = DebateStatus::Completed;
        self.touch();
        Ok(())
    }

    pub fn ensure_can_judge(&self, winner: &str) -> Result<(), RuleViolation> {
        match self.status {
            DebateStatus::Judged => return Err(RuleViolation::AlreadyJudged),
            DebateStatus::Created => return Err(self.refuse("judge")),
            DebateStatus::InProgress | DebateStatus::Completed => {}
        }
        if !self.is_participant(winner) {
            return Err(RuleViolation::invalid(format!(
                "winner '{}' is not a participant in this debate",
                winner
            )));
        }
        Ok(())
    }

    /// `in_progress | completed → judged`
    pub fn judge(
        &mut self,
        winner: &str,
        reasoning: Option<String>,
        judge_id: Option<String>,
    ) -> Result<(), RuleViolation> {
        self.ensure_can_judge(winner)?;
        self.winner = Some(winner.to_string());
        self.judge_decision = reasoning;
        self.judge_id = judge_id;
        self.status = DebateStatus::Judged;
        self.pending_stats = self.participants.iter().cloned().collect();
        self.touch();
        Ok(())
    }

    /// Clear `name` from the pending statistics; false when it was not pending
    pub fn mark_stats_recorded(&mut self, name: &str) -> bool {
        self.pending_stats.remove(name)
    }

    /// Record one vote for `participant`, at most once per voter.
    ///
    /// When `argument_id` is given it must be one of the participant's
    /// arguments, and its own counter is bumped too.
    pub fn record_vote(
        &mut self,
        participant: &str,
        voter_id: &str,
        argument_id: Option<Uuid>,
    ) -> Result<(), RuleViolation> {
        if !self.status.accepts_votes() {
            return Err(self.refuse("vote on"));
        }
        if voter_id.trim().is_empty() {
            return Err(RuleViolation::invalid("voter_id must not be empty"));
        }
        if !self.is_participant(participant) {
            return Err(RuleViolation::invalid(format!(
                "'{}' is not a participant in this debate",
                participant
            )));
        }
        if self.has_voted(voter_id) {
            return Err(RuleViolation::DuplicateVote {
                voter_id: voter_id.to_string(),
            });
        }

        let argument_index = match argument_id {
            Some(id) => Some(
                self.arguments
                    .iter()
                    .position(|a| a.id == id && a.personality_id == participant)
                    .ok_or_else(|| {
                        RuleViolation::invalid(format!(
                            "argument {} was not made by '{}'",
                            id, participant
                        ))
                    })?,
            ),
            None => None,
        };

        if let Some(index) = argument_index {
            self.arguments[index].votes += 1;
        }
        *self.votes.entry(participant.to_string()).or_insert(0) += 1;
        self.total_votes += 1;
        self.voter_records
            .insert(voter_id.to_string(), participant.to_string());
        self.touch();
        Ok(())
    }

    /// A round must hold exactly one argument per participant, all for `round`
    fn check_round(&self, round: u32, arguments: &[Argument]) -> Result<(), RuleViolation> {
        if round > self.max_rounds {
            return Err(RuleViolation::invalid(format!(
                "round {} exceeds max_rounds {}",
                round, self.max_rounds
            )));
        }
        if arguments.len() != self.participants.len() {
            return Err(RuleViolation::invalid(format!(
                "round {} needs {} arguments, got {}",
                round,
                self.participants.len(),
                arguments.len()
            )));
        }

        let mut speakers = HashSet::new();
        for argument in arguments {
            if argument.round_number != round {
                return Err(RuleViolation::invalid(format!(
                    "argument for round {} submitted in round {}",
                    argument.round_number, round
                )));
            }
            if !self.is_participant(&argument.personality_id) {
                return Err(RuleViolation::invalid(format!(
                    "'{}' is not a participant in this debate",
                    argument.personality_id
                )));
            }
            if !speakers.insert(argument.personality_id.as_str()) {
                return Err(RuleViolation::invalid(format!(
                    "'{}' spoke twice in round {}",
                    argument.personality_id, round
                )));
            }
            if argument.content.trim().is_empty() {
                return Err(RuleViolation::invalid("argument content must not be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<String> {
        vec!["The Philosopher".into(), "The Scientist".into(), "The Historian".into()]
    }

    fn round(debate: &Debate, n: u32) -> Vec<Argument> {
        debate
            .participants
            .iter()
            .map(|p| Argument::new(p.clone(), format!("{} makes a point in round {}.", p, n), n))
            .collect()
    }

    fn started() -> Debate {
        let mut debate = Debate::new("Is remote work here to stay?", None, roster(), 3).unwrap();
        let args = round(&debate, 1);
        debate.begin(args).unwrap();
        debate
    }

    #[test]
    fn test_new_debate_initialises_tally() {
        let debate = Debate::new("Is remote work here to stay?", Some("u1".into()), roster(), 3).unwrap();

        assert_eq!(debate.status, DebateStatus::Created);
        assert_eq!(debate.current_round, 1);
        assert_eq!(debate.votes.len(), 3);
        assert!(debate.votes.values().all(|v| *v == 0));
        assert!(debate.voter_records.is_empty());
        assert!(debate.votes_consistent());
    }

    #[test]
    fn test_new_debate_rejects_empty_roster_and_dedupes() {
        assert!(Debate::new("A perfectly fine topic", None, vec![], 3).is_err());
        assert!(Debate::new("   ", None, roster(), 3).is_err());
        assert!(Debate::new("A perfectly fine topic", None, roster(), 0).is_err());

        let debate = Debate::new(
            "A perfectly fine topic",
            None,
            vec!["A".into(), "B".into(), "A".into()],
            3,
        )
        .unwrap();
        assert_eq!(debate.participants, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut debate = started();
        assert_eq!(debate.status, DebateStatus::InProgress);
        assert_eq!(debate.arguments.len(), 3);

        for expected in 2..=3 {
            let step = debate.next_step().unwrap();
            assert_eq!(step, RoundStep::Generate(expected));
            let args = round(&debate, expected);
            debate.advance(expected - 1, args).unwrap();
            assert_eq!(debate.current_round, expected);
        }

        assert_eq!(debate.next_step().unwrap(), RoundStep::Complete);
        debate.complete().unwrap();
        assert_eq!(debate.status, DebateStatus::Completed);
        assert_eq!(debate.arguments.len(), 9);

        debate
            .judge("The Scientist", Some("Best evidence".into()), Some("judge-1".into()))
            .unwrap();
        assert_eq!(debate.status, DebateStatus::Judged);
        assert_eq!(debate.winner.as_deref(), Some("The Scientist"));
    }

    #[test]
    fn test_start_twice_is_invalid_transition() {
        let mut debate = started();
        let args = round(&debate, 1);
        let err = debate.begin(args).unwrap_err();
        assert!(matches!(
            err,
            RuleViolation::InvalidTransition { from: DebateStatus::InProgress, .. }
        ));
        assert_eq!(debate.arguments.len(), 3);
    }

    #[test]
    fn test_round_must_cover_every_participant_once() {
        let mut debate = Debate::new("Is remote work here to stay?", None, roster(), 3).unwrap();

        let mut short = round(&debate, 1);
        short.pop();
        assert!(debate.begin(short).is_err());

        let mut doubled = round(&debate, 1);
        doubled[2] = Argument::new("The Philosopher", "Speaking twice is not allowed.", 1);
        assert!(debate.begin(doubled).is_err());

        let mut outsider = round(&debate, 1);
        outsider[0] = Argument::new("The Stranger", "I was never invited to this debate.", 1);
        assert!(debate.begin(outsider).is_err());

        let wrong_round = round(&debate, 2);
        assert!(debate.begin(wrong_round).is_err());

        assert_eq!(debate.status, DebateStatus::Created);
        assert!(debate.arguments.is_empty());
    }

    #[test]
    fn test_stale_advance_is_refused() {
        let mut debate = started();
        let args = round(&debate, 2);
        debate.advance(1, args).unwrap();

        let late = round(&debate, 2);
        let err = debate.advance(1, late).unwrap_err();
        assert!(matches!(err, RuleViolation::InvalidTransition { .. }));
        assert_eq!(debate.arguments.len(), 6);
    }

    #[test]
    fn test_cannot_advance_or_end_unstarted_debate() {
        let mut debate = Debate::new("Is remote work here to stay?", None, roster(), 3).unwrap();
        assert!(debate.next_step().is_err());
        assert!(debate.complete().is_err());
    }

    #[test]
    fn test_judge_rules() {
        let mut debate = Debate::new("Is remote work here to stay?", None, roster(), 3).unwrap();
        assert!(matches!(
            debate.judge("The Scientist", None, None),
            Err(RuleViolation::InvalidTransition { .. })
        ));

        let mut debate = started();
        assert!(matches!(
            debate.judge("Nobody", None, None),
            Err(RuleViolation::Invalid(_))
        ));

        // Early judging straight from in_progress
        debate.judge("The Historian", Some("first".into()), None).unwrap();
        let err = debate
            .judge("The Scientist", Some("second".into()), None)
            .unwrap_err();
        assert_eq!(err, RuleViolation::AlreadyJudged);
        assert_eq!(debate.winner.as_deref(), Some("The Historian"));
        assert_eq!(debate.judge_decision.as_deref(), Some("first"));
    }

    #[test]
    fn test_judging_queues_every_participant_for_stats() {
        let mut debate = started();
        assert!(debate.pending_stats.is_empty());

        debate.judge("The Historian", None, None).unwrap();
        assert_eq!(debate.pending_stats.len(), debate.participants.len());

        assert!(debate.mark_stats_recorded("The Historian"));
        assert!(!debate.mark_stats_recorded("The Historian"));
        assert!(!debate.pending_stats.contains("The Historian"));

        // Documents written before the field existed still load
        let mut json = serde_json::to_value(&debate).unwrap();
        json.as_object_mut().unwrap().remove("pending_stats");
        let loaded: Debate = serde_json::from_value(json).unwrap();
        assert!(loaded.pending_stats.is_empty());
    }

    #[test]
    fn test_votes() {
        let mut debate = Debate::new("Is remote work here to stay?", None, roster(), 3).unwrap();
        assert!(debate.record_vote("The Scientist", "v1", None).is_err());

        let mut debate = started();
        debate.record_vote("The Scientist", "v1", None).unwrap();
        debate.record_vote("The Scientist", "v2", None).unwrap();
        debate.record_vote("The Historian", "v3", None).unwrap();

        assert_eq!(debate.votes_for("The Scientist"), 2);
        assert_eq!(debate.total_votes, 3);
        assert!(debate.votes_consistent());

        let err = debate.record_vote("The Historian", "v1", None).unwrap_err();
        assert_eq!(err, RuleViolation::DuplicateVote { voter_id: "v1".into() });
        assert_eq!(debate.votes_for("The Historian"), 1);
        assert_eq!(debate.total_votes, 3);

        assert!(debate.record_vote("Nobody", "v9", None).is_err());
        assert!(debate.record_vote("The Historian", "  ", None).is_err());
    }

    #[test]
    fn test_vote_on_argument() {
        let mut debate = started();
        let scientist_arg = debate.arguments_by("The Scientist").next().unwrap().id;
        let historian_arg = debate.arguments_by("The Historian").next().unwrap().id;

        debate
            .record_vote("The Scientist", "v1", Some(scientist_arg))
            .unwrap();
        assert!(debate
            .record_vote("The Scientist", "v2", Some(historian_arg))
            .is_err());

        let voted = debate.arguments.iter().find(|a| a.id == scientist_arg).unwrap();
        assert_eq!(voted.votes, 1);
        assert_eq!(debate.total_votes, 1);
    }

    #[test]
    fn test_votes_close_after_judging() {
        let mut debate = started();
        debate.complete().unwrap();
        debate.record_vote("The Scientist", "v1", None).unwrap();
        debate.judge("The Scientist", None, None).unwrap();
        assert!(matches!(
            debate.record_vote("The Scientist", "v2", None),
            Err(RuleViolation::InvalidTransition { from: DebateStatus::Judged, .. })
        ));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DebateStatus::Created,
            DebateStatus::InProgress,
            DebateStatus::Completed,
            DebateStatus::Judged,
        ] {
            assert_eq!(status.as_str().parse::<DebateStatus>().unwrap(), status);
        }
        assert!("archived".parse::<DebateStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&DebateStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_arguments_are_tagged() {
        let arg = Argument::new(
            "The Scientist",
            "Evidence shows evidence matters; data and more data decide.",
            1,
        );
        assert_eq!(arg.tags.first().map(String::as_str), Some("evidence"));
        assert!(arg.tags.len() <= 3);
    }
}

//! Rule violations raised by the pure lifecycle checks

use thiserror::Error;

use crate::debate::DebateStatus;

/// Why a debate or personality mutation was refused.
///
/// These carry no storage context; the engine maps them onto its own error
/// taxonomy so callers can tell "someone else already did it" apart from bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("cannot {action} a debate that is {from}")]
    InvalidTransition {
        from: DebateStatus,
        action: &'static str,
    },
    #[error("debate has already been judged")]
    AlreadyJudged,
    #[error("{0}")]
    Invalid(String),
    #[error("voter '{voter_id}' has already voted in this debate")]
    DuplicateVote { voter_id: String },
}

impl RuleViolation {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

//! Error taxonomy for engine and registry operations

use agora_core::RuleViolation;
use agora_llm::LlmError;
use agora_persist::{StorageError, UpdateError};
use thiserror::Error;

/// Why a lifecycle or registry operation failed
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Status precondition unmet, a lost race, or compare-and-swap exhaustion
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("debate has already been judged")]
    AlreadyJudged,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("voter '{voter_id}' has already voted in this debate")]
    DuplicateVote { voter_id: String },

    /// A round was abandoned; nothing from it was committed
    #[error("argument generation failed: {0}")]
    GenerationFailure(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DebateError {
    pub fn debate_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            kind: "debate",
            id: id.to_string(),
        }
    }

    pub fn personality_not_found(name: impl ToString) -> Self {
        Self::NotFound {
            kind: "personality",
            id: name.to_string(),
        }
    }
}

impl From<RuleViolation> for DebateError {
    fn from(violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::InvalidTransition { .. } => Self::InvalidTransition(violation.to_string()),
            RuleViolation::AlreadyJudged => Self::AlreadyJudged,
            RuleViolation::Invalid(msg) => Self::Validation(msg),
            RuleViolation::DuplicateVote { voter_id } => Self::DuplicateVote { voter_id },
        }
    }
}

impl From<UpdateError<RuleViolation>> for DebateError {
    fn from(err: UpdateError<RuleViolation>) -> Self {
        match err {
            UpdateError::NotFound(key) => Self::NotFound {
                kind: "record",
                id: key,
            },
            UpdateError::Rejected(violation) => violation.into(),
            UpdateError::Conflict(attempts) => Self::InvalidTransition(format!(
                "concurrent update conflict after {} attempts",
                attempts
            )),
            UpdateError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Why a single generation attempt produced nothing usable.
///
/// Always absorbed by a fallback; never surfaces from the engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("generated text too short ({len} < {min} characters)")]
    TooShort { len: usize, min: usize },

    #[error("generator returned no text")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::DebateStatus;

    #[test]
    fn test_rule_violations_map_to_engine_errors() {
        let err: DebateError = RuleViolation::InvalidTransition {
            from: DebateStatus::Judged,
            action: "start",
        }
        .into();
        assert!(matches!(err, DebateError::InvalidTransition(ref m) if m.contains("judged")));

        let err: DebateError = RuleViolation::AlreadyJudged.into();
        assert!(matches!(err, DebateError::AlreadyJudged));

        let err: DebateError = UpdateError::Rejected(RuleViolation::invalid("bad")).into();
        assert!(matches!(err, DebateError::Validation(ref m) if m == "bad"));
    }

    #[test]
    fn test_conflict_is_invalid_transition() {
        let err: DebateError = UpdateError::<RuleViolation>::Conflict(16).into();
        assert!(
            matches!(err, DebateError::InvalidTransition(ref m) if m.contains("concurrent update conflict"))
        );
    }
}

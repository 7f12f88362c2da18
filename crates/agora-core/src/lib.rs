//! # Agora Core
//!
//! Core types for the Agora debate platform:
//! - [`Debate`] - One debate aggregate with its embedded arguments, votes and verdict
//! - [`DebateStatus`] - The `created → in_progress → completed → judged` lifecycle
//! - [`Personality`] - A debate participant and its running statistics
//! - [`analytics`] - Pure scoring, engagement and summary functions
//!
//! Everything in this crate is synchronous and side-effect free. The rules on
//! [`Debate`] decide whether a transition is legal; storage and argument
//! generation live in `agora-persist` and `agora-debate`.

pub mod analytics;
pub mod debate;
pub mod defaults;
pub mod error;
pub mod personality;

pub use analytics::{DebateAnalytics, EngagementMetrics};
pub use debate::{Argument, Debate, DebateStatus, RoundStep, DEFAULT_MAX_ROUNDS};
pub use defaults::default_personalities;
pub use error::RuleViolation;
pub use personality::{
    DebateResult, LeaderboardEntry, Personality, PersonalityStats, PersonalityUpdate, RankBy,
};

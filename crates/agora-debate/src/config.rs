//! Engine configuration

use std::env;
use std::time::Duration;

use agora_core::DEFAULT_MAX_ROUNDS;
use agora_persist::DEFAULT_CAS_ATTEMPTS;

/// Debate engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DebateConfig {
    /// Rounds per debate (env: AGORA_MAX_ROUNDS)
    pub max_rounds: u32,
    /// Longest argument kept before truncation (env: AGORA_MAX_ARGUMENT_LENGTH)
    pub max_argument_length: usize,
    /// Shorter generated text is replaced by a fallback (env: AGORA_MIN_ARGUMENT_LENGTH)
    pub min_argument_length: usize,
    /// Whole-round deadline, including the wait for a pool permit (env: AGORA_ROUND_TIMEOUT_SECS)
    pub round_timeout: Duration,
    /// Rounds generated at once across all debates (env: AGORA_WORKER_POOL_SIZE)
    pub worker_pool_size: usize,
    /// Compare-and-swap retries per update (env: AGORA_CAS_ATTEMPTS)
    pub cas_attempts: u32,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_argument_length: 500,
            min_argument_length: 20,
            round_timeout: Duration::from_secs(60),
            worker_pool_size: 4,
            cas_attempts: DEFAULT_CAS_ATTEMPTS,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl DebateConfig {
    /// Load from environment variables. Missing, malformed or zero values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_rounds: env_parse::<u32>("AGORA_MAX_ROUNDS")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_rounds),
            max_argument_length: env_parse::<usize>("AGORA_MAX_ARGUMENT_LENGTH")
                .filter(|v| *v > 3)
                .unwrap_or(defaults.max_argument_length),
            min_argument_length: env_parse("AGORA_MIN_ARGUMENT_LENGTH")
                .unwrap_or(defaults.min_argument_length),
            round_timeout: env_parse::<u64>("AGORA_ROUND_TIMEOUT_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.round_timeout),
            worker_pool_size: env_parse::<usize>("AGORA_WORKER_POOL_SIZE")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.worker_pool_size),
            cas_attempts: env_parse::<u32>("AGORA_CAS_ATTEMPTS")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.cas_attempts),
        }
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebateConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.max_argument_length, 500);
        assert_eq!(config.min_argument_length, 20);
        assert_eq!(config.round_timeout, Duration::from_secs(60));
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.cas_attempts, 16);
    }

    #[test]
    fn test_builders_clamp() {
        let config = DebateConfig::default()
            .with_max_rounds(0)
            .with_round_timeout(Duration::from_millis(50));
        assert_eq!(config.max_rounds, 1);
        assert_eq!(config.round_timeout, Duration::from_millis(50));
    }
}

//! # Agora LLM
//!
//! Text-generation backends for Agora debaters and judges.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | OpenAI-compatible | API | `AGORA_LLM_API_KEY` or `OPENAI_API_KEY` |
//! | Ollama | Local | None |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use agora_llm::{LlmProvider, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::debater();
//!     let reply = llm.ask("DEBATE TOPIC: Should homework be banned?").await.unwrap();
//!     assert!(!reply.is_empty());
//! }
//! ```
//!
//! Real providers are normally built from the environment with
//! [`LlmConfig::from_env`] and [`config::build_provider`], which also wraps
//! them in a [`ResilientProvider`] circuit breaker.

pub mod config;
pub mod metrics;
pub mod mock;
pub mod ollama;
pub mod openai_compat;
pub mod provider;
pub mod resilient_provider;

pub use config::{build_provider, ConfigError, LlmConfig, ProviderKind};
pub use metrics::{Metrics, MetricsSnapshot};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use resilient_provider::{CircuitState, LlmCircuitConfig, ResilientProvider};

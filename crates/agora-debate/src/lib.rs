//! # Agora Debate
//!
//! The lifecycle engine that drives a debate from `created` to `judged`.
//!
//! ## Key Types
//!
//! - [`DebateEngine`] - create, start, advance, end, vote and judge debates
//! - [`PersonalityRegistry`] - the debate roster and per-personality statistics
//! - [`ArgumentGenerator`] - the text-generation capability, with
//!   [`LlmArgumentGenerator`] as the LLM-backed implementation
//! - [`RoundRunner`] - bounded, time-limited round generation
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use agora_debate::{DebateConfig, DebateEngine, LlmArgumentGenerator};
//! use agora_llm::{Metrics, MockProvider};
//! use agora_persist::MemoryBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let metrics = Arc::new(Metrics::new());
//!     let generator = LlmArgumentGenerator::new(Arc::new(MockProvider::debater()), metrics.clone());
//!     let engine = DebateEngine::new(
//!         Arc::new(MemoryBackend::new()),
//!         Arc::new(generator),
//!         DebateConfig::default(),
//!         metrics,
//!     );
//!     engine.registry().seed_defaults().await.unwrap();
//!
//!     let debate = engine.create("Should homework be banned?", None).await.unwrap();
//!     let round = engine.start(debate.id).await.unwrap();
//!     assert_eq!(round.arguments.len(), 6);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod prompt;
pub mod registry;
pub mod rounds;
pub mod text;

pub use config::DebateConfig;
pub use engine::{AdvanceOutcome, DebateEngine, PlatformStats, RoundReport};
pub use error::{DebateError, GenerationError};
pub use generator::{ArgumentGenerator, LlmArgumentGenerator};
pub use prompt::ArgumentRequest;
pub use registry::PersonalityRegistry;
pub use rounds::{RoundPlan, RoundRunner};

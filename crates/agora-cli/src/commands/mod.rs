//! Subcommands and the engine they share

pub mod info;
pub mod personalities;
pub mod run;

use std::sync::Arc;

use agora_debate::{DebateConfig, DebateEngine, LlmArgumentGenerator};
use agora_llm::{build_provider, LlmConfig, Metrics};
use agora_persist::{MemoryBackend, SqliteBackend, SqliteConfig, StorageBackend};
use anyhow::{Context, Result};
use clap::Args;

/// Where debates and personalities are stored
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// SQLite URL; an in-memory store is used when absent
    #[arg(long, env = "DATABASE_URL")]
    pub database: Option<String>,
}

impl StorageArgs {
    async fn backend(&self) -> Result<Arc<dyn StorageBackend>> {
        match &self.database {
            Some(url) => {
                let config = if url.contains(":memory:") {
                    SqliteConfig {
                        url: url.clone(),
                        ..SqliteConfig::memory()
                    }
                } else {
                    SqliteConfig {
                        url: url.clone(),
                        ..SqliteConfig::default()
                    }
                };
                let db = SqliteBackend::new_with_config(config)
                    .await
                    .with_context(|| format!("Failed to open database {}", url))?;
                Ok(Arc::new(db))
            }
            None => Ok(Arc::new(MemoryBackend::new())),
        }
    }
}

/// Engine over the chosen storage and the provider configured in the environment,
/// with the default personalities seeded
pub async fn open_engine(storage: &StorageArgs, config: DebateConfig) -> Result<DebateEngine> {
    let llm_config = LlmConfig::from_env().context("Invalid LLM configuration")?;
    llm_config.validate().context("Invalid LLM configuration")?;
    let provider = build_provider(&llm_config).context("Failed to build LLM provider")?;
    tracing::info!(provider = llm_config.provider.as_str(), model = %llm_config.model, "Provider ready");

    let metrics = Arc::new(Metrics::new());
    let generator = LlmArgumentGenerator::new(provider, metrics.clone());
    let engine = DebateEngine::new(
        storage.backend().await?,
        Arc::new(generator),
        config,
        metrics,
    );
    engine
        .registry()
        .seed_defaults()
        .await
        .context("Failed to seed default personalities")?;
    Ok(engine)
}

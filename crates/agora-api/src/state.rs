//! Application State
//!
//! Centralizes access to the debate engine, metrics and admin auth.

use std::sync::Arc;

use agora_debate::DebateEngine;
use agora_llm::Metrics;

use crate::auth::AdminAuth;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    engine: Arc<DebateEngine>,
    metrics: Arc<Metrics>,
    admin: AdminAuth,
}

impl AppState {
    pub fn new(engine: Arc<DebateEngine>, admin: AdminAuth) -> Self {
        let metrics = engine.metrics().clone();
        Self {
            engine,
            metrics,
            admin,
        }
    }

    pub fn engine(&self) -> &DebateEngine {
        &self.engine
    }

    /// Get metrics collector (cloned Arc for sharing)
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn admin(&self) -> &AdminAuth {
        &self.admin
    }
}

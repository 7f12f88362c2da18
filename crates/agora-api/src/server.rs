//! Agora API server with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use agora_debate::{DebateConfig, DebateEngine, LlmArgumentGenerator};
use agora_llm::{build_provider, LlmConfig, Metrics};
use agora_persist::{SqliteBackend, SqliteConfig};
use axum::{middleware, Router};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::middleware::{
    body_limit_layer, cors_layer, request_id_middleware, security_headers_middleware,
    timeout_layer, tracing_middleware,
};
use crate::routes::api_router;
use crate::state::AppState;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Whole-request timeout; must outlast a round
    pub timeout: Duration,
    /// Max request body size (bytes)
    pub max_body_size: usize,
    pub compression: bool,
    pub cors_origins: Vec<String>,
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("timeout", &self.timeout)
            .field("max_body_size", &self.max_body_size)
            .field("compression", &self.compression)
            .field("cors_origins", &self.cors_origins)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            timeout: Duration::from_secs(90),
            max_body_size: 64 * 1024,
            compression: true,
            cors_origins: Vec::new(),
            admin_token: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = std::env::var("AGORA_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.addr.port());

        let timeout_secs: u64 = std::env::var("AGORA_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.trim().parse().ok())
            .filter(|t| *t > 0)
            .unwrap_or(defaults.timeout.as_secs());

        let max_body_size = std::env::var("AGORA_MAX_BODY_BYTES")
            .ok()
            .and_then(|b| b.trim().parse().ok())
            .filter(|b| *b > 0)
            .unwrap_or(defaults.max_body_size);

        let cors_origins = std::env::var("AGORA_CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            timeout: Duration::from_secs(timeout_secs),
            max_body_size,
            cors_origins,
            admin_token: std::env::var("AGORA_ADMIN_TOKEN").ok(),
            ..defaults
        }
    }
}

/// Agora API Server
pub struct AgoraServer {
    config: ServerConfig,
    app_state: AppState,
}

impl AgoraServer {
    /// Build the full stack from the environment: provider, storage, engine.
    ///
    /// The default personalities are seeded into an empty registry.
    pub async fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let llm_config = LlmConfig::from_env()
            .and_then(|c| c.validate().map(|()| c))
            .map_err(|e| ApiError::Internal(format!("LLM configuration: {}", e)))?;
        let provider = build_provider(&llm_config)
            .map_err(|e| ApiError::Internal(format!("LLM provider: {}", e)))?;
        tracing::info!(
            provider = llm_config.provider.as_str(),
            model = %llm_config.model,
            "Argument generator configured"
        );

        let metrics = Arc::new(Metrics::new());
        let generator = LlmArgumentGenerator::new(provider, metrics.clone());

        let db = SqliteBackend::new_with_config(SqliteConfig::from_env())
            .await
            .map_err(|e| ApiError::Internal(format!("DB init failed: {}", e)))?;

        let engine = DebateEngine::new(
            Arc::new(db),
            Arc::new(generator),
            DebateConfig::from_env(),
            metrics,
        );
        let seeded = engine.registry().seed_defaults().await?;
        if seeded > 0 {
            tracing::info!(count = seeded, "Seeded default personalities");
        }

        Ok(Self::with_engine(config, Arc::new(engine)))
    }

    /// Serve an engine that was assembled elsewhere
    pub fn with_engine(mut config: ServerConfig, engine: Arc<DebateEngine>) -> Self {
        let round_timeout = engine.config().round_timeout;
        if config.timeout <= round_timeout {
            let adjusted = round_timeout + Duration::from_secs(30);
            tracing::warn!(
                request_timeout_secs = config.timeout.as_secs(),
                round_timeout_secs = round_timeout.as_secs(),
                adjusted_secs = adjusted.as_secs(),
                "Request timeout must exceed the round timeout, raising it"
            );
            config.timeout = adjusted;
        }

        let admin = AdminAuth::new(config.admin_token.clone());
        if !admin.is_configured() {
            tracing::warn!("AGORA_ADMIN_TOKEN not set, admin routes will answer 403");
        }

        Self {
            app_state: AppState::new(engine, admin),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router with the full middleware stack (the last layer added runs first)
    pub fn router(&self) -> Router {
        let mut app = api_router(self.app_state.clone())
            .layer(middleware::from_fn_with_state(
                self.app_state.clone(),
                tracing_middleware,
            ))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.config.cors_origins))
            .layer(timeout_layer(self.config.timeout))
            .layer(body_limit_layer(self.config.max_body_size));

        if self.config.compression {
            app = app.layer(CompressionLayer::new());
        }
        app
    }

    /// Run the server with graceful shutdown
    pub async fn run(self) -> Result<(), ApiError> {
        let app = self.router();
        let addr = self.config.addr;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Agora API listening");

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.app_state.metrics()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    init_tracing_with("info,agora_api=debug,agora_debate=debug,tower_http=debug");
}

/// Initialize tracing with an explicit default filter. A second call is a no-op.
pub fn init_tracing_with(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.max_body_size, 65536);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_debug_redacts_admin_token() {
        let config = ServerConfig {
            admin_token: Some("hunter2".into()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}

//! Circuit breaker around an LLM provider
//!
//! When a backend keeps failing, debaters should drop to their fallback
//! arguments immediately rather than each waiting out a network timeout.
//! The breaker trips after repeated availability failures, fails fast while
//! open, and lets a few trial calls through once the cooldown has elapsed.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests pass through
    Closed,
    /// Requests fail immediately
    Open,
    /// Probing recovery
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct LlmCircuitConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Half-open successes before closing
    pub success_threshold: u32,
    /// Cooldown before probing again
    pub reset_timeout: Duration,
}

impl Default for LlmCircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

/// Wraps any provider with circuit-breaker behaviour
#[derive(Debug)]
pub struct ResilientProvider<P: LlmProvider> {
    inner: P,
    name: String,
    config: LlmCircuitConfig,
    breaker: RwLock<BreakerState>,
    total_requests: AtomicU64,
    total_failures: AtomicU64,
    circuit_opens: AtomicU32,
}

impl<P: LlmProvider> ResilientProvider<P> {
    pub fn new(provider: P, config: LlmCircuitConfig) -> Self {
        let name = format!("{}+breaker", provider.name());
        Self {
            inner: provider,
            name,
            config,
            breaker: RwLock::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            }),
            total_requests: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            circuit_opens: AtomicU32::new(0),
        }
    }

    pub fn wrap(provider: P) -> Self {
        Self::new(provider, LlmCircuitConfig::default())
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.read().await.state
    }

    /// (requests, failures, times opened)
    pub fn stats(&self) -> (u64, u64, u32) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.total_failures.load(Ordering::Relaxed),
            self.circuit_opens.load(Ordering::Relaxed),
        )
    }

    async fn record_success(&self) {
        let mut breaker = self.breaker.write().await;
        breaker.failure_count = 0;
        if breaker.state == CircuitState::HalfOpen {
            breaker.success_count += 1;
            if breaker.success_count >= self.config.success_threshold {
                breaker.state = CircuitState::Closed;
                breaker.success_count = 0;
                tracing::info!(provider = %self.inner.name(), "Circuit closed, provider recovered");
            }
        }
    }

    async fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut breaker = self.breaker.write().await;
        breaker.failure_count += 1;

        let trip = breaker.state == CircuitState::HalfOpen
            || breaker.failure_count >= self.config.failure_threshold;
        if trip && breaker.state != CircuitState::Open {
            breaker.state = CircuitState::Open;
            breaker.opened_at = Some(Instant::now());
            self.circuit_opens.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                provider = %self.inner.name(),
                failures = breaker.failure_count,
                "Circuit opened"
            );
        }
    }

    async fn admit(&self) -> Result<(), LlmError> {
        let mut breaker = self.breaker.write().await;
        match breaker.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let cooled = breaker
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.reset_timeout)
                    .unwrap_or(true);
                if cooled {
                    breaker.state = CircuitState::HalfOpen;
                    breaker.success_count = 0;
                    tracing::info!(provider = %self.inner.name(), "Circuit half-open, probing");
                    Ok(())
                } else {
                    Err(LlmError::NotAvailable)
                }
            }
        }
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> LlmProvider for ResilientProvider<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        self.circuit_state().await != CircuitState::Open && self.inner.is_available().await
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.admit().await?;

        match self.inner.complete(request).await {
            Ok(response) => {
                self.record_success().await;
                Ok(response)
            }
            Err(e) => {
                // Bad requests say nothing about backend health
                if e.is_availability() {
                    self.record_failure().await;
                }
                Err(e)
            }
        }
    }
}

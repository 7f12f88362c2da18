//! Process-wide counters for the debate platform

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector, shared behind an `Arc`
#[derive(Debug, Default)]
pub struct Metrics {
    pub llm_calls: AtomicU64,
    pub llm_errors: AtomicU64,
    pub tokens_used: AtomicU64,
    pub debates_created: AtomicU64,
    pub rounds_generated: AtomicU64,
    /// Arguments that came from a template instead of the model
    pub fallback_arguments: AtomicU64,
    pub votes_cast: AtomicU64,
    pub debates_judged: AtomicU64,
    pub http_requests: AtomicU64,
    pub http_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_llm_call(&self, tokens: u64, error: bool) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
        self.tokens_used.fetch_add(tokens, Ordering::Relaxed);
        if error {
            self.llm_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_debate_created(&self) {
        self.debates_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round(&self, fallbacks: u64) {
        self.rounds_generated.fetch_add(1, Ordering::Relaxed);
        self.fallback_arguments.fetch_add(fallbacks, Ordering::Relaxed);
    }

    pub fn record_vote(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_judged(&self) {
        self.debates_judged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http(&self, error: bool) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
        if error {
            self.http_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
            llm_errors: self.llm_errors.load(Ordering::Relaxed),
            tokens_used: self.tokens_used.load(Ordering::Relaxed),
            debates_created: self.debates_created.load(Ordering::Relaxed),
            rounds_generated: self.rounds_generated.load(Ordering::Relaxed),
            fallback_arguments: self.fallback_arguments.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            debates_judged: self.debates_judged.load(Ordering::Relaxed),
            http_requests: self.http_requests.load(Ordering::Relaxed),
            http_errors: self.http_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub llm_calls: u64,
    pub llm_errors: u64,
    pub tokens_used: u64,
    pub debates_created: u64,
    pub rounds_generated: u64,
    pub fallback_arguments: u64,
    pub votes_cast: u64,
    pub debates_judged: u64,
    pub http_requests: u64,
    pub http_errors: u64,
}

impl MetricsSnapshot {
    pub fn llm_error_rate(&self) -> f64 {
        ratio(self.llm_errors, self.llm_calls)
    }

    /// Export in Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let counters: [(&str, &str, u64); 10] = [
            ("llm_calls_total", "LLM completion calls", self.llm_calls),
            ("llm_errors_total", "Failed LLM completion calls", self.llm_errors),
            ("tokens_used_total", "Tokens consumed by LLM calls", self.tokens_used),
            ("debates_created_total", "Debates created", self.debates_created),
            ("rounds_generated_total", "Debate rounds generated", self.rounds_generated),
            ("fallback_arguments_total", "Arguments produced from fallback templates", self.fallback_arguments),
            ("votes_cast_total", "Votes accepted", self.votes_cast),
            ("debates_judged_total", "Debates judged", self.debates_judged),
            ("http_requests_total", "HTTP requests served", self.http_requests),
            ("http_errors_total", "HTTP responses with status >= 400", self.http_errors),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            let _ = writeln!(out, "# HELP agora_{} {}", name, help);
            let _ = writeln!(out, "# TYPE agora_{} counter", name);
            let _ = writeln!(out, "agora_{} {}", name, value);
        }

        let _ = writeln!(out, "# HELP agora_llm_error_rate Current LLM error rate");
        let _ = writeln!(out, "# TYPE agora_llm_error_rate gauge");
        let _ = writeln!(out, "agora_llm_error_rate {:.4}", self.llm_error_rate());
        let _ = writeln!(out, "# HELP agora_fallback_ratio Share of arguments from templates");
        let _ = writeln!(out, "# TYPE agora_fallback_ratio gauge");
        let _ = writeln!(
            out,
            "agora_fallback_ratio {:.4}",
            ratio(self.fallback_arguments, self.llm_calls.max(self.fallback_arguments))
        );
        out
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

//! Input sanitization and validation for user-supplied text
//!
//! Topics, reasoning and identifiers arrive from untrusted clients and end up
//! inside prompts and rendered pages, so they are cleaned before they reach
//! the engine.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const TOPIC_MIN_CHARS: usize = 10;
pub const TOPIC_MAX_CHARS: usize = 500;
pub const REASONING_MAX_CHARS: usize = 1000;
pub const IDENTIFIER_MAX_CHARS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be at least {min} characters long")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters long")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains inappropriate content")]
    Inappropriate { field: &'static str },

    #[error("{field} contains invalid characters")]
    InvalidCharacters { field: &'static str },
}

struct Patterns {
    tags: Regex,
    whitespace: Regex,
    inappropriate: Vec<Regex>,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let inappropriate = [
                r"(?i)\b(spam|scam|fraud)\b",
                r"(?i)<script",
                r"(?i)javascript:",
                r"(?i)on\w+\s*=",
            ]
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
            Some(Patterns {
                tags: Regex::new(r"<[^>]*>").ok()?,
                whitespace: Regex::new(r"\s+").ok()?,
                inappropriate,
            })
        })
        .as_ref()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Strip tags and control characters, collapse whitespace, then HTML-escape.
pub fn sanitize_text(input: &str) -> String {
    let without_controls: String = input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    let collapsed = match patterns() {
        Some(p) => {
            let untagged = p.tags.replace_all(&without_controls, "");
            p.whitespace.replace_all(&untagged, " ").into_owned()
        }
        None => without_controls.split_whitespace().collect::<Vec<_>>().join(" "),
    };
    escape_html(collapsed.trim())
}

fn is_inappropriate(text: &str) -> bool {
    match patterns() {
        Some(p) => p.inappropriate.iter().any(|re| re.is_match(text)),
        None => {
            let lower = text.to_lowercase();
            ["<script", "javascript:"].iter().any(|s| lower.contains(s))
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// A debate topic, 10 to 500 characters, checked before it is cleaned
pub fn validate_topic(input: &str) -> Result<String, SanitizeError> {
    const FIELD: &str = "topic";
    let topic = input.trim();
    if topic.is_empty() {
        return Err(SanitizeError::Missing { field: FIELD });
    }
    if char_len(topic) < TOPIC_MIN_CHARS {
        return Err(SanitizeError::TooShort {
            field: FIELD,
            min: TOPIC_MIN_CHARS,
        });
    }
    if char_len(topic) > TOPIC_MAX_CHARS {
        return Err(SanitizeError::TooLong {
            field: FIELD,
            max: TOPIC_MAX_CHARS,
        });
    }
    if is_inappropriate(topic) {
        tracing::warn!(topic = %topic, "Rejected topic with inappropriate content");
        return Err(SanitizeError::Inappropriate { field: FIELD });
    }
    Ok(sanitize_text(topic))
}

/// Optional judge reasoning; blank input means none
pub fn validate_reasoning(input: Option<&str>) -> Result<Option<String>, SanitizeError> {
    let Some(reasoning) = input.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if char_len(reasoning) > REASONING_MAX_CHARS {
        return Err(SanitizeError::TooLong {
            field: "reasoning",
            max: REASONING_MAX_CHARS,
        });
    }
    Ok(Some(sanitize_text(reasoning)))
}

/// Voter ids, judge ids, personality names used as keys
pub fn validate_identifier(field: &'static str, input: &str) -> Result<String, SanitizeError> {
    let id = input.trim();
    if id.is_empty() {
        return Err(SanitizeError::Missing { field });
    }
    if char_len(id) > IDENTIFIER_MAX_CHARS {
        return Err(SanitizeError::TooLong {
            field,
            max: IDENTIFIER_MAX_CHARS,
        });
    }
    if id.chars().any(char::is_control) {
        return Err(SanitizeError::InvalidCharacters { field });
    }
    Ok(id.to_string())
}

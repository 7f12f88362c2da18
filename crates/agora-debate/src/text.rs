//! Post-processing applied to every piece of generated text

use std::sync::OnceLock;

use regex::Regex;

use crate::error::GenerationError;

const QUOTES: &[char] = &['"', '\''];
const TERMINAL: &[char] = &['.', '!', '?'];

fn self_reference() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^(?:as|i am|i'm)\s+(?:the\s+)?\w+[,:]?\s*").ok())
        .as_ref()
}

/// Normalise raw model output into a single clean paragraph.
///
/// Strips surrounding quotes, flattens whitespace, drops a leading
/// "As X," style self-introduction and a dangling unfinished sentence, and
/// guarantees terminal punctuation. Returns an empty string for empty input.
pub fn clean_argument(raw: &str) -> String {
    let unquoted = raw.strip_prefix(QUOTES).unwrap_or(raw);
    let unquoted = unquoted.strip_suffix(QUOTES).unwrap_or(unquoted);

    let flat = unquoted.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut text = match self_reference() {
        Some(pattern) => pattern.replace(&flat, "").into_owned(),
        None => flat,
    };

    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() > 1 {
        let last = sentences[sentences.len() - 1].trim_end();
        if !last.ends_with(TERMINAL) {
            let mut kept = sentences[..sentences.len() - 1].join(". ");
            if !kept.is_empty() && !kept.ends_with('.') {
                kept.push('.');
            }
            text = kept;
        }
    }

    let mut text = text.trim().to_string();
    if !text.is_empty() && !text.ends_with(TERMINAL) {
        text.push('.');
    }
    text
}

/// Cut to `max` characters, the last three being `...`
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// First `n` characters, never splitting a code point
pub fn preview(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Apply the full argument contract: clean, bound the length, reject short text
pub fn finish_argument(raw: &str, min: usize, max: usize) -> Result<String, GenerationError> {
    let cleaned = clean_argument(raw);
    let len = cleaned.chars().count();
    if len == 0 {
        return Err(GenerationError::Empty);
    }
    if len < min {
        return Err(GenerationError::TooShort { len, min });
    }
    Ok(truncate_chars(&cleaned, max))
}

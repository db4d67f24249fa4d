use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::PipelineError;

pub const MIN_PROMPT_LEN: usize = 3;

/// Injection phrasing removed verbatim before the text goes anywhere near a
/// model. Ordered, literal-first; the regex catches spacing variants.
fn injection_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)ignore\s+(all\s+)?previous\s+instructions?",
            r"(?i)disregard\s+(all\s+)?(the\s+)?(above|prior)\s+instructions?",
            r"(?i)forget\s+(all\s+)?your\s+instructions?",
            r"(?i)system\s+prompt\s*(override|injection)?",
            r"(?i)you\s+are\s+now\s+in\s+developer\s+mode",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Normalize raw user text into a safe, bounded prompt: trim, unwrap one
/// code fence, strip injection phrasing, enforce the minimum length, hard
/// truncate at `max_len`. Idempotent on already-clean input.
pub fn sanitize(input: &str, max_len: usize) -> Result<String, PipelineError> {
    let before = input.chars().count();
    let mut text = input.trim().to_string();

    text = strip_fence(&text);

    for pattern in injection_patterns() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    text = text.trim().to_string();

    if text.chars().count() < MIN_PROMPT_LEN {
        return Err(PipelineError::InvalidInput(format!(
            "prompt must be at least {MIN_PROMPT_LEN} characters after sanitization"
        )));
    }

    if text.chars().count() > max_len {
        text = text.chars().take(max_len).collect();
        text = text.trim_end().to_string();
    }

    debug!(before, after = text.chars().count(), "sanitized prompt");
    Ok(text)
}

/// Remove a single wrapping code fence, keeping inner text as-is.
fn strip_fence(text: &str) -> String {
    let Some(rest) = text.strip_prefix("```") else {
        return text.to_string();
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text.to_string();
    };
    // Drop a language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((first, body)) if !first.trim().contains(' ') && first.len() < 16 => body,
        _ => rest,
    };
    rest.trim().to_string()
}

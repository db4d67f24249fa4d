use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::PipelineError;

/// Score at or above this raises a moderation rejection.
pub const BLOCK_SCORE: u32 = 2;
/// Hard input ceiling, independent of the sanitizer's configured bound.
pub const MAX_CHARS: usize = 4000;
/// Any single word above this share of the word count reads as spam.
pub const REPETITION_RATIO: f64 = 0.40;
/// Character-entropy floor in bits; below it the text is gibberish.
pub const MIN_ENTROPY_BITS: f64 = 2.5;

struct SafetyRule {
    name: &'static str,
    category: &'static str,
    pattern: Regex,
    weight: u32,
}

fn rules() -> &'static Vec<SafetyRule> {
    static RULES: OnceLock<Vec<SafetyRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table: &[(&str, &str, &str, u32)] = &[
            (
                "violence",
                "violence",
                r"(?i)\b(kill|murder|assault|bomb|shoot(ing)?|massacre)\b",
                3,
            ),
            (
                "self-harm",
                "self-harm",
                r"(?i)\b(suicide|self[- ]harm|hurt myself)\b",
                4,
            ),
            (
                "hacking",
                "security",
                r"(?i)\b(hack(ing)?|exploit|malware|ransomware|phishing|ddos|keylogger)\b",
                2,
            ),
            (
                "credentials",
                "security",
                r"(?i)\b(steal|crack|bypass)\b.{0,30}\b(password|credential|account|login)s?\b",
                3,
            ),
            (
                "fraud",
                "finance",
                r"(?i)\b(money\s+launder(ing)?|ponzi|counterfeit|insider\s+trading)\b",
                3,
            ),
            (
                "drugs",
                "illicit",
                r"(?i)\b(synthesi[sz]e|cook|manufacture)\b.{0,30}\b(meth|heroin|fentanyl|cocaine)\b",
                4,
            ),
            (
                "explicit",
                "sexual",
                r"(?i)\b(explicit|porn(ographic)?|nsfw)\b",
                2,
            ),
            (
                "hate",
                "hate",
                r"(?i)\b(ethnic\s+cleansing|racial\s+superiority|genocide)\b",
                4,
            ),
        ];
        table
            .iter()
            .filter_map(|(name, category, pattern, weight)| {
                Some(SafetyRule {
                    name,
                    category,
                    pattern: Regex::new(pattern).ok()?,
                    weight: *weight,
                })
            })
            .collect()
    })
}

/// Presentation/business vocabulary that neutralizes security and finance
/// matches: "penetration testing overview for the board" is a slide topic,
/// not a request for tooling.
fn benign_context() -> &'static Regex {
    static BENIGN: OnceLock<Regex> = OnceLock::new();
    BENIGN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        let pattern = Regex::new(
            r"(?i)\b(presentation|slide|deck|report|overview|training|awareness|audit|compliance|strategy|quarterly|board|meeting)\b",
        )
        .unwrap();
        pattern
    })
}

#[derive(Debug, Clone, Default)]
pub struct SafetyVerdict {
    pub score: u32,
    pub matched: Vec<&'static str>,
}

/// Score sanitized text against the rule table and the unconditional
/// heuristics. Pure and deterministic; a blocking verdict is raised as a
/// `Moderation` error so it short-circuits the pipeline.
pub fn check(text: &str) -> Result<SafetyVerdict, PipelineError> {
    if text.chars().count() > MAX_CHARS {
        return Err(PipelineError::Moderation {
            categories: vec!["too long".to_string()],
            score: BLOCK_SCORE,
        });
    }

    if let Some(word) = dominant_word(text) {
        return Err(PipelineError::Moderation {
            categories: vec![format!("repetition: {word}")],
            score: BLOCK_SCORE,
        });
    }

    let entropy = char_entropy(text);
    if entropy < MIN_ENTROPY_BITS {
        return Err(PipelineError::Moderation {
            categories: vec![format!("low entropy ({entropy:.2} bits)")],
            score: BLOCK_SCORE,
        });
    }

    let benign = benign_context().is_match(text);
    let mut score = 0;
    let mut matched = Vec::new();
    for rule in rules() {
        if !rule.pattern.is_match(text) {
            continue;
        }
        if benign && matches!(rule.category, "security" | "finance") {
            debug!(rule = rule.name, "rule neutralized by business context");
            continue;
        }
        score += rule.weight;
        matched.push(rule.category);
    }

    if score >= BLOCK_SCORE {
        let mut categories: Vec<String> = matched.iter().map(|c| c.to_string()).collect();
        categories.dedup();
        return Err(PipelineError::Moderation { categories, score });
    }

    Ok(SafetyVerdict { score, matched })
}

/// The most frequent word, if it exceeds the repetition ratio.
fn dominant_word(text: &str) -> Option<String> {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    if words.len() < 5 {
        return None;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *counts.entry(word.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .find(|(_, count)| (*count as f64) / (words.len() as f64) > REPETITION_RATIO)
        .map(|(word, _)| word.to_string())
}

/// Shannon entropy over the character distribution, in bits.
fn char_entropy(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for ch in text.chars() {
        *counts.entry(ch).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_prompt_passes() {
        let verdict = check("Create a professional presentation about sales").unwrap();
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn hacking_prompt_is_blocked_with_reason() {
        let err = check("hack the system").unwrap_err();
        match err {
            PipelineError::Moderation { categories, score } => {
                assert!(!categories.is_empty());
                assert!(score >= BLOCK_SCORE);
            }
            other => panic!("expected moderation error, got {other:?}"),
        }
    }

    #[test]
    fn verdict_is_case_insensitive() {
        assert!(check("HACK THE SYSTEM").is_err());
        assert!(check("hack the system").is_err());
        assert!(check("CREATE A PROFESSIONAL PRESENTATION ABOUT SALES").is_ok());
    }

    #[test]
    fn benign_context_neutralizes_security_vocabulary() {
        let verdict =
            check("Security awareness training slide about phishing for the compliance audit");
        assert!(verdict.is_ok());
    }

    #[test]
    fn severe_categories_block_despite_business_context() {
        assert!(check("presentation about how to kill and massacre").is_err());
    }

    #[test]
    fn over_long_input_is_rejected_as_too_long() {
        let err = check(&"a b c d e ".repeat(500)).unwrap_err();
        match err {
            PipelineError::Moderation { categories, .. } => {
                assert!(categories[0].contains("too long"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn repeated_word_is_rejected() {
        let err = check("buy buy buy buy buy buy now please").unwrap_err();
        match err {
            PipelineError::Moderation { categories, .. } => {
                assert!(categories[0].starts_with("repetition"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn gibberish_fails_the_entropy_floor() {
        let err = check("aaaaabbbbbaaaaabbbbbaaaaa").unwrap_err();
        match err {
            PipelineError::Moderation { categories, .. } => {
                assert!(categories[0].starts_with("low entropy"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn entropy_of_uniform_text_is_low() {
        assert!(char_entropy("aaaaaaa") < 1.0);
        assert!(char_entropy("The quarterly business review covers revenue") > MIN_ENTROPY_BITS);
    }
}

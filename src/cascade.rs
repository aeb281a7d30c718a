//! The parse cascade: a fixed chain of strategies from strict to tolerant,
//! stopping at the first success.
//!
//! Every strategy is a pure total function from content to [`ParseResult`];
//! a failed strategy only triggers fallthrough. The chain is closed data,
//! not an extension point, so its ordering is part of the crate's contract.

use crate::config::SCALAR_REJECT_RATIO;
use crate::models::ParseResult;
use crate::patterns::YAML_FIXES;
use crate::tokenizer;
use serde_yaml::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Standard,
    Cleaned,
    Mangled,
    Reconstructed,
    Partial,
}

impl ParseStrategy {
    /// The fixed chain, strictest first.
    pub const CHAIN: [ParseStrategy; 5] = [
        ParseStrategy::Standard,
        ParseStrategy::Cleaned,
        ParseStrategy::Mangled,
        ParseStrategy::Reconstructed,
        ParseStrategy::Partial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStrategy::Standard => "standard_yaml",
            ParseStrategy::Cleaned => "cleaned_yaml",
            ParseStrategy::Mangled => "mangled_yaml",
            ParseStrategy::Reconstructed => "reconstructed_yaml",
            ParseStrategy::Partial => "partial_yaml",
        }
    }

    fn attempt(&self, content: &str) -> ParseResult {
        match self {
            ParseStrategy::Standard => parse_standard(content),
            ParseStrategy::Cleaned => parse_cleaned(content),
            ParseStrategy::Mangled => parse_mangled(content),
            ParseStrategy::Reconstructed => parse_reconstructed(content),
            ParseStrategy::Partial => parse_partial(content),
        }
    }
}

/// Cumulative cascade counters; relaxed atomics, safe to share.
#[derive(Default)]
struct CascadeCounters {
    total_attempts: AtomicU64,
    successful_parses: AtomicU64,
    strategy_successes: [AtomicU64; 5],
}

/// Point-in-time view of the cascade counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStats {
    pub total_attempts: u64,
    pub successful_parses: u64,
    pub strategy_successes: Vec<(&'static str, u64)>,
}

#[derive(Default)]
pub struct CascadeParser {
    counters: CascadeCounters,
}

impl CascadeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the chain in order; first success wins. Exhausting every
    /// strategy yields a single aggregated failure carrying the last error.
    pub fn parse(&self, content: &str) -> ParseResult {
        self.counters.total_attempts.fetch_add(1, Ordering::Relaxed);

        if content.trim().is_empty() {
            return ParseResult::failure("Empty or whitespace-only content", content);
        }

        let mut last_error = None;
        for (index, strategy) in ParseStrategy::CHAIN.iter().enumerate() {
            let result = strategy.attempt(content);
            if result.success {
                self.counters
                    .successful_parses
                    .fetch_add(1, Ordering::Relaxed);
                self.counters.strategy_successes[index].fetch_add(1, Ordering::Relaxed);
                debug!(strategy = strategy.as_str(), "parse succeeded");
                return result;
            }
            debug!(
                strategy = strategy.as_str(),
                error = result.error_message.as_deref().unwrap_or(""),
                "strategy failed"
            );
            last_error = result.error_message;
        }

        ParseResult::failure(
            format!(
                "All parsing strategies failed. Last error: {}",
                last_error.unwrap_or_default()
            ),
            content,
        )
    }

    pub fn stats(&self) -> CascadeStats {
        CascadeStats {
            total_attempts: self.counters.total_attempts.load(Ordering::Relaxed),
            successful_parses: self.counters.successful_parses.load(Ordering::Relaxed),
            strategy_successes: ParseStrategy::CHAIN
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    (
                        s.as_str(),
                        self.counters.strategy_successes[i].load(Ordering::Relaxed),
                    )
                })
                .collect(),
        }
    }
}

/// Cheap structure check gating the strict strategies: some colon or a
/// leading dash, and nothing screaming prose.
fn looks_structured(content: &str) -> bool {
    let trimmed = content.trim();
    let has_structure =
        content.contains(':') || content.contains('：') || trimmed.starts_with('-');

    let prose_like = trimmed.starts_with("This is")
        || trimmed.starts_with("Hello")
        || content.contains("@#$%^&*()")
        || content.matches('!').count() > 3;

    has_structure && !prose_like
}

/// Wider net for the repair strategy: any structural character at all.
fn could_be_recoverable(content: &str) -> bool {
    let trimmed = content.trim();
    let has_structure = content.contains(':')
        || content.contains('：')
        || content.contains(',')
        || content.contains('[')
        || content.contains(']')
        || content.contains('{')
        || content.contains('}')
        || trimmed.starts_with('-');

    let hopeless = content.contains("@#$%^&*()")
        || content.matches('!').count() > 3
        || (trimmed.starts_with("This is") && content.to_lowercase().contains("not"));

    has_structure && !hopeless
}

/// A bare string result is only meaningful if it is substantially shorter
/// than its input; otherwise the parser just swallowed the whole blob.
fn meaningful_scalar(parsed: &str, original: &str) -> bool {
    (parsed.trim().len() as f64) < original.trim().len() as f64 * SCALAR_REJECT_RATIO
}

fn parse_yaml_checked(candidate: &str, original: &str, null_label: &str, error_label: &str) -> ParseResult {
    match serde_yaml::from_str::<Value>(candidate) {
        Ok(Value::Null) => ParseResult::failure(null_label, original),
        Ok(Value::String(s)) => {
            if meaningful_scalar(&s, original) {
                ParseResult::success(Value::String(s), original)
            } else {
                ParseResult::failure(
                    "Content parsed as plain string, not structured data",
                    original,
                )
            }
        }
        Ok(value) => ParseResult::success(value, original),
        Err(e) => ParseResult::failure(format!("{}: {}", error_label, e), original),
    }
}

fn parse_standard(content: &str) -> ParseResult {
    if !looks_structured(content) {
        return ParseResult::failure("Content does not appear to be YAML", content);
    }
    parse_yaml_checked(content, content, "YAML parsed to null", "YAML syntax error")
}

fn parse_cleaned(content: &str) -> ParseResult {
    if !looks_structured(content) {
        return ParseResult::failure("Content does not appear to be YAML", content);
    }

    let mut cleaned = content.to_string();
    for (pattern, replacement) in YAML_FIXES.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }
    let cleaned = remove_common_indent(&cleaned);

    parse_yaml_checked(
        &cleaned,
        content,
        "Cleaned YAML parsed to null",
        "YAML error after cleaning",
    )
}

fn parse_mangled(content: &str) -> ParseResult {
    if !could_be_recoverable(content) {
        return ParseResult::failure("Content does not appear recoverable", content);
    }

    let repaired = tokenizer::repair_content(content);
    if repaired.content.trim().is_empty() {
        return ParseResult::failure("Content disappeared after repair", content);
    }

    parse_yaml_checked(
        &repaired.content,
        content,
        "Repaired YAML parsed to null",
        "YAML error after repair",
    )
}

fn parse_reconstructed(content: &str) -> ParseResult {
    let pairs = extract_key_value_pairs(content);
    if pairs.is_empty() {
        return ParseResult::failure("No key-value pairs found", content);
    }

    let meaningful = pairs
        .iter()
        .filter(|(k, v)| !k.is_empty() && !v.is_empty() && !k.starts_with('_'))
        .count();
    if meaningful < 1 {
        return ParseResult::failure("No meaningful key-value pairs recovered", content);
    }

    let mut mapping = serde_yaml::Mapping::new();
    for (key, value) in pairs {
        let parsed = serde_yaml::from_str::<Value>(&value)
            .unwrap_or_else(|_| Value::String(strip_quotes(&value)));
        mapping.insert(Value::String(key), parsed);
    }

    ParseResult::success(Value::Mapping(mapping), content)
}

fn parse_partial(content: &str) -> ParseResult {
    let pairs = extract_key_value_pairs(content);
    if pairs.is_empty() {
        return ParseResult::failure("No key-value pairs found", content);
    }

    let mut mapping = serde_yaml::Mapping::new();
    let mut warnings = Vec::new();
    for (key, value) in pairs {
        match serde_yaml::from_str::<Value>(&value) {
            Ok(parsed) => {
                mapping.insert(Value::String(key), parsed);
            }
            Err(_) => {
                warnings.push(Value::String(format!(
                    "Could not parse value for key '{}', using as string",
                    key
                )));
                mapping.insert(Value::String(key), Value::String(strip_quotes(&value)));
            }
        }
    }

    if !warnings.is_empty() {
        mapping.insert(
            Value::String("_parsing_warnings".to_string()),
            Value::Sequence(warnings),
        );
    }

    ParseResult::success(Value::Mapping(mapping), content)
}

/// Split each non-comment line on its first colon; empty keys or values
/// are skipped.
fn extract_key_value_pairs(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }
    pairs
}

fn strip_quotes(value: &str) -> String {
    value.trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Remove the indentation shared by every non-empty line, so uniformly
/// indented blocks parse as top-level mappings.
fn remove_common_indent(content: &str) -> String {
    let min_indent = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    if min_indent == 0 {
        return content.to_string();
    }

    content
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                match line.char_indices().nth(min_indent) {
                    Some((idx, _)) => &line[idx..],
                    None => line.trim_start(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(value: &Value, key: &str) -> Value {
        value[key].clone()
    }

    #[test]
    fn standard_parses_clean_yaml() {
        let parser = CascadeParser::new();
        let result = parser.parse("name: test\nvalue: 123");
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(get(&data, "name"), Value::String("test".into()));
        assert_eq!(get(&data, "value"), Value::Number(123.into()));

        let stats = parser.stats();
        assert_eq!(stats.total_attempts, 1);
        assert_eq!(stats.successful_parses, 1);
        assert_eq!(stats.strategy_successes[0], ("standard_yaml", 1));
    }

    #[test]
    fn empty_content_fails_without_trying_strategies() {
        let parser = CascadeParser::new();
        let result = parser.parse("   \n  ");
        assert!(!result.success);
        assert!(result
            .error_message
            .unwrap()
            .contains("Empty or whitespace-only"));
    }

    #[test]
    fn prose_exhausts_the_chain() {
        let parser = CascadeParser::new();
        let result = parser.parse("just some words with no structure at all");
        assert!(!result.success);
        assert!(result
            .error_message
            .unwrap()
            .starts_with("All parsing strategies failed"));
        assert_eq!(parser.stats().successful_parses, 0);
    }

    #[test]
    fn whole_blob_scalar_rejected() {
        let result = parse_standard("\"name: test\"");
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("plain string"));
    }

    #[test]
    fn short_scalar_result_accepted() {
        // the parsed scalar is far shorter than the commented input
        let content = "\"key: v\"  # a trailing comment that makes the raw input much longer";
        let result = parse_standard(content);
        assert!(result.success);
        assert_eq!(result.data.unwrap(), Value::String("key: v".into()));
    }

    #[test]
    fn cleaned_fixes_missing_colon_spaces() {
        let parser = CascadeParser::new();
        let result = parser.parse("name:test\nvalue:123");
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(get(&data, "name"), Value::String("test".into()));

        let stats = parser.stats();
        assert_eq!(stats.strategy_successes[1], ("cleaned_yaml", 1));
    }

    #[test]
    fn cleaned_dedents_uniform_indentation() {
        let result = parse_cleaned("    name: test\n    value: 123");
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(get(&data, "name"), Value::String("test".into()));
    }

    #[test]
    fn mangled_drops_broken_line() {
        let parser = CascadeParser::new();
        let result = parser.parse("name: ok\nbroken: [1, 2\nvalue: 3");
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(get(&data, "name"), Value::String("ok".into()));
        assert_eq!(get(&data, "value"), Value::Number(3.into()));
        assert!(data.as_mapping().unwrap().len() == 2);

        let stats = parser.stats();
        assert_eq!(stats.strategy_successes[2], ("mangled_yaml", 1));
    }

    #[test]
    fn reconstructed_handles_extra_colons() {
        let parser = CascadeParser::new();
        let result = parser.parse("name: test: extra: colons\nkind: demo: yes");
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(
            get(&data, "name"),
            Value::String("test: extra: colons".into())
        );

        let stats = parser.stats();
        assert_eq!(stats.strategy_successes[3], ("reconstructed_yaml", 1));
    }

    #[test]
    fn partial_is_the_last_resort_with_warnings() {
        let parser = CascadeParser::new();
        // every key is underscore-prefixed, so Reconstructed refuses, and
        // every value is unparseable, so Partial records warnings
        let result = parser.parse("_meta: {unclosed\n_x: *ref");
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(get(&data, "_meta"), Value::String("{unclosed".into()));
        let warnings = get(&data, "_parsing_warnings");
        assert_eq!(warnings.as_sequence().unwrap().len(), 2);

        let stats = parser.stats();
        assert_eq!(stats.strategy_successes[4], ("partial_yaml", 1));
    }

    #[test]
    fn extract_pairs_skips_comments_and_blanks() {
        let pairs = extract_key_value_pairs("# header\nname: test\n\nurl: https://x.dev\nbare line");
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "test".to_string()),
                ("url".to_string(), "https://x.dev".to_string()),
            ]
        );
    }

    #[test]
    fn extract_pairs_splits_on_first_colon_only() {
        let pairs = extract_key_value_pairs("when: 12:30:45");
        assert_eq!(pairs, vec![("when".to_string(), "12:30:45".to_string())]);
    }

    #[test]
    fn recoverability_gate() {
        assert!(could_be_recoverable("a, b, c"));
        assert!(could_be_recoverable("- item"));
        assert!(!could_be_recoverable("plain words only"));
        assert!(!could_be_recoverable("This is not data, not at all"));
        assert!(!could_be_recoverable("wow!!!! amazing!!!!"));
    }

    #[test]
    fn structure_gate() {
        assert!(looks_structured("key: value"));
        assert!(looks_structured("- item"));
        assert!(!looks_structured("This is a sentence: with a colon"));
        assert!(!looks_structured("no structure here"));
    }

    #[test]
    fn counters_accumulate_across_calls() {
        let parser = CascadeParser::new();
        parser.parse("a: 1");
        parser.parse("b: 2");
        parser.parse("no structure at all here");

        let stats = parser.stats();
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.successful_parses, 2);
        assert_eq!(stats.strategy_successes[0].1, 2);
    }

    #[test]
    fn strategies_never_panic_on_hostile_input() {
        for content in [
            "\u{0000}",
            "]]][[[",
            ":::::",
            "- - -",
            "{{{{{",
            "\u{201C}curly\u{201D}: quotes",
        ] {
            for strategy in ParseStrategy::CHAIN {
                let _ = strategy.attempt(content);
            }
        }
    }
}

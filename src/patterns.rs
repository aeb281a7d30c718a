//! Versioned, data-only pattern tables shared by the detection pipeline.
//!
//! Every regex the pipeline matches against lives here rather than inline at
//! its call site, so the tables can be reviewed and unit-tested on their own.
//! The classifier indicator tables and the contamination table are calibration
//! data: entries are frozen for compatibility, not tuned for elegance.

use crate::models::{ContaminationType, ContentCategory};
use once_cell::sync::Lazy;
use regex::Regex;

// --- island detection ---

/// A `key: value` pair anywhere in a line (fullwidth colon included).
pub static YAML_KEY_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w\-]+\s*[:：]").unwrap());

/// A `- item` list entry at the start of a line.
pub static YAML_DASH_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-\s+[\w\-]+").unwrap());

/// A `key: |` multiline block scalar opener.
pub static YAML_BLOCK_SCALAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w\-]+\s*[:：]\s*\|").unwrap());

/// Quick shape checks distinguishing JSON objects from bare-brace noise.
pub static JSON_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"\{\s*"[\w\-]+"\s*:\s*["\d\[\{]"#).unwrap(),
        Regex::new(r#""\s*:\s*\["#).unwrap(),
    ]
});

// --- contamination detection ---

/// Per-type contamination indicators, applied to an island and its
/// surrounding context. `MalformedStructure` is detected by bracket
/// accounting in the island detector, not by a pattern.
pub static CONTAMINATION_PATTERNS: Lazy<Vec<(ContaminationType, Regex)>> = Lazy::new(|| {
    vec![
        (
            // C0 controls survive only direct detector use; the C1 range
            // also survives sanitization.
            ContaminationType::BinaryData,
            Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x{9F}]+").unwrap(),
        ),
        (
            ContaminationType::LogPrefixes,
            Regex::new(r"(?m)^\d{4}-\d{2}-\d{2}[\s\[]|^INFO|^DEBUG|^ERROR|^WARN").unwrap(),
        ),
        (
            ContaminationType::CodeFragments,
            Regex::new(r"(?m)^\s*(def|class|import|function|var|const)\s+").unwrap(),
        ),
        (
            ContaminationType::RandomText,
            Regex::new(r"[A-Za-z]{50,}").unwrap(),
        ),
        (
            ContaminationType::EncodingIssues,
            Regex::new(r"\x{FFFD}").unwrap(),
        ),
    ]
});

// --- island cleaning ---

/// Control bytes removed from islands flagged as binary-contaminated.
pub static BINARY_BYTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x{9F}]+").unwrap());

/// `2024-01-01 [LEVEL] ` style line prefix.
pub static LOG_TIMESTAMP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[\s\[].*?\]\s*").unwrap());

/// Bare `INFO: ` / `ERROR - ` style line prefix.
pub static LOG_LEVEL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(INFO|DEBUG|ERROR|WARN)\s*[:\-]\s*").unwrap());

/// Runs of four or more newlines; the replacement is length-dependent.
pub static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

// --- cascade cleaning ---

/// Ordered fix table for the Cleaned strategy: (pattern, replacement).
pub static YAML_FIXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // missing space after a colon
        (Regex::new(r"(\w):([^\s\n])").unwrap(), "${1}: ${2}"),
        // missing space after a list dash
        (Regex::new(r"(?m)^(\s*)-([^\s])").unwrap(), "${1}- ${2}"),
        // tabs to two spaces
        (Regex::new(r"\t").unwrap(), "  "),
        // Windows line endings
        (Regex::new(r"\r\n").unwrap(), "\n"),
        // collapse three or more blank lines
        (Regex::new(r"\n\s*\n\s*\n+").unwrap(), "\n\n"),
        // trailing whitespace
        (Regex::new(r"(?m)[ \t]+$").unwrap(), ""),
        // quote bare values holding YAML-special characters
        (
            Regex::new(r#"(?m):\s*([^"'\n\[\{]*[&*|>@`][^"'\n\[\{]*?)\s*$"#).unwrap(),
            ": \"${1}\"",
        ),
    ]
});

// --- content classification ---

/// Frozen category declaration order; ties go to the earliest entry.
pub const CATEGORY_ORDER: [ContentCategory; 5] = [
    ContentCategory::Workflow,
    ContentCategory::Prompt,
    ContentCategory::Notebook,
    ContentCategory::EnvVar,
    ContentCategory::Rule,
];

/// Indicator patterns per category, matched against lowercased,
/// punctuation-normalized content. Score = matches / table length.
pub static CATEGORY_INDICATORS: Lazy<Vec<(ContentCategory, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            ContentCategory::Workflow,
            compile(&[
                r"name\s*:\s*.+command\s*:",
                r"shells\s*:\s*[\[\-]",
                r"command\s*:\s*.+",
                r"name\s*:.*tags\s*:",
                r"arguments\s*:\s*\n\s*-",
            ]),
        ),
        (
            ContentCategory::Prompt,
            compile(&[
                r"name\s*:\s*.+prompt\s*:",
                r"prompt\s*:\s*.+\{\{.*\}\}",
                r"arguments\s*:\s*-\s*name\s*:",
            ]),
        ),
        (
            ContentCategory::Notebook,
            compile(&[
                r"title\s*:\s*.+description\s*:.+tags\s*:\s*\n\s*-",
                r"```[^`]*```",
                r"(?m)^#+\s+[^\n]*\n.*```",
            ]),
        ),
        (
            ContentCategory::EnvVar,
            compile(&[
                r"variables\s*:\s*\n\s+\w+\s*:",
                r"scope\s*:\s*(user|system|session)",
            ]),
        ),
        (
            ContentCategory::Rule,
            compile(&[
                r"title\s*:\s*.+description\s*:.+guidelines\s*:\s*-",
                r"category\s*:\s*\w+",
                r"guidelines\s*:\s*\n\s*-",
            ]),
        ),
    ]
});

// --- sanitizer denylist ---

/// Control characters stripped during sanitization.
pub static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

/// Patterns whose presence makes content fatal to the current call.
/// The control-char entry is reachable only for callers checking raw text;
/// `sanitize` strips control characters before consulting the list.
pub static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?is)<script[^>]*>.*?</script>",
        r"(?i)javascript:",
        r"(?is)data:.*base64",
        r"(?i)vbscript:",
        r"(?i)file://",
        r"\\x[0-9a-fA-F]{2}",
        r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]",
        r"(?i)eval\s*\(",
        r"(?i)exec\s*\(",
        r"(?i)system\s*\(",
        r"(?i)popen\s*\(",
        r"(?i)subprocess",
        r"(?i)import\s+os",
        r"(?i)__import__",
    ])
});

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources.iter().map(|s| Regex::new(s).unwrap()).collect()
}

//! Island detection: finding candidate spans of structured content inside
//! noisy text, classifying the noise around them, cleaning them, and scoring
//! the result.
//!
//! Two scans run over the input. The YAML scan accumulates runs of
//! schema-looking lines; the JSON scan tracks outermost brace spans and
//! keeps only those passing a quick shape check. Overlapping candidates are
//! resolved greedily in favor of quality.

use crate::config::{
    CONTEXT_BYTES, CONTEXT_LINES_AFTER, CONTEXT_LINES_BEFORE, MIN_YAML_BLOCK_LINES,
};
use crate::models::ContaminationType;
use crate::patterns::{
    BINARY_BYTES, CONTAMINATION_PATTERNS, JSON_SHAPES, LOG_LEVEL_PREFIX, LOG_TIMESTAMP_PREFIX,
    NEWLINE_RUNS, YAML_BLOCK_SCALAR, YAML_DASH_ITEM, YAML_KEY_COLON,
};
use memchr::memchr2;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// A candidate span of structured content, cleaned and scored.
#[derive(Debug, Clone)]
pub struct ContentIsland {
    pub cleaned_content: String,
    pub raw_content: String,
    /// Byte offset of the island's first byte in the scanned input
    pub start_offset: usize,
    /// Byte offset one past the island's last byte
    pub end_offset: usize,
    pub quality_score: f64,
    pub source_type: String,
    pub extraction_method: String,
    pub contamination_types: BTreeSet<ContaminationType>,
    pub cleaning_warnings: Vec<String>,
    pub surrounding_context: String,
}

/// Find candidate islands, resolve overlaps, and rank by quality descending.
pub fn find_islands(content: &str, source_hint: Option<&str>) -> Vec<ContentIsland> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let source_type = source_hint.unwrap_or("unknown");
    debug!(bytes = content.len(), "scanning for islands");

    let mut islands = find_yaml_islands(content, source_type);
    islands.extend(find_json_islands(content, source_type));

    let islands = resolve_overlaps(islands);
    debug!(count = islands.len(), "islands found");
    islands
}

fn yaml_line_matches(line: &str) -> bool {
    YAML_KEY_COLON.is_match(line)
        || YAML_DASH_ITEM.is_match(line)
        || YAML_BLOCK_SCALAR.is_match(line)
}

/// Line-state accumulation: schema-looking lines extend the current block;
/// a `---` separator or a non-matching line ends it. Blocks need at least
/// two matching lines, except a single line directly before a separator or
/// at end-of-input is allowed.
fn find_yaml_islands(content: &str, source_type: &str) -> Vec<ContentIsland> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut islands = Vec::new();
    let mut block_start: Option<usize> = None;
    let mut block_lines = 0usize;

    let close_block = |start: &mut Option<usize>,
                           count: &mut usize,
                           end_line: usize,
                           min_lines: usize,
                           islands: &mut Vec<ContentIsland>| {
        if let Some(s) = start.take() {
            if *count >= min_lines {
                if let Some(island) =
                    island_from_lines(&lines, s, end_line, "yaml_block", source_type, content)
                {
                    islands.push(island);
                }
            }
        }
        *count = 0;
    };

    for (i, line) in lines.iter().enumerate() {
        if yaml_line_matches(line) {
            if block_start.is_none() {
                block_start = Some(i);
            }
            block_lines += 1;
        } else if line.trim() == "---" {
            close_block(&mut block_start, &mut block_lines, i.saturating_sub(1), 1, &mut islands);
        } else {
            close_block(
                &mut block_start,
                &mut block_lines,
                i.saturating_sub(1),
                MIN_YAML_BLOCK_LINES,
                &mut islands,
            );
        }
    }

    let last = lines.len().saturating_sub(1);
    close_block(&mut block_start, &mut block_lines, last, 1, &mut islands);

    islands
}

/// Outermost-brace spans that also look like JSON objects. Nested objects
/// are excluded naturally since only depth 1-to-0 transitions close a span.
fn find_json_islands(content: &str, source_type: &str) -> Vec<ContentIsland> {
    let bytes = content.as_bytes();
    let mut islands = Vec::new();
    let mut depth = 0usize;
    let mut span_start: Option<usize> = None;
    let mut pos = 0;

    while let Some(off) = memchr2(b'{', b'}', &bytes[pos..]) {
        let i = pos + off;
        if bytes[i] == b'{' {
            depth += 1;
            if depth == 1 {
                span_start = Some(i);
            }
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(start) = span_start.take() {
                    let candidate = &content[start..i + 1];
                    if JSON_SHAPES.iter().any(|p| p.is_match(candidate)) {
                        if let Some(island) = island_from_content(
                            candidate,
                            start,
                            i + 1,
                            "json_block",
                            source_type,
                            content,
                            None,
                        ) {
                            islands.push(island);
                        }
                    }
                }
            }
        }
        pos = i + 1;
    }

    islands
}

fn island_from_lines(
    lines: &[&str],
    start_line: usize,
    end_line: usize,
    extraction_method: &str,
    source_type: &str,
    full_content: &str,
) -> Option<ContentIsland> {
    if start_line > end_line || end_line >= lines.len() {
        return None;
    }

    let raw_content = lines[start_line..=end_line].join("\n");
    let byte_start: usize = lines[..start_line].iter().map(|l| l.len() + 1).sum();
    let byte_end = byte_start + raw_content.len();

    // widen the window so contamination just outside the block is seen
    let context_start = start_line.saturating_sub(CONTEXT_LINES_BEFORE);
    let context_end = (end_line + CONTEXT_LINES_AFTER).min(lines.len());
    let surrounding = lines[context_start..context_end].join("\n");

    island_from_content(
        &raw_content,
        byte_start,
        byte_end,
        extraction_method,
        source_type,
        full_content,
        Some(surrounding),
    )
}

fn island_from_content(
    content: &str,
    start_offset: usize,
    end_offset: usize,
    extraction_method: &str,
    source_type: &str,
    full_content: &str,
    surrounding: Option<String>,
) -> Option<ContentIsland> {
    if content.trim().is_empty() {
        return None;
    }

    let surrounding = surrounding
        .unwrap_or_else(|| byte_window(full_content, start_offset, end_offset).to_string());

    let mut contamination = classify_contamination(content);
    // context contributes too: union, not intersection
    for found in classify_contamination(&surrounding) {
        if found != ContaminationType::MalformedStructure {
            contamination.insert(found);
        }
    }

    let (cleaned_content, cleaning_warnings) = clean_content(content, &contamination);
    let quality_score = calculate_quality(&cleaned_content, &contamination);

    Some(ContentIsland {
        cleaned_content,
        raw_content: content.to_string(),
        start_offset,
        end_offset,
        quality_score,
        source_type: source_type.to_string(),
        extraction_method: extraction_method.to_string(),
        contamination_types: contamination,
        cleaning_warnings,
        surrounding_context: surrounding,
    })
}

/// Contamination indicators for one piece of text: the regex table plus a
/// bracket-accounting check for structurally broken spans.
pub fn classify_contamination(text: &str) -> BTreeSet<ContaminationType> {
    let mut found: BTreeSet<ContaminationType> = CONTAMINATION_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(kind, _)| *kind)
        .collect();

    if has_unbalanced_brackets(text) {
        found.insert(ContaminationType::MalformedStructure);
    }

    found
}

fn has_unbalanced_brackets(text: &str) -> bool {
    let mut braces = 0i64;
    let mut brackets = 0i64;
    for b in text.bytes() {
        match b {
            b'{' => braces += 1,
            b'}' => braces -= 1,
            b'[' => brackets += 1,
            b']' => brackets -= 1,
            _ => {}
        }
        if braces < 0 || brackets < 0 {
            return true;
        }
    }
    braces != 0 || brackets != 0
}

/// Type-specific cleaning. Binary bytes are stripped outright; log prefixes
/// are stripped line by line with now-empty lines dropped; newline runs are
/// collapsed with the 4-to-3 / 5-plus-to-2 asymmetry kept as calibrated.
fn clean_content(
    content: &str,
    contamination: &BTreeSet<ContaminationType>,
) -> (String, Vec<String>) {
    let mut cleaned = content.to_string();
    let mut warnings = Vec::new();

    if contamination.contains(&ContaminationType::BinaryData) {
        let before = cleaned.chars().count();
        cleaned = BINARY_BYTES.replace_all(&cleaned, "").into_owned();
        let removed = before - cleaned.chars().count();
        if removed > 0 {
            warnings.push(format!("Removed {} binary characters", removed));
        }
    }

    if contamination.contains(&ContaminationType::LogPrefixes) {
        let mut kept_lines = Vec::new();
        let mut stripped = 0usize;

        for line in cleaned.split('\n') {
            let without_timestamp = LOG_TIMESTAMP_PREFIX.replace(line, "");
            let without_level = LOG_LEVEL_PREFIX.replace(&without_timestamp, "").into_owned();

            if without_level != line {
                stripped += 1;
            }
            if !without_level.trim().is_empty() {
                kept_lines.push(without_level);
            }
        }

        if stripped > 0 {
            warnings.push(format!("Cleaned {} log prefix lines", stripped));
        }
        cleaned = kept_lines.join("\n");
    }

    cleaned = NEWLINE_RUNS
        .replace_all(&cleaned, |caps: &regex::Captures| {
            if caps[0].len() == 4 {
                "\n\n\n"
            } else {
                "\n\n"
            }
        })
        .into_owned();

    (cleaned, warnings)
}

/// Quality in [0, 1]: perfect minus 0.15 per contamination type, plus up to
/// 0.3 for the fraction of non-blank lines that look schema-shaped.
/// Empty or whitespace content scores exactly 0.0.
fn calculate_quality(content: &str, contamination: &BTreeSet<ContaminationType>) -> f64 {
    if content.trim().is_empty() {
        return 0.0;
    }

    let mut score = 1.0 - contamination.len() as f64 * 0.15;

    let non_blank: Vec<&str> = content
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if !non_blank.is_empty() {
        let schema_lines = non_blank.iter().filter(|l| is_schema_line(l)).count();
        score += schema_lines as f64 / non_blank.len() as f64 * 0.3;
    }

    score.clamp(0.0, 1.0)
}

fn is_schema_line(line: &str) -> bool {
    (line.contains(':') && !line.starts_with('#')) || line.starts_with("- ")
}

/// Greedy overlap resolution: stable-sort by quality descending (scan order
/// breaks ties), keep an island only if it is disjoint from everything
/// already kept.
fn resolve_overlaps(mut islands: Vec<ContentIsland>) -> Vec<ContentIsland> {
    if islands.len() <= 1 {
        return islands;
    }

    islands.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<ContentIsland> = Vec::new();
    for island in islands {
        let overlapping = kept.iter().any(|k| {
            !(island.end_offset <= k.start_offset || k.end_offset <= island.start_offset)
        });
        if !overlapping {
            kept.push(island);
        }
    }

    kept
}

/// Byte window around a span, widened to char boundaries.
fn byte_window(content: &str, start: usize, end: usize) -> &str {
    let mut from = start.saturating_sub(CONTEXT_BYTES);
    while from > 0 && !content.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + CONTEXT_BYTES).min(content.len());
    while to > 0 && !content.is_char_boundary(to) {
        to -= 1;
    }
    &content[from..to]
}

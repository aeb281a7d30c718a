//! Token-level structural repair for mangled markup.
//!
//! A single left-to-right scan lexes content into typed tokens, a fixed
//! sequence of repair passes fixes common structural breakage, and the
//! surviving tokens are concatenated back into cleaned text. Tokens are an
//! implementation detail of this module; callers only see [`repair_content`].

use crate::config::MAX_KEY_LENGTH;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Key,
    Colon,
    Value,
    ListStart,
    ListEnd,
    DictStart,
    DictEnd,
    Comma,
    Dash,
    Quote,
    Newline,
    Whitespace,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

/// Result of the repair pipeline: cleaned text plus applied-fix diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    pub content: String,
    pub fixes: Vec<String>,
}

/// Key names that appear across the supported schema shapes.
static KNOWN_KEYS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "name",
        "command",
        "shells",
        "arguments",
        "tags",
        "description",
        "prompt",
        "template",
        "variables",
        "title",
        "scope",
        "category",
        "guidelines",
        "rules",
        "env",
        "cells",
        "default_value",
    ]
    .into_iter()
    .collect()
});

/// Single-edit typos observed in real exports; applied to Key tokens only.
const TYPO_FIXES: &[(&str, &str)] = &[
    ("nmae", "name"),
    ("comand", "command"),
    ("commnd", "command"),
    ("descripion", "description"),
    ("descriptio", "description"),
    ("aruments", "arguments"),
    ("argments", "arguments"),
];

/// Tokenize, run every repair pass in order, and reconstruct.
///
/// Pure and total: malformed input degrades to fewer tokens, never to a
/// panic. Empty input passes through unchanged with empty diagnostics.
pub fn repair_content(content: &str) -> Repaired {
    if content.is_empty() {
        return Repaired {
            content: String::new(),
            fixes: Vec::new(),
        };
    }

    let mut fixes = Vec::new();
    let tokens = tokenize(content);
    let tokens = drop_unbalanced_lines(tokens, &mut fixes);
    let tokens = insert_missing_commas(tokens, &mut fixes);
    let tokens = enforce_colon_spacing(tokens, &mut fixes);
    let tokens = fix_key_typos(tokens, &mut fixes);
    let tokens = prune_empty_unknown(tokens, &mut fixes);

    Repaired {
        content: reconstruct(&tokens),
        fixes,
    }
}

/// Lex content into typed tokens. Fullwidth colons/commas and curly quotes
/// are normalized to their ASCII forms in the token text.
fn tokenize(content: &str) -> Vec<Token> {
    let chars: Vec<char> = content.chars().collect();
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut column: u32 = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            tokens.push(Token::new(TokenKind::Newline, "\n", line, column));
            line += 1;
            column = 1;
            i += 1;
            continue;
        }

        if c.is_whitespace() {
            let start = i;
            while i < chars.len() && chars[i].is_whitespace() && chars[i] != '\n' {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::Whitespace, text, line, column));
            column += (i - start) as u32;
            continue;
        }

        if let Some((kind, normalized)) = structural_token(c) {
            tokens.push(Token::new(kind, normalized, line, column));
            column += 1;
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && !is_structural(chars[i]) {
            i += 1;
        }
        let text: String = chars[start..i].iter().collect();
        let width = (i - start) as u32;
        if !text.is_empty() {
            let kind = classify_text(&text);
            tokens.push(Token::new(kind, text, line, column));
        }
        column += width;
    }

    tokens
}

fn structural_token(c: char) -> Option<(TokenKind, &'static str)> {
    match c {
        ':' | '：' => Some((TokenKind::Colon, ":")),
        '[' => Some((TokenKind::ListStart, "[")),
        ']' => Some((TokenKind::ListEnd, "]")),
        '{' => Some((TokenKind::DictStart, "{")),
        '}' => Some((TokenKind::DictEnd, "}")),
        ',' | '，' => Some((TokenKind::Comma, ",")),
        '-' => Some((TokenKind::Dash, "-")),
        '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' => {
            Some((TokenKind::Quote, "\""))
        }
        _ => None,
    }
}

fn is_structural(c: char) -> bool {
    c.is_whitespace() || structural_token(c).is_some()
}

/// Key-vs-value heuristic for a text run: known vocabulary, identifier
/// shape, or short and free of prohibited characters means Key.
fn classify_text(text: &str) -> TokenKind {
    let lowered = text.to_lowercase();
    if KNOWN_KEYS.contains(lowered.as_str()) {
        return TokenKind::Key;
    }

    if is_identifier(text) || text.contains('_') || text.contains('-') || has_wide_chars(text) {
        return TokenKind::Key;
    }

    const PROHIBITED: &[char] = &[' ', '"', '(', ')', '[', ']', '{', '}'];
    if text.chars().count() <= MAX_KEY_LENGTH && !text.contains(PROHIBITED) {
        return TokenKind::Key;
    }

    TokenKind::Value
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn has_wide_chars(text: &str) -> bool {
    text.chars()
        .filter(|c| *c != '_' && *c != '-')
        .any(|c| !c.is_ascii())
}

/// Pass 1: a line with an unmatched opener or orphaned closer is dropped
/// wholesale. Merging brackets across lines is unsafe without deeper
/// context, so the whole line goes.
fn drop_unbalanced_lines(tokens: Vec<Token>, fixes: &mut Vec<String>) -> Vec<Token> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let line = tokens[i].line;
        let mut end = i;
        while end < tokens.len() && tokens[end].line == line {
            end += 1;
        }

        if line_is_balanced(&tokens[i..end]) {
            kept.extend_from_slice(&tokens[i..end]);
        } else {
            fixes.push(format!("Removed line {} with unbalanced brackets", line));
        }
        i = end;
    }

    kept
}

fn line_is_balanced(line_tokens: &[Token]) -> bool {
    let mut stack = Vec::new();
    for token in line_tokens {
        match token.kind {
            TokenKind::ListStart => stack.push(TokenKind::ListStart),
            TokenKind::DictStart => stack.push(TokenKind::DictStart),
            TokenKind::ListEnd => {
                if stack.pop() != Some(TokenKind::ListStart) {
                    return false;
                }
            }
            TokenKind::DictEnd => {
                if stack.pop() != Some(TokenKind::DictStart) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

/// Pass 2: a synthetic comma between strictly adjacent Value tokens.
fn insert_missing_commas(tokens: Vec<Token>, fixes: &mut Vec<String>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for i in 0..tokens.len() {
        let token = tokens[i].clone();
        let line = token.line;
        let column = token.column;
        let is_value = token.kind == TokenKind::Value;
        out.push(token);

        if is_value && tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Value) {
            out.push(Token::new(TokenKind::Comma, ",", line, column));
            fixes.push(format!("Added missing comma after value at line {}", line));
        }
    }
    out
}

/// Pass 3: exactly one whitespace token after each colon.
fn enforce_colon_spacing(tokens: Vec<Token>, fixes: &mut Vec<String>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for i in 0..tokens.len() {
        let token = tokens[i].clone();
        let line = token.line;
        let column = token.column;
        let is_colon = token.kind == TokenKind::Colon;
        out.push(token);

        if is_colon {
            let needs_space = matches!(
                tokens.get(i + 1),
                Some(next) if next.kind != TokenKind::Whitespace && next.kind != TokenKind::Newline
            );
            if needs_space {
                out.push(Token::new(TokenKind::Whitespace, " ", line, column));
                fixes.push(format!("Added space after colon at line {}", line));
            }
        }
    }
    out
}

/// Pass 4: the fixed typo table, applied to Key tokens only.
fn fix_key_typos(tokens: Vec<Token>, fixes: &mut Vec<String>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|mut token| {
            if token.kind == TokenKind::Key {
                let lowered = token.text.to_lowercase();
                if let Some((_, fixed)) = TYPO_FIXES.iter().find(|(typo, _)| *typo == lowered) {
                    fixes.push(format!(
                        "Fixed typo: '{}' -> '{}' at line {}",
                        token.text, fixed, token.line
                    ));
                    token.text = (*fixed).to_string();
                }
            }
            token
        })
        .collect()
}

/// Pass 5: zero-length Unknown tokens are pruned.
fn prune_empty_unknown(tokens: Vec<Token>, fixes: &mut Vec<String>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| {
            let empty_unknown = token.kind == TokenKind::Unknown && token.text.trim().is_empty();
            if empty_unknown {
                fixes.push(format!("Removed empty token at line {}", token.line));
            }
            !empty_unknown
        })
        .collect()
}

fn reconstruct(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(content: &str) -> Vec<TokenKind> {
        tokenize(content).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenize_key_value_line() {
        assert_eq!(
            kinds("name: test"),
            vec![
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Whitespace,
                TokenKind::Key,
            ]
        );
    }

    #[test]
    fn tokenize_tracks_lines() {
        let tokens = tokenize("a: 1\nb: 2");
        let last = tokens.last().unwrap();
        assert_eq!(last.line, 2);
    }

    #[test]
    fn tokenize_normalizes_fullwidth_punctuation() {
        let tokens = tokenize("name：value，next");
        assert_eq!(tokens[1].kind, TokenKind::Colon);
        assert_eq!(tokens[1].text, ":");
        assert_eq!(tokens[3].kind, TokenKind::Comma);
        assert_eq!(tokens[3].text, ",");
    }

    #[test]
    fn tokenize_normalizes_curly_quotes() {
        let tokens = tokenize("\u{201C}hi\u{201D}");
        assert_eq!(tokens[0].kind, TokenKind::Quote);
        assert_eq!(tokens[0].text, "\"");
        assert_eq!(tokens[2].text, "\"");
    }

    #[test]
    fn known_vocabulary_is_key() {
        assert_eq!(classify_text("command"), TokenKind::Key);
        assert_eq!(classify_text("Description"), TokenKind::Key);
    }

    #[test]
    fn long_prose_run_is_value() {
        assert_eq!(
            classify_text("thisisaverylongrunoftextthatnobodywouldusasakey"),
            TokenKind::Value
        );
    }

    #[test]
    fn parenthesised_run_is_value() {
        assert_eq!(classify_text("call(x)"), TokenKind::Value);
    }

    #[test]
    fn unicode_key_detected() {
        assert_eq!(classify_text("名前"), TokenKind::Key);
    }

    #[test]
    fn repair_empty_input_is_identity() {
        let repaired = repair_content("");
        assert_eq!(repaired.content, "");
        assert!(repaired.fixes.is_empty());
    }

    #[test]
    fn repair_clean_input_is_identity() {
        let input = "name: test\ntags: [a, b]\n";
        let repaired = repair_content(input);
        assert_eq!(repaired.content, input);
        assert!(repaired.fixes.is_empty());
    }

    #[test]
    fn repair_drops_unbalanced_line() {
        let repaired = repair_content("good: 1\nbad: [1, 2\nalso: 2");
        assert_eq!(repaired.content, "good: 1\nalso: 2");
        assert_eq!(repaired.fixes.len(), 1);
        assert!(repaired.fixes[0].contains("line 2"));
    }

    #[test]
    fn repair_drops_orphaned_closer() {
        let repaired = repair_content("a: 1\nb: 2]\nc: 3");
        assert_eq!(repaired.content, "a: 1\nc: 3");
    }

    #[test]
    fn repair_adds_space_after_colon() {
        let repaired = repair_content("name:test");
        assert_eq!(repaired.content, "name: test");
        assert!(repaired.fixes.iter().any(|f| f.contains("space after colon")));
    }

    #[test]
    fn repair_colon_at_end_of_line_untouched() {
        let repaired = repair_content("arguments:\n- one\n");
        assert_eq!(repaired.content, "arguments:\n- one\n");
    }

    #[test]
    fn repair_fixes_key_typos() {
        let repaired = repair_content("nmae: test\ncomand: echo");
        assert_eq!(repaired.content, "name: test\ncommand: echo");
        assert_eq!(repaired.fixes.len(), 2);
    }

    #[test]
    fn typo_table_does_not_touch_values() {
        // a run with parens classifies as Value, so the table must skip it
        let repaired = repair_content("x: nmae(1)");
        assert!(repaired.content.contains("nmae(1)"));
    }

    #[test]
    fn missing_comma_between_adjacent_values() {
        let tokens = vec![
            Token::new(TokenKind::Value, "alpha(1)", 1, 1),
            Token::new(TokenKind::Value, "beta(2)", 1, 10),
        ];
        let mut fixes = Vec::new();
        let repaired = insert_missing_commas(tokens, &mut fixes);
        assert_eq!(repaired[1].kind, TokenKind::Comma);
        assert_eq!(fixes.len(), 1);
    }

    #[test]
    fn repair_is_deterministic() {
        let input = "nmae:test\nbroken: [1,\nlist: [a, b]\n";
        let first = repair_content(input);
        let second = repair_content(input);
        assert_eq!(first, second);
    }

    #[test]
    fn repair_never_panics_on_hostile_input() {
        for input in [
            "\u{0000}\u{0001}\u{0002}",
            "]]]}}}[[[{{{",
            "：：：：",
            "- - - -",
            "\n\n\n\n\n",
        ] {
            let _ = repair_content(input);
        }
    }
}

//! Boundary sanitizer: the single security gate the orchestrator calls
//! before any scanning happens.
//!
//! Control characters are stripped, then the denylist is consulted, so
//! NUL-laden but otherwise benign input degrades to a clean parse instead
//! of a fatal rejection. Size and structure limits are checked on the raw
//! text. A violation is fatal to the current call only.

use crate::config::{DEFAULT_MAX_CONTENT_SIZE, MAX_ARRAY_LENGTH, MAX_NESTING_DEPTH};
use crate::patterns::{CONTROL_CHARS, DANGEROUS_PATTERNS};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityViolation {
    #[error("content exceeds maximum length of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("nesting depth exceeds {limit}")]
    NestingTooDeep { limit: usize },

    #[error("bracket frame exceeds {limit} elements")]
    TooManyElements { limit: usize },

    #[error("content contains dangerous pattern: {pattern}")]
    DangerousPattern { pattern: String },
}

pub struct Sanitizer {
    max_length: usize,
    max_nesting_depth: usize,
    max_array_length: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_SIZE)
    }
}

impl Sanitizer {
    /// The length limit is the caller's; orchestrators pass their own
    /// truncation cap so the two limits cannot disagree.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_array_length: MAX_ARRAY_LENGTH,
        }
    }

    /// Strip control characters and reject dangerous content.
    pub fn sanitize(&self, content: &str) -> Result<String, SecurityViolation> {
        if content.len() > self.max_length {
            return Err(SecurityViolation::TooLarge {
                limit: self.max_length,
            });
        }

        self.check_structure_limits(content)?;

        let cleaned = CONTROL_CHARS.replace_all(content, "").into_owned();

        for pattern in DANGEROUS_PATTERNS.iter() {
            if pattern.is_match(&cleaned) {
                return Err(SecurityViolation::DangerousPattern {
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        Ok(cleaned)
    }

    /// Textual nesting and element-count limits over bracket frames.
    fn check_structure_limits(&self, content: &str) -> Result<(), SecurityViolation> {
        let mut frames: Vec<usize> = Vec::new();

        for b in content.bytes() {
            match b {
                b'{' | b'[' => {
                    frames.push(1);
                    if frames.len() > self.max_nesting_depth {
                        return Err(SecurityViolation::NestingTooDeep {
                            limit: self.max_nesting_depth,
                        });
                    }
                }
                b'}' | b']' => {
                    frames.pop();
                }
                b',' => {
                    if let Some(count) = frames.last_mut() {
                        *count += 1;
                        if *count > self.max_array_length {
                            return Err(SecurityViolation::TooManyElements {
                                limit: self.max_array_length,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Maximum content size processed per excavation (bytes); longer input is truncated
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 100 * 1024 * 1024;

/// Cooperative excavation budget in seconds, checked between islands
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 300;

/// Classifier floor; detections scoring below this collapse to Unknown
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Maximum textual nesting depth accepted by the sanitizer
pub const MAX_NESTING_DEPTH: usize = 20;

/// Maximum elements within a single bracket frame accepted by the sanitizer
pub const MAX_ARRAY_LENGTH: usize = 1000;

/// Lines of context captured before an island for contamination checks
pub const CONTEXT_LINES_BEFORE: usize = 5;

/// Exclusive line-window bound past an island's last line for contamination checks
pub const CONTEXT_LINES_AFTER: usize = 6;

/// Bytes of context captured around offset-addressed (JSON) islands
pub const CONTEXT_BYTES: usize = 100;

/// Minimum matching lines for a YAML block, unless it abuts a separator or EOF
pub const MIN_YAML_BLOCK_LINES: usize = 2;

/// A bare-string parse is only meaningful if shorter than this fraction of its input
pub const SCALAR_REJECT_RATIO: f64 = 0.8;

/// Longest text run still eligible for the Key classification heuristic
pub const MAX_KEY_LENGTH: usize = 20;

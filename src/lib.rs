//! Ostraca: schema-data excavation from contaminated text
//!
//! This crate recovers structured schema records (workflow, prompt,
//! notebook, env-var, and rule shapes) embedded in large, noisy or
//! partially corrupted text — logs, mixed documents, mangled exports:
//!
//! 1. **Guard** -- Truncate oversized input and run the security sanitizer;
//!    a rejection ends the call with an empty, fully-audited result
//! 2. **Detect** -- Scan for "islands" of YAML- or JSON-shaped content,
//!    classify surrounding contamination, clean and quality-score each one
//! 3. **Extract** -- Classify the content category, then run a cascade of
//!    progressively more tolerant parse strategies until one succeeds
//! 4. **Fuse** -- Combine island quality and detection confidence into a
//!    four-level confidence and assemble the artifact set
//!
//! # Design
//!
//! The pipeline is built to survive hostile input:
//!
//! - **Total functions** -- Every strategy and phase converts failure into
//!   data; the top-level call never panics on malformed content
//! - **Graceful degradation** -- Timeouts and per-island problems keep the
//!   artifacts already built instead of discarding them
//! - **Deterministic output** -- Fixed input and configuration produce the
//!   same artifacts, with only the elapsed-time field varying
//! - **Data-driven patterns** -- Every regex lives in a versioned table,
//!   independently testable, with calibration quirks preserved on purpose
//!
//! # Key Modules
//!
//! - [`archaeologist`] -- Orchestrator and entry point ([`Archaeologist`])
//! - [`island`] -- Island detection, contamination handling, quality scores
//! - [`cascade`] -- The strict-to-tolerant parse strategy chain
//! - [`tokenizer`] -- Token-level structural repair of mangled markup
//! - [`classify`] -- Content-category detection with confidence
//! - [`sanitize`] -- The security boundary the orchestrator calls
//! - [`models`] -- Artifacts, confidence levels, results
//! - [`patterns`] -- The shared pattern tables
//! - [`stats`] -- Cumulative counters
//! - [`config`] -- Defaults and limits
//!
//! # Example
//!
//! ```
//! use ostraca::archaeologist::Archaeologist;
//!
//! let archaeologist = Archaeologist::default();
//! let result = archaeologist.excavate("2024-01-01 [INFO] name: test", None);
//!
//! assert_eq!(result.artifacts.len(), 1);
//! assert!(result.artifacts[0].is_valid);
//! ```

pub mod archaeologist;
pub mod cascade;
pub mod classify;
pub mod config;
pub mod island;
pub mod models;
pub mod patterns;
pub mod sanitize;
pub mod stats;
pub mod tokenizer;

pub use archaeologist::{Archaeologist, ExcavatorConfig};
pub use models::{ExcavationResult, SchemaArtifact};

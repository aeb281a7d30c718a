//! The orchestrator: guards the input, drives island detection, classifies
//! and parses each island, fuses quality signals into a confidence level,
//! and assembles the aggregated result.
//!
//! Every phase converts failure into data. The worst outcome of a call is
//! an empty result with audit fields populated; `excavate` never panics on
//! malformed or hostile input.

use crate::cascade::{CascadeParser, CascadeStats};
use crate::classify::ContentClassifier;
use crate::config::{
    DEFAULT_EXTRACTION_TIMEOUT_SECS, DEFAULT_MAX_CONTENT_SIZE, DEFAULT_MIN_CONFIDENCE,
};
use crate::island::{self, ContentIsland};
use crate::models::{
    ContentCategory, ContentType, ExcavationResult, ExtractionConfidence, ExtractionContext,
    SchemaArtifact,
};
use crate::sanitize::Sanitizer;
use crate::stats::RunningStats;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ExcavatorConfig {
    /// Hard truncation limit in bytes
    pub max_content_size: usize,
    /// Cooperative budget, checked between islands
    pub extraction_timeout: Duration,
    /// Classifier floor
    pub min_confidence: f64,
}

impl Default for ExcavatorConfig {
    fn default() -> Self {
        Self {
            max_content_size: DEFAULT_MAX_CONTENT_SIZE,
            extraction_timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Snapshot of the orchestrator's cumulative counters and configured limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcavationStatistics {
    pub total_excavations: u64,
    pub valid_artifacts: u64,
    pub success_rate: f64,
    pub max_content_size: usize,
    pub extraction_timeout: Duration,
    pub min_confidence: f64,
}

pub struct Archaeologist {
    config: ExcavatorConfig,
    classifier: ContentClassifier,
    cascade: CascadeParser,
    sanitizer: Sanitizer,
    stats: RunningStats,
}

impl Default for Archaeologist {
    fn default() -> Self {
        Self::new(ExcavatorConfig::default())
    }
}

impl Archaeologist {
    pub fn new(config: ExcavatorConfig) -> Self {
        Self {
            classifier: ContentClassifier::new(config.min_confidence),
            cascade: CascadeParser::new(),
            sanitizer: Sanitizer::new(config.max_content_size),
            stats: RunningStats::new(),
            config,
        }
    }

    /// Excavate schema artifacts from contaminated content.
    ///
    /// Total: hostile input yields an empty result, never a panic. Given
    /// fixed input and configuration the output is deterministic except
    /// for `processing_time_ms`.
    pub fn excavate(&self, content: &str, source_hint: Option<&str>) -> ExcavationResult {
        let start = Instant::now();
        self.stats.inc_excavations();
        let original_size = content.len();

        // guard: truncate first, then sanitize the working copy
        let truncated = truncate_at_char_boundary(content, self.config.max_content_size);
        if truncated.len() < original_size {
            warn!(
                original = original_size,
                limit = self.config.max_content_size,
                "content exceeds size limit, truncating"
            );
        }

        let sanitized = match self.sanitizer.sanitize(truncated) {
            Ok(sanitized) => sanitized,
            Err(violation) => {
                warn!(error = %violation, "security validation failed");
                return ExcavationResult::empty(original_size, elapsed_ms(start));
            }
        };

        let islands = island::find_islands(&sanitized, source_hint);
        info!(islands = islands.len(), "island detection complete");

        let mut artifacts: Vec<SchemaArtifact> = Vec::new();
        let mut extraction_stats: FxHashMap<String, u64> = FxHashMap::default();

        for island in &islands {
            if start.elapsed() > self.config.extraction_timeout {
                warn!(
                    kept = artifacts.len(),
                    "extraction timeout reached, returning partial results"
                );
                break;
            }

            match self.extract_artifact(island) {
                Some(artifact) => {
                    let method = artifact.extraction_context.extraction_method.clone();
                    *extraction_stats.entry(method).or_insert(0) += 1;
                    if artifact.is_valid {
                        self.stats.add_valid_artifacts(1);
                    }
                    artifacts.push(artifact);
                }
                None => {
                    warn!(
                        start_offset = island.start_offset,
                        "skipping island with no usable content"
                    );
                }
            }
        }

        artifacts.sort_by(|a, b| {
            b.quality_score()
                .partial_cmp(&a.quality_score())
                .unwrap_or(Ordering::Equal)
        });

        let result = ExcavationResult {
            artifacts,
            total_content_size: original_size,
            processing_time_ms: elapsed_ms(start),
            extraction_stats,
        };

        info!(
            artifacts = result.artifacts.len(),
            elapsed_ms = result.processing_time_ms,
            "excavation complete"
        );
        result
    }

    fn extract_artifact(&self, island: &ContentIsland) -> Option<SchemaArtifact> {
        if island.cleaned_content.trim().is_empty() {
            return None;
        }

        let (category, detection_confidence) = self.classifier.detect(&island.cleaned_content);
        let confidence = fuse_confidence(
            island.quality_score,
            detection_confidence,
            island.contamination_types.len(),
        );

        let parse = self.cascade.parse(&island.cleaned_content);
        let content_type = map_content_type(category, &island.extraction_method);

        debug!(
            content_type = content_type.as_str(),
            confidence = confidence.as_str(),
            valid = parse.success,
            "artifact extracted"
        );

        Some(SchemaArtifact {
            content_type,
            raw_content: island.raw_content.clone(),
            cleaned_content: island.cleaned_content.clone(),
            parsed_data: if parse.success { parse.data } else { None },
            confidence,
            is_valid: parse.success,
            extraction_context: ExtractionContext {
                source_type: island.source_type.clone(),
                start_offset: island.start_offset,
                end_offset: island.end_offset,
                contamination_types: island.contamination_types.clone(),
                extraction_method: island.extraction_method.clone(),
                surrounding: Some(island.surrounding_context.clone()),
            },
            validation_errors: if parse.success {
                Vec::new()
            } else {
                vec![parse
                    .error_message
                    .unwrap_or_else(|| "parse failed".to_string())]
            },
            cleaning_warnings: island.cleaning_warnings.clone(),
        })
    }

    pub fn statistics(&self) -> ExcavationStatistics {
        ExcavationStatistics {
            total_excavations: self.stats.excavations(),
            valid_artifacts: self.stats.valid_artifacts(),
            success_rate: self.stats.success_rate(),
            max_content_size: self.config.max_content_size,
            extraction_timeout: self.config.extraction_timeout,
            min_confidence: self.config.min_confidence,
        }
    }

    /// Cumulative per-strategy counters from the parse cascade.
    pub fn cascade_stats(&self) -> CascadeStats {
        self.cascade.stats()
    }

    pub fn reset_statistics(&self) {
        self.stats.reset();
    }
}

/// Average the island quality and detection confidence, subtract 0.1 per
/// contamination type, clamp at zero, and map onto the fixed thresholds.
fn fuse_confidence(
    quality_score: f64,
    detection_confidence: f64,
    contamination_count: usize,
) -> ExtractionConfidence {
    let combined = ((quality_score + detection_confidence) / 2.0
        - 0.1 * contamination_count as f64)
        .max(0.0);

    if combined >= 0.85 {
        ExtractionConfidence::High
    } else if combined >= 0.65 {
        ExtractionConfidence::Medium
    } else if combined >= 0.35 {
        ExtractionConfidence::Low
    } else {
        ExtractionConfidence::Suspect
    }
}

/// Category mapping first, extraction-method fallback for unclassified
/// islands: a plain YAML block is still a YAML artifact.
fn map_content_type(category: ContentCategory, extraction_method: &str) -> ContentType {
    match category {
        ContentCategory::Workflow | ContentCategory::Rule | ContentCategory::EnvVar => {
            ContentType::Yaml
        }
        ContentCategory::Prompt | ContentCategory::Notebook => ContentType::Markdown,
        ContentCategory::Unknown => match extraction_method {
            "yaml_block" => ContentType::Yaml,
            "json_block" => ContentType::Json,
            _ => ContentType::Unknown,
        },
    }
}

fn truncate_at_char_boundary(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut end = max;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;

/// Structural family of an excavated artifact.
///
/// Distinct from the schema categories used by the classifier: a workflow
/// record and a rule record are both YAML-shaped, while prompts and
/// notebooks are markdown-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Yaml,
    Json,
    Markdown,
    PlainText,
    Unknown,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Yaml => "yaml",
            ContentType::Json => "json",
            ContentType::Markdown => "markdown",
            ContentType::PlainText => "plain_text",
            ContentType::Unknown => "unknown",
        }
    }
}

/// Schema category guessed by the classifier from content indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Workflow,
    Prompt,
    Notebook,
    EnvVar,
    Rule,
    Unknown,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Workflow => "workflow",
            ContentCategory::Prompt => "prompt",
            ContentCategory::Notebook => "notebook",
            ContentCategory::EnvVar => "env_var",
            ContentCategory::Rule => "rule",
            ContentCategory::Unknown => "unknown",
        }
    }
}

/// Confidence levels for extracted artifacts, ordered Suspect < Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionConfidence {
    Suspect,
    Low,
    Medium,
    High,
}

impl ExtractionConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionConfidence::High => "high",
            ExtractionConfidence::Medium => "medium",
            ExtractionConfidence::Low => "low",
            ExtractionConfidence::Suspect => "suspect",
        }
    }

    /// Base quality contribution of this confidence level.
    pub fn base_score(&self) -> f64 {
        match self {
            ExtractionConfidence::High => 0.95,
            ExtractionConfidence::Medium => 0.80,
            ExtractionConfidence::Low => 0.65,
            ExtractionConfidence::Suspect => 0.35,
        }
    }
}

/// Kinds of noise found inside or around legitimate content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContaminationType {
    BinaryData,
    LogPrefixes,
    CodeFragments,
    RandomText,
    EncodingIssues,
    MalformedStructure,
}

impl ContaminationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContaminationType::BinaryData => "binary_data",
            ContaminationType::LogPrefixes => "log_prefixes",
            ContaminationType::CodeFragments => "code_fragments",
            ContaminationType::RandomText => "random_text",
            ContaminationType::EncodingIssues => "encoding_issues",
            ContaminationType::MalformedStructure => "malformed_structure",
        }
    }
}

/// Provenance of an extraction: where the content came from and how it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionContext {
    pub source_type: String,
    /// Byte offset where the island started in the sanitized input
    pub start_offset: usize,
    /// Byte offset one past the island's end
    pub end_offset: usize,
    pub contamination_types: BTreeSet<ContaminationType>,
    pub extraction_method: String,
    pub surrounding: Option<String>,
}

/// A piece of schema content recovered from contaminated input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaArtifact {
    pub content_type: ContentType,
    pub raw_content: String,
    pub cleaned_content: String,
    pub parsed_data: Option<serde_yaml::Value>,
    pub confidence: ExtractionConfidence,
    pub is_valid: bool,
    pub extraction_context: ExtractionContext,
    pub validation_errors: Vec<String>,
    pub cleaning_warnings: Vec<String>,
}

impl SchemaArtifact {
    /// Overall quality in [0, 1]: confidence base, halved when the parse
    /// failed, minus 0.05 per contamination type.
    pub fn quality_score(&self) -> f64 {
        let mut score = self.confidence.base_score();

        if !self.is_valid {
            score *= 0.5;
        }

        let contamination_penalty =
            self.extraction_context.contamination_types.len() as f64 * 0.05;
        score -= contamination_penalty;

        score.clamp(0.0, 1.0)
    }

    pub fn is_high_quality(&self) -> bool {
        self.confidence >= ExtractionConfidence::Medium
            && self.is_valid
            && self.validation_errors.is_empty()
            && self.quality_score() >= 0.7
    }

    /// Plain nested-mapping form for JSON/YAML persistence by callers.
    /// Enums become strings; contamination types become a string list.
    pub fn to_record(&self) -> serde_json::Value {
        let parsed = self
            .parsed_data
            .as_ref()
            .and_then(|v| serde_json::to_value(v).ok())
            .unwrap_or(serde_json::Value::Null);

        json!({
            "content_type": self.content_type.as_str(),
            "raw_content": self.raw_content,
            "cleaned_content": self.cleaned_content,
            "parsed_data": parsed,
            "confidence": self.confidence.as_str(),
            "is_valid": self.is_valid,
            "quality_score": self.quality_score(),
            "extraction_context": {
                "source_type": self.extraction_context.source_type,
                "start_offset": self.extraction_context.start_offset,
                "end_offset": self.extraction_context.end_offset,
                "contamination_types": self
                    .extraction_context
                    .contamination_types
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>(),
                "extraction_method": self.extraction_context.extraction_method,
            },
            "validation_errors": self.validation_errors,
            "cleaning_warnings": self.cleaning_warnings,
        })
    }
}

/// Everything one excavation call produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcavationResult {
    /// Artifacts sorted by descending quality score, offset ranges disjoint
    pub artifacts: Vec<SchemaArtifact>,
    /// Byte length of the input before any truncation
    pub total_content_size: usize,
    pub processing_time_ms: u64,
    /// Artifact count per extraction method for this call
    pub extraction_stats: FxHashMap<String, u64>,
}

impl ExcavationResult {
    pub fn empty(total_content_size: usize, processing_time_ms: u64) -> Self {
        Self {
            artifacts: Vec::new(),
            total_content_size,
            processing_time_ms,
            extraction_stats: FxHashMap::default(),
        }
    }

    pub fn high_quality_artifacts(&self) -> Vec<&SchemaArtifact> {
        self.artifacts.iter().filter(|a| a.is_high_quality()).collect()
    }

    pub fn valid_artifacts(&self) -> Vec<&SchemaArtifact> {
        self.artifacts.iter().filter(|a| a.is_valid).collect()
    }

    /// Fraction of artifacts that parsed successfully; 0.0 when none were found.
    pub fn extraction_success_rate(&self) -> f64 {
        if self.artifacts.is_empty() {
            return 0.0;
        }
        self.valid_artifacts().len() as f64 / self.artifacts.len() as f64
    }

    pub fn artifacts_by_type(&self, content_type: ContentType) -> Vec<&SchemaArtifact> {
        self.artifacts
            .iter()
            .filter(|a| a.content_type == content_type)
            .collect()
    }

    pub fn artifacts_with_min_confidence(
        &self,
        min_confidence: ExtractionConfidence,
    ) -> Vec<&SchemaArtifact> {
        self.artifacts
            .iter()
            .filter(|a| a.confidence >= min_confidence)
            .collect()
    }
}

/// Outcome of a single parse attempt. Strategies return this; they never panic.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub success: bool,
    pub data: Option<serde_yaml::Value>,
    pub error_message: Option<String>,
    pub original_content: String,
}

impl ParseResult {
    pub fn success(data: serde_yaml::Value, original_content: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
            original_content: original_content.to_string(),
        }
    }

    pub fn failure(error_message: impl Into<String>, original_content: &str) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(error_message.into()),
            original_content: original_content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_artifact(
        confidence: ExtractionConfidence,
        is_valid: bool,
        contamination: &[ContaminationType],
    ) -> SchemaArtifact {
        SchemaArtifact {
            content_type: ContentType::Yaml,
            raw_content: "name: test".to_string(),
            cleaned_content: "name: test".to_string(),
            parsed_data: is_valid
                .then(|| serde_yaml::from_str::<serde_yaml::Value>("name: test").unwrap()),
            confidence,
            is_valid,
            extraction_context: ExtractionContext {
                source_type: "unknown".to_string(),
                start_offset: 0,
                end_offset: 10,
                contamination_types: contamination.iter().copied().collect(),
                extraction_method: "yaml_block".to_string(),
                surrounding: None,
            },
            validation_errors: if is_valid {
                vec![]
            } else {
                vec!["parse failed".to_string()]
            },
            cleaning_warnings: vec![],
        }
    }

    #[test]
    fn confidence_total_order() {
        assert!(ExtractionConfidence::High > ExtractionConfidence::Medium);
        assert!(ExtractionConfidence::Medium > ExtractionConfidence::Low);
        assert!(ExtractionConfidence::Low > ExtractionConfidence::Suspect);
    }

    #[test]
    fn quality_base_scores() {
        assert_eq!(
            make_artifact(ExtractionConfidence::High, true, &[]).quality_score(),
            0.95
        );
        assert_eq!(
            make_artifact(ExtractionConfidence::Medium, true, &[]).quality_score(),
            0.80
        );
        assert_eq!(
            make_artifact(ExtractionConfidence::Low, true, &[]).quality_score(),
            0.65
        );
        assert_eq!(
            make_artifact(ExtractionConfidence::Suspect, true, &[]).quality_score(),
            0.35
        );
    }

    #[test]
    fn quality_halved_when_invalid() {
        let artifact = make_artifact(ExtractionConfidence::High, false, &[]);
        assert!((artifact.quality_score() - 0.475).abs() < 1e-9);
    }

    #[test]
    fn quality_contamination_penalty() {
        let artifact = make_artifact(
            ExtractionConfidence::High,
            true,
            &[ContaminationType::BinaryData, ContaminationType::LogPrefixes],
        );
        assert!((artifact.quality_score() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn quality_clamped_at_zero() {
        let artifact = make_artifact(
            ExtractionConfidence::Suspect,
            false,
            &[
                ContaminationType::BinaryData,
                ContaminationType::LogPrefixes,
                ContaminationType::CodeFragments,
                ContaminationType::RandomText,
            ],
        );
        assert_eq!(artifact.quality_score(), 0.0);
    }

    #[test]
    fn confidence_ordering_reflected_in_quality() {
        let high = make_artifact(ExtractionConfidence::High, true, &[]);
        let medium = make_artifact(ExtractionConfidence::Medium, true, &[]);
        let low = make_artifact(ExtractionConfidence::Low, true, &[]);
        let suspect = make_artifact(ExtractionConfidence::Suspect, true, &[]);
        assert!(high.quality_score() >= medium.quality_score());
        assert!(medium.quality_score() >= low.quality_score());
        assert!(low.quality_score() >= suspect.quality_score());
    }

    #[test]
    fn high_quality_requires_validity() {
        assert!(make_artifact(ExtractionConfidence::High, true, &[]).is_high_quality());
        assert!(!make_artifact(ExtractionConfidence::High, false, &[]).is_high_quality());
        assert!(!make_artifact(ExtractionConfidence::Low, true, &[]).is_high_quality());
    }

    #[test]
    fn record_shape() {
        let artifact = make_artifact(
            ExtractionConfidence::Medium,
            true,
            &[ContaminationType::LogPrefixes],
        );
        let record = artifact.to_record();

        assert_eq!(record["content_type"], "yaml");
        assert_eq!(record["confidence"], "medium");
        assert_eq!(record["is_valid"], true);
        assert_eq!(
            record["extraction_context"]["contamination_types"],
            json!(["log_prefixes"])
        );
        assert_eq!(record["extraction_context"]["start_offset"], 0);
        assert_eq!(record["parsed_data"]["name"], "test");
    }

    #[test]
    fn record_serializes_to_json_text() {
        let artifact = make_artifact(ExtractionConfidence::High, true, &[]);
        let text = serde_json::to_string(&artifact.to_record()).unwrap();
        assert!(text.contains("\"content_type\":\"yaml\""));
    }

    #[test]
    fn result_views() {
        let result = ExcavationResult {
            artifacts: vec![
                make_artifact(ExtractionConfidence::High, true, &[]),
                make_artifact(ExtractionConfidence::Low, true, &[]),
                make_artifact(ExtractionConfidence::Suspect, false, &[]),
            ],
            total_content_size: 100,
            processing_time_ms: 5,
            extraction_stats: FxHashMap::default(),
        };

        assert_eq!(result.valid_artifacts().len(), 2);
        assert_eq!(result.high_quality_artifacts().len(), 1);
        assert!((result.extraction_success_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.artifacts_by_type(ContentType::Yaml).len(), 3);
        assert_eq!(
            result
                .artifacts_with_min_confidence(ExtractionConfidence::Low)
                .len(),
            2
        );
    }

    #[test]
    fn empty_result() {
        let result = ExcavationResult::empty(42, 1);
        assert!(result.artifacts.is_empty());
        assert_eq!(result.total_content_size, 42);
        assert_eq!(result.extraction_success_rate(), 0.0);
        assert!(result.extraction_stats.is_empty());
    }

    #[test]
    fn parse_result_constructors() {
        let ok = ParseResult::success(serde_yaml::Value::Null, "x");
        assert!(ok.success);
        assert!(ok.error_message.is_none());

        let err = ParseResult::failure("bad input", "x");
        assert!(!err.success);
        assert_eq!(err.error_message.as_deref(), Some("bad input"));
        assert_eq!(err.original_content, "x");
    }
}

//! Lightweight content-category detection with confidence scoring.
//!
//! Each category's indicator table is matched against lowercased,
//! punctuation-normalized content; the score is the fraction of indicators
//! that hit. The tie-break (first declared category wins) and the workflow
//! boost are calibration artifacts kept as-is for compatibility.

use crate::config::DEFAULT_MIN_CONFIDENCE;
use crate::models::ContentCategory;
use crate::patterns::CATEGORY_INDICATORS;

pub struct ContentClassifier {
    min_confidence: f64,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl ContentClassifier {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Guess the schema category with a confidence in [0, 1]. Scores below
    /// the configured floor collapse to `(Unknown, 0.0)`. Total: any input,
    /// including empty, yields an answer.
    pub fn detect(&self, content: &str) -> (ContentCategory, f64) {
        if content.trim().is_empty() {
            return (ContentCategory::Unknown, 0.0);
        }

        let normalized = normalize(content);

        let mut best_category = ContentCategory::Unknown;
        let mut best_score = 0.0f64;
        for (category, patterns) in CATEGORY_INDICATORS.iter() {
            let hits = patterns.iter().filter(|p| p.is_match(&normalized)).count();
            let score = hits as f64 / patterns.len() as f64;
            // strict comparison keeps the first-declared category on ties
            if score > best_score {
                best_score = score;
                best_category = *category;
            }
        }

        if best_score == 0.0 {
            return (ContentCategory::Unknown, 0.0);
        }

        // workflow indicators are individually weak; compensate
        let confidence = if best_category == ContentCategory::Workflow {
            (best_score * 1.5).min(1.0)
        } else {
            best_score
        };

        if confidence >= self.min_confidence {
            (best_category, confidence)
        } else {
            (ContentCategory::Unknown, 0.0)
        }
    }

    /// Raw score per category, before the boost and the floor. Useful for
    /// understanding why a detection went the way it did.
    pub fn score_all(&self, content: &str) -> Vec<(ContentCategory, f64)> {
        let normalized = normalize(content);
        let mut scores: Vec<(ContentCategory, f64)> = CATEGORY_INDICATORS
            .iter()
            .map(|(category, patterns)| {
                let hits = patterns.iter().filter(|p| p.is_match(&normalized)).count();
                (*category, hits as f64 / patterns.len() as f64)
            })
            .collect();
        scores.push((ContentCategory::Unknown, 0.0));
        scores
    }
}

fn normalize(content: &str) -> String {
    content.replace('：', ":").replace('，', ",").to_lowercase()
}

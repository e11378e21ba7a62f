//! Tunable constants for tokenizing, encoding and scoring.
//!
//! The defaults were tuned by hand against a small set of example documents.
//! They are a starting point, not a derivation.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level search configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl SearchConfig {
    /// Load a JSON config file. Missing fields fall back to their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encoder.dimensions == 0 {
            return Err(ConfigError::Invalid(
                "encoder.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.scoring.max_results == 0 {
            return Err(ConfigError::Invalid(
                "scoring.max_results must be greater than zero".to_string(),
            ));
        }
        if self.preprocess.min_token_chars == 0 {
            return Err(ConfigError::Invalid(
                "preprocess.min_token_chars must be greater than zero".to_string(),
            ));
        }

        let unit_range = [
            ("scoring.min_semantic_similarity", self.scoring.min_semantic_similarity),
            ("scoring.semantic_threshold", self.scoring.semantic_threshold),
            ("scoring.hybrid_threshold", self.scoring.hybrid_threshold),
            ("scoring.keyword_threshold", self.scoring.keyword_threshold),
            ("scoring.semantic_weight", self.scoring.semantic_weight),
            ("scoring.keyword_weight", self.scoring.keyword_weight),
        ];
        for (name, value) in unit_range {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Tokenizer and keyword extraction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessConfig {
    /// Tokens shorter than this are dropped
    #[serde(default = "default_min_token_chars")]
    pub min_token_chars: usize,

    /// Maximum number of keywords kept per document
    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            min_token_chars: default_min_token_chars(),
            keyword_limit: default_keyword_limit(),
        }
    }
}

fn default_min_token_chars() -> usize {
    3
}

fn default_keyword_limit() -> usize {
    8
}

/// Hashed vector encoder settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncoderConfig {
    /// Vector length. Raise this to reduce bucket collisions.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Terms longer than this many characters get `long_term_boost`
    #[serde(default = "default_long_term_chars")]
    pub long_term_chars: usize,

    #[serde(default = "default_long_term_boost")]
    pub long_term_boost: f32,

    /// Applied when a term ends with one of `boosted_suffixes`
    #[serde(default = "default_suffix_boost")]
    pub suffix_boost: f32,

    #[serde(default = "default_boosted_suffixes")]
    pub boosted_suffixes: Vec<String>,

    /// Applied when the term is itself a concept key
    #[serde(default = "default_concept_boost")]
    pub concept_boost: f32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            long_term_chars: default_long_term_chars(),
            long_term_boost: default_long_term_boost(),
            suffix_boost: default_suffix_boost(),
            boosted_suffixes: default_boosted_suffixes(),
            concept_boost: default_concept_boost(),
        }
    }
}

fn default_dimensions() -> usize {
    100
}

fn default_long_term_chars() -> usize {
    6
}

fn default_long_term_boost() -> f32 {
    1.2
}

fn default_suffix_boost() -> f32 {
    1.1
}

fn default_boosted_suffixes() -> Vec<String> {
    vec!["ing".to_string(), "tion".to_string()]
}

fn default_concept_boost() -> f32 {
    1.5
}

/// Scoring weights, thresholds and result limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Cosine similarity at or below this counts as no semantic match
    #[serde(default = "default_min_semantic_similarity")]
    pub min_semantic_similarity: f32,

    /// Acceptance threshold for semantic-only results
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f32,

    /// Acceptance threshold for hybrid results
    #[serde(default = "default_hybrid_threshold")]
    pub hybrid_threshold: f32,

    /// Acceptance threshold for keyword-only results
    #[serde(default = "default_keyword_threshold")]
    pub keyword_threshold: f32,

    /// Blend weights for hybrid results
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Added when the filename contains the query
    #[serde(default = "default_filename_match_score")]
    pub filename_match_score: f32,

    /// Added per document keyword overlapping the query
    #[serde(default = "default_keyword_match_score")]
    pub keyword_match_score: f32,

    /// Added per sentence containing the query
    #[serde(default = "default_sentence_match_score")]
    pub sentence_match_score: f32,

    #[serde(default = "default_max_matched_sections")]
    pub max_matched_sections: usize,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Characters of surrounding text kept on each side of a match
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_semantic_similarity: default_min_semantic_similarity(),
            semantic_threshold: default_semantic_threshold(),
            hybrid_threshold: default_hybrid_threshold(),
            keyword_threshold: default_keyword_threshold(),
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            filename_match_score: default_filename_match_score(),
            keyword_match_score: default_keyword_match_score(),
            sentence_match_score: default_sentence_match_score(),
            max_matched_sections: default_max_matched_sections(),
            max_results: default_max_results(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_min_semantic_similarity() -> f32 {
    0.18
}

fn default_semantic_threshold() -> f32 {
    0.15
}

fn default_hybrid_threshold() -> f32 {
    0.10
}

fn default_keyword_threshold() -> f32 {
    0.10
}

fn default_semantic_weight() -> f32 {
    0.7
}

fn default_keyword_weight() -> f32 {
    0.3
}

fn default_filename_match_score() -> f32 {
    0.3
}

fn default_keyword_match_score() -> f32 {
    0.15
}

fn default_sentence_match_score() -> f32 {
    0.2
}

fn default_max_matched_sections() -> usize {
    3
}

fn default_max_results() -> usize {
    10
}

fn default_context_chars() -> usize {
    80
}

//! Hashed term vectors.
//!
//! Each distinct term lands in one of `dimensions` buckets through a 32-bit
//! polynomial string hash. Different terms sharing a bucket is expected: the
//! vector is a lossy projection, and raising `dimensions` is the only way to
//! reduce collisions.

use crate::concepts::{ConceptExpander, Expansion, StaticConceptTable};
use crate::config::{EncoderConfig, PreprocessConfig};
use crate::preprocess::tokenize;
use std::collections::BTreeMap;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 100;

pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// `hash = hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits.
pub fn string_hash(term: &str) -> i32 {
    term.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

pub fn bucket_index(term: &str, dimensions: usize) -> usize {
    string_hash(term).unsigned_abs() as usize % dimensions.max(1)
}

pub fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

/// Cosine similarity. Zero when either vector has no magnitude or the
/// lengths differ.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let left_magnitude = magnitude(left);
    let right_magnitude = magnitude(right);
    if left_magnitude == 0.0 || right_magnitude == 0.0 {
        return 0.0;
    }

    let dot = left
        .iter()
        .zip(right)
        .map(|(left, right)| left * right)
        .sum::<f32>();
    dot / (left_magnitude * right_magnitude)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub vector: Vec<f32>,
    pub term_frequency: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Default)]
pub struct HashingEncoder {
    config: EncoderConfig,
}

impl HashingEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn term_weight(&self, term: &str, is_concept: bool) -> f32 {
        let mut weight = 1.0;
        if term.chars().count() > self.config.long_term_chars {
            weight *= self.config.long_term_boost;
        }
        if self
            .config
            .boosted_suffixes
            .iter()
            .any(|suffix| term.ends_with(suffix.as_str()))
        {
            weight *= self.config.suffix_boost;
        }
        if is_concept {
            weight *= self.config.concept_boost;
        }
        weight
    }

    /// Term frequencies are taken over the full multiset, duplicates included.
    pub fn term_frequency(terms: &[String]) -> BTreeMap<String, f32> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for term in terms {
            *counts.entry(term.clone()).or_insert(0) += 1;
        }

        let total = terms.len() as f32;
        counts
            .into_iter()
            .map(|(term, count)| (term, count as f32 / total))
            .collect()
    }

    pub fn encode<E>(&self, expansion: &Expansion, expander: &E) -> Encoding
    where
        E: ConceptExpander + ?Sized,
    {
        let dimensions = self.config.dimensions.max(1);
        let mut vector = vec![0f32; dimensions];

        if expansion.is_empty() {
            return Encoding {
                vector,
                term_frequency: BTreeMap::new(),
            };
        }

        let term_frequency = Self::term_frequency(&expansion.terms);
        for (term, frequency) in &term_frequency {
            let bucket = bucket_index(term, dimensions);
            vector[bucket] += frequency * self.term_weight(term, expander.is_concept(term));
        }

        let length = magnitude(&vector);
        if length > 0.0 {
            for value in &mut vector {
                *value /= length;
            }
        }

        Encoding {
            vector,
            term_frequency,
        }
    }
}

/// Everything the text pipeline produced for one input.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tokens: Vec<String>,
    pub expansion: Expansion,
    pub encoding: Encoding,
}

/// Tokenize, expand and encode in one step.
#[derive(Debug, Clone)]
pub struct ConceptHashEmbedder<E = StaticConceptTable> {
    preprocess: PreprocessConfig,
    expander: E,
    encoder: HashingEncoder,
}

impl Default for ConceptHashEmbedder {
    fn default() -> Self {
        Self::new(
            PreprocessConfig::default(),
            StaticConceptTable::default(),
            EncoderConfig::default(),
        )
    }
}

impl<E: ConceptExpander> ConceptHashEmbedder<E> {
    pub fn new(preprocess: PreprocessConfig, expander: E, encoder: EncoderConfig) -> Self {
        Self {
            preprocess,
            expander,
            encoder: HashingEncoder::new(encoder),
        }
    }

    pub fn preprocess_config(&self) -> &PreprocessConfig {
        &self.preprocess
    }

    pub fn expander(&self) -> &E {
        &self.expander
    }

    pub fn analyze(&self, text: &str) -> Analysis {
        let tokens = tokenize(text, &self.preprocess);
        let expansion = self.expander.expand(&tokens);
        let encoding = self.encoder.encode(&expansion, &self.expander);
        Analysis {
            tokens,
            expansion,
            encoding,
        }
    }
}

impl<E: ConceptExpander> Embedder for ConceptHashEmbedder<E> {
    fn dimensions(&self) -> usize {
        self.encoder.config().dimensions.max(1)
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        self.analyze(text).encoding.vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn hash_matches_reference_buckets() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
        assert_eq!(bucket_index("fruit", 100), 24);
        assert_eq!(bucket_index("revenue", 100), 88);
        assert_eq!(bucket_index("été", 100), 42);
    }

    #[test]
    fn distinct_terms_may_share_a_bucket() {
        assert_eq!(bucket_index("apple", 100), bucket_index("numbers", 100));
    }

    #[test]
    fn hash_wraps_instead_of_overflowing() {
        let long = "overflowing ".repeat(64);
        assert!(bucket_index(&long, 100) < 100);
    }

    #[test]
    fn term_weight_compounds_boosts() {
        let encoder = HashingEncoder::default();
        assert!(close(encoder.term_weight("cat", false), 1.0));
        assert!(close(encoder.term_weight("revenue", false), 1.2));
        assert!(close(encoder.term_weight("cooking", false), 1.2 * 1.1));
        assert!(close(encoder.term_weight("sing", false), 1.1));
        assert!(close(encoder.term_weight("technology", true), 1.2 * 1.5));
    }

    #[test]
    fn term_frequency_counts_duplicates() {
        let terms = vec!["fruit".to_string(), "apples".to_string(), "fruit".to_string()];
        let frequency = HashingEncoder::term_frequency(&terms);
        assert!(close(frequency["fruit"], 2.0 / 3.0));
        assert!(close(frequency["apples"], 1.0 / 3.0));
    }

    #[test]
    fn empty_expansion_yields_zero_vector() {
        let encoder = HashingEncoder::default();
        let encoding = encoder.encode(&Expansion::default(), &StaticConceptTable::default());
        assert_eq!(encoding.vector, vec![0.0; 100]);
        assert!(encoding.term_frequency.is_empty());
    }

    #[test]
    fn encoded_vectors_are_unit_length() {
        let embedder: ConceptHashEmbedder = ConceptHashEmbedder::default();
        let vector = embedder.embed("Fresh apples and bananas from the market");
        assert_eq!(vector.len(), 100);
        assert!(close(magnitude(&vector), 1.0));
    }

    #[test]
    fn embedder_is_deterministic() {
        let embedder: ConceptHashEmbedder = ConceptHashEmbedder::default();
        assert_eq!(
            embedder.embed("Quarterly revenue numbers"),
            embedder.embed("Quarterly revenue numbers")
        );
    }

    #[test]
    fn cosine_of_vector_with_itself_is_one() {
        let embedder: ConceptHashEmbedder = ConceptHashEmbedder::default();
        let vector = embedder.embed("software network programming");
        assert!(close(cosine_similarity(&vector, &vector), 1.0));

        let raw = vec![3.0, 4.0, 0.0];
        assert!(close(cosine_similarity(&raw, &raw), 1.0));
    }

    #[test]
    fn cosine_guards_zero_and_mismatched_vectors() {
        let vector = vec![0.6, 0.8];
        assert_eq!(cosine_similarity(&vector, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&vector, &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn concept_query_is_close_to_member_terms() {
        let embedder: ConceptHashEmbedder = ConceptHashEmbedder::default();
        let query = embedder.embed("fruit");
        let related = embedder.embed("apples bananas oranges");
        let unrelated = embedder.embed("quarterly revenue numbers");
        let related_score = cosine_similarity(&query, &related);
        let unrelated_score = cosine_similarity(&query, &unrelated);
        assert!(related_score > 0.3);
        assert!(unrelated_score < 0.18);
        assert!(related_score > unrelated_score);
    }
}

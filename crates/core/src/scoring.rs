use crate::config::ScoringConfig;
use crate::embeddings::cosine_similarity;
use crate::models::{Document, MatchedSection, ScoreBreakdown, SearchHit, SearchType};
use crate::preprocess::{normalize_whitespace, split_sentence_spans};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::debug;

const HIGHLIGHT_MARKER: &str = "**";

/// Stateless ranking over a snapshot of stored documents.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

/// Keyword evidence gathered for one document, before capping.
#[derive(Debug, Default)]
struct KeywordEvidence {
    score: f32,
    filename_matched: bool,
    keyword_matches: usize,
    sentence_matches: usize,
    sections: Vec<MatchedSection>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Ranks `documents` against an already lowercased, trimmed query and its
    /// vector. Ties keep the snapshot's insertion order.
    pub fn search(
        &self,
        query: &str,
        query_vector: &[f32],
        documents: &[Arc<Document>],
    ) -> Vec<SearchHit> {
        if query.is_empty() {
            return Vec::new();
        }

        let highlighter = build_highlighter(query);
        let mut hits = documents
            .iter()
            .filter_map(|document| {
                self.score_document(query, query_vector, document, highlighter.as_ref())
            })
            .collect::<Vec<_>>();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(self.config.max_results);
        hits
    }

    fn score_document(
        &self,
        query: &str,
        query_vector: &[f32],
        document: &Document,
        highlighter: Option<&Regex>,
    ) -> Option<SearchHit> {
        if !document.is_searchable() {
            return None;
        }

        let semantic = cosine_similarity(query_vector, &document.vector).clamp(0.0, 1.0);
        let effective_semantic = if semantic > self.config.min_semantic_similarity {
            semantic
        } else {
            0.0
        };
        let evidence = self.keyword_evidence(query, document, highlighter);

        // Hybrid blends the uncapped keyword sum; only keyword-only hits cap it.
        let (score, search_type) = match (effective_semantic > 0.0, evidence.score > 0.0) {
            (true, true) => (
                self.config.semantic_weight * effective_semantic
                    + self.config.keyword_weight * evidence.score,
                SearchType::Hybrid,
            ),
            (true, false) => (effective_semantic, SearchType::Semantic),
            (false, true) => (evidence.score.min(1.0), SearchType::Keyword),
            (false, false) => return None,
        };
        let score = score.clamp(0.0, 1.0);

        if score <= self.threshold(search_type) {
            debug!(
                document_id = %document.id,
                %search_type,
                score,
                "below acceptance threshold"
            );
            return None;
        }

        debug!(
            document_id = %document.id,
            %search_type,
            score,
            semantic,
            keyword = evidence.score,
            "document matched"
        );

        Some(SearchHit {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            score,
            search_type,
            matched_sections: evidence.sections,
            explanation: ScoreBreakdown {
                semantic,
                effective_semantic,
                keyword: evidence.score,
                filename_matched: evidence.filename_matched,
                keyword_matches: evidence.keyword_matches,
                sentence_matches: evidence.sentence_matches,
            },
        })
    }

    fn threshold(&self, search_type: SearchType) -> f32 {
        match search_type {
            SearchType::Semantic => self.config.semantic_threshold,
            SearchType::Hybrid => self.config.hybrid_threshold,
            SearchType::Keyword => self.config.keyword_threshold,
        }
    }

    fn keyword_evidence(
        &self,
        query: &str,
        document: &Document,
        highlighter: Option<&Regex>,
    ) -> KeywordEvidence {
        let mut evidence = KeywordEvidence::default();

        if document.filename.to_lowercase().contains(query) {
            evidence.filename_matched = true;
            evidence.score += self.config.filename_match_score;
        }

        for keyword in &document.keywords {
            if keyword.contains(query) || query.contains(keyword.as_str()) {
                evidence.keyword_matches += 1;
                evidence.score += self.config.keyword_match_score;
            }
        }

        let text = &document.extracted_text;
        for (offset, sentence) in split_sentence_spans(text) {
            if !sentence.to_lowercase().contains(query) {
                continue;
            }

            evidence.sentence_matches += 1;
            evidence.score += self.config.sentence_match_score;

            if evidence.sections.len() < self.config.max_matched_sections {
                evidence.sections.push(MatchedSection {
                    text: sentence.to_string(),
                    context: self.context(text, offset, sentence, highlighter),
                    highlighted: highlight(sentence, highlighter),
                });
            }
        }

        evidence
    }

    /// Up to `context_chars` characters either side of the first occurrence
    /// in `sentence`, cut from the full text with its punctuation intact.
    fn context(
        &self,
        text: &str,
        offset: usize,
        sentence: &str,
        highlighter: Option<&Regex>,
    ) -> String {
        let (start, end) = highlighter
            .and_then(|pattern| pattern.find(sentence))
            .map(|found| (offset + found.start(), offset + found.end()))
            .unwrap_or((offset, offset + sentence.len()));
        let limit = self.config.context_chars;

        let window_start = text[..start]
            .char_indices()
            .rev()
            .take(limit)
            .last()
            .map_or(start, |(index, _)| index);
        let window_end = text[end..]
            .char_indices()
            .nth(limit)
            .map_or(text.len(), |(index, _)| end + index);

        let mut context = normalize_whitespace(&text[window_start..window_end]);
        if window_start > 0 {
            context.insert_str(0, "...");
        }
        if window_end < text.len() {
            context.push_str("...");
        }
        context
    }
}

fn build_highlighter(query: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Wraps every occurrence matched by `highlighter` in `**`.
pub fn highlight(text: &str, highlighter: Option<&Regex>) -> String {
    match highlighter {
        Some(pattern) => pattern
            .replace_all(text, format!("{HIGHLIGHT_MARKER}$0{HIGHLIGHT_MARKER}").as_str())
            .into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{ConceptHashEmbedder, Embedder};
    use crate::models::{DocumentMetadata, FileType};
    use crate::preprocess::extract_keywords;
    use chrono::Utc;

    fn document(id: &str, filename: &str, text: &str) -> Arc<Document> {
        let embedder: ConceptHashEmbedder = ConceptHashEmbedder::default();
        let analysis = embedder.analyze(text);
        Arc::new(Document {
            id: id.to_string(),
            filename: filename.to_string(),
            file_type: FileType::Txt,
            uploaded_at: Utc::now(),
            size_bytes: text.len() as u64,
            extracted_text: text.to_string(),
            keywords: extract_keywords(&analysis.tokens, 8),
            vector: analysis.encoding.vector,
            term_frequency: analysis.encoding.term_frequency,
            checksum: String::new(),
            metadata: DocumentMetadata::default(),
            extraction_error: None,
        })
    }

    fn run(engine: &ScoringEngine, query: &str, documents: &[Arc<Document>]) -> Vec<SearchHit> {
        let normalized = query.trim().to_lowercase();
        let embedder: ConceptHashEmbedder = ConceptHashEmbedder::default();
        let vector = embedder.embed(&normalized);
        engine.search(&normalized, &vector, documents)
    }

    #[test]
    fn concept_query_matches_semantically() {
        let engine = ScoringEngine::default();
        let documents = vec![document("a", "notes.txt", "I love fresh apples and bananas")];
        let hits = run(&engine, "fruit", &documents);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].search_type, SearchType::Semantic);
        assert!(hits[0].score > 0.15);
        assert!(hits[0].matched_sections.is_empty());
    }

    #[test]
    fn filename_match_is_keyword_only() {
        let engine = ScoringEngine::default();
        let documents = vec![document("q", "Quarterly_Report.pdf", "revenue is up")];
        let hits = run(&engine, "Quarterly", &documents);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].search_type, SearchType::Keyword);
        assert!(hits[0].score >= 0.3);
        assert!(hits[0].explanation.filename_matched);
    }

    #[test]
    fn semantic_and_keyword_evidence_blend_into_hybrid() {
        let engine = ScoringEngine::default();
        let documents = vec![document("a", "notes.txt", "I love fresh apples and bananas")];
        let hits = run(&engine, "apples", &documents);

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.search_type, SearchType::Hybrid);
        assert_eq!(hit.explanation.keyword_matches, 1);
        assert_eq!(hit.explanation.sentence_matches, 1);
        let expected = 0.7 * hit.explanation.effective_semantic + 0.3 * hit.explanation.keyword;
        assert!((hit.score - expected).abs() < 1e-5);
        assert_eq!(
            hit.matched_sections[0].highlighted,
            "I love fresh **apples** and bananas"
        );
    }

    #[test]
    fn weak_similarity_is_discarded() {
        let engine = ScoringEngine::default();
        let documents = vec![document("b", "b.txt", "quarterly revenue numbers")];
        assert!(run(&engine, "fruit", &documents).is_empty());
    }

    #[test]
    fn keyword_score_is_summed_then_capped() {
        let engine = ScoringEngine::default();
        let text = "Room 42. Gate 42! Code 42? Bus 42. Seat 42. Lane 42.";
        let documents = vec![document("n", "numbers.txt", text)];
        let hits = run(&engine, "42", &documents);

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.search_type, SearchType::Keyword);
        assert_eq!(hit.score, 1.0);
        assert_eq!(hit.explanation.sentence_matches, 6);
        assert!((hit.explanation.keyword - 1.2).abs() < 1e-5);
        assert_eq!(hit.matched_sections.len(), 3);
        assert_eq!(hit.matched_sections[0].text, "Room 42");
    }

    #[test]
    fn hybrid_blends_the_uncapped_keyword_sum() {
        fn with_vector(id: &str, repeats: usize, vector: Vec<f32>) -> Arc<Document> {
            let text = "zeta. ".repeat(repeats);
            Arc::new(Document {
                id: id.to_string(),
                filename: format!("{id}.txt"),
                file_type: FileType::Txt,
                uploaded_at: Utc::now(),
                size_bytes: text.len() as u64,
                extracted_text: text,
                keywords: Vec::new(),
                vector,
                term_frequency: Default::default(),
                checksum: String::new(),
                metadata: DocumentMetadata::default(),
                extraction_error: None,
            })
        }
        fn axis(first: f32) -> Vec<f32> {
            let mut vector = vec![0.0; 100];
            vector[0] = first;
            vector[1] = (1.0 - first * first).sqrt();
            vector
        }

        let engine = ScoringEngine::default();
        let documents = vec![
            with_vector("close", 5, axis(0.5)),
            with_vector("frequent", 10, axis(0.3)),
        ];
        let hits = engine.search("zeta", &axis(1.0), &documents);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "frequent");
        assert_eq!(hits[0].search_type, SearchType::Hybrid);
        assert!((hits[0].explanation.keyword - 2.0).abs() < 1e-5);
        assert!((hits[0].score - 0.81).abs() < 1e-4);
        assert!((hits[1].score - 0.65).abs() < 1e-4);
    }

    #[test]
    fn text_without_tokens_still_matches_by_keyword() {
        let engine = ScoringEngine::default();
        let documents = vec![document("m", "memo.txt", "It is 42. Go to 42!")];
        let hits = run(&engine, "42", &documents);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].search_type, SearchType::Keyword);
        assert!((hits[0].score - 0.4).abs() < 1e-5);
    }

    #[test]
    fn keyword_matches_below_threshold_are_excluded() {
        let config = ScoringConfig {
            keyword_match_score: 0.05,
            sentence_match_score: 0.0,
            ..ScoringConfig::default()
        };
        let engine = ScoringEngine::new(config);
        let documents = vec![document("a", "tools.txt", "abacus")];
        assert!(run(&engine, "ab", &documents).is_empty());
    }

    #[test]
    fn documents_without_content_never_match() {
        let engine = ScoringEngine::default();
        let documents = vec![document("empty", "fruit.txt", "")];
        assert!(run(&engine, "fruit", &documents).is_empty());
    }

    #[test]
    fn empty_query_returns_nothing() {
        let engine = ScoringEngine::default();
        let documents = vec![document("a", "notes.txt", "apples")];
        assert!(run(&engine, "   ", &documents).is_empty());
    }

    #[test]
    fn results_are_capped_and_ties_keep_insertion_order() {
        let engine = ScoringEngine::default();
        let documents = (0..15)
            .map(|index| {
                document(
                    &format!("doc-{index:02}"),
                    "budget.txt",
                    "The budget was approved. Budget review next.",
                )
            })
            .collect::<Vec<_>>();
        let hits = run(&engine, "budget", &documents);

        assert_eq!(hits.len(), 10);
        let ids = hits.iter().map(|hit| hit.document_id.as_str()).collect::<Vec<_>>();
        let expected = (0..10).map(|index| format!("doc-{index:02}")).collect::<Vec<_>>();
        assert_eq!(ids, expected);
    }

    #[test]
    fn higher_scores_rank_first() {
        let engine = ScoringEngine::default();
        let documents = vec![
            document("weak", "a.txt", "Old dog. Nothing else here."),
            document("strong", "dog.txt", "Dog walks. Dog park. Dog treats."),
        ];
        let hits = run(&engine, "dog", &documents);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "strong");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn context_includes_neighbouring_sentences() {
        let engine = ScoringEngine::default();
        let documents = vec![document(
            "c",
            "c.txt",
            "Preface. The invoice total is due. Pay by Friday.",
        )];
        let hits = run(&engine, "invoice", &documents);

        assert_eq!(
            hits[0].matched_sections[0].context,
            "Preface. The invoice total is due. Pay by Friday."
        );
    }

    #[test]
    fn context_is_a_character_window_around_the_match() {
        let engine = ScoringEngine::new(ScoringConfig {
            context_chars: 12,
            ..ScoringConfig::default()
        });
        let documents = vec![document(
            "w",
            "w.txt",
            "Alpha beta! The invoice is late? Pay now.",
        )];
        let hits = run(&engine, "invoice", &documents);

        assert_eq!(hits[0].matched_sections[0].text, "The invoice is late");
        assert_eq!(
            hits[0].matched_sections[0].context,
            "...a beta! The invoice is late? Pa..."
        );
    }

    #[test]
    fn highlight_is_case_insensitive_and_escapes_query() {
        let pattern = build_highlighter("c++");
        assert_eq!(
            highlight("Learn C++ and c++ fast", pattern.as_ref()),
            "Learn **C++** and **c++** fast"
        );
        assert_eq!(highlight("plain", None), "plain");
    }
}

use crate::concepts::{ConceptExpander, StaticConceptTable};
use crate::config::SearchConfig;
use crate::embeddings::{ConceptHashEmbedder, Embedder, Encoding};
use crate::error::IngestError;
use crate::extractor::{diagnostic_placeholder, TextExtractor};
use crate::ingest::digest_bytes;
use crate::models::{
    Document, FileType, SearchHit, SearchRequest, UploadRequest, UploadResponse,
};
use crate::preprocess::extract_keywords;
use crate::scoring::ScoringEngine;
use crate::store::DocumentStore;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Intermediate results of the text pipeline, for diagnostics.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub tokens: Vec<String>,
    pub expanded_terms: Vec<String>,
    /// Expanded terms that are themselves concept keys.
    pub concepts: Vec<String>,
    pub keywords: Vec<String>,
    pub encoding: Encoding,
}

/// Wires tokenizing, expansion, encoding and scoring for both uploads and
/// queries. Holds no documents; every call takes the caller's store.
pub struct SearchPipeline<E = StaticConceptTable> {
    embedder: ConceptHashEmbedder<E>,
    scoring: ScoringEngine,
}

impl SearchPipeline {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_expander(config, StaticConceptTable::default())
    }
}

impl Default for SearchPipeline {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl<E: ConceptExpander> SearchPipeline<E> {
    pub fn with_expander(config: SearchConfig, expander: E) -> Self {
        Self {
            embedder: ConceptHashEmbedder::new(config.preprocess, expander, config.encoder),
            scoring: ScoringEngine::new(config.scoring),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Turns an upload request into a document without storing it.
    pub fn build_document(&self, request: UploadRequest) -> Result<Document, IngestError> {
        let file_type: FileType = request.file_type.parse()?;

        // Placeholder text is kept for display but never indexed.
        let indexed_text = if request.extraction_error.is_some() {
            ""
        } else {
            request.extracted_text.as_str()
        };
        let analysis = self.embedder.analyze(indexed_text);
        let keywords = extract_keywords(
            &analysis.tokens,
            self.embedder.preprocess_config().keyword_limit,
        );

        Ok(Document {
            id: request
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            size_bytes: request
                .size_bytes
                .unwrap_or(request.extracted_text.len() as u64),
            checksum: digest_bytes(request.extracted_text.as_bytes()),
            filename: request.filename,
            file_type,
            uploaded_at: Utc::now(),
            extracted_text: request.extracted_text,
            keywords,
            vector: analysis.encoding.vector,
            term_frequency: analysis.encoding.term_frequency,
            metadata: request.metadata,
            extraction_error: request.extraction_error,
        })
    }

    pub fn upload(&self, store: &DocumentStore, request: UploadRequest) -> UploadResponse {
        let filename = request.filename.clone();
        let stored = self
            .build_document(request)
            .and_then(|document| store.insert(document));

        match stored {
            Ok(document) => {
                info!(
                    document_id = %document.id,
                    filename = %document.filename,
                    keywords = document.keywords.len(),
                    "document uploaded"
                );
                UploadResponse::stored(Document::clone(&document))
            }
            Err(error) => {
                warn!(filename = %filename, error = %error, "upload rejected");
                UploadResponse::rejected(&error)
            }
        }
    }

    /// Extracts text from raw bytes and uploads it. A failed extraction is
    /// still stored, with a diagnostic placeholder as its text.
    pub async fn upload_bytes<X>(
        &self,
        store: &DocumentStore,
        extractor: &X,
        filename: &str,
        bytes: &[u8],
    ) -> UploadResponse
    where
        X: TextExtractor + ?Sized,
    {
        let file_type = match FileType::from_path(Path::new(filename)) {
            Ok(file_type) => file_type,
            Err(error) => {
                warn!(filename = %filename, error = %error, "upload rejected");
                return UploadResponse::rejected(&error);
            }
        };

        let extraction = extractor.extract(bytes, file_type).await;
        let mut request = match extraction.text {
            Some(text) if extraction.success => {
                UploadRequest::new(filename, file_type.as_str(), text)
            }
            _ => {
                let reason = extraction
                    .error
                    .unwrap_or_else(|| "extractor returned no text".to_string());
                warn!(filename = %filename, reason = %reason, "text extraction failed");
                let mut request = UploadRequest::new(
                    filename,
                    file_type.as_str(),
                    diagnostic_placeholder(filename, file_type, &reason),
                );
                request.extraction_error = Some(reason);
                request
            }
        };
        request.size_bytes = Some(bytes.len() as u64);
        if let Some(metadata) = extraction.metadata {
            request.metadata = metadata;
        }

        self.upload(store, request)
    }

    pub fn search(&self, store: &DocumentStore, request: &SearchRequest) -> Vec<SearchHit> {
        let query = request.normalized();
        if query.is_empty() {
            return Vec::new();
        }

        let query_vector = self.embedder.embed(&query);
        let snapshot = store.all();
        let hits = self.scoring.search(&query, &query_vector, &snapshot);
        debug!(
            query = %query,
            candidates = snapshot.len(),
            hits = hits.len(),
            "search finished"
        );
        hits
    }

    pub fn delete(&self, store: &DocumentStore, id: &str) -> bool {
        store.delete(id).is_some()
    }

    pub fn list(&self, store: &DocumentStore) -> Vec<Arc<Document>> {
        store.all()
    }

    pub fn refresh_statistics(&self, store: &DocumentStore) {
        store.refresh_statistics();
    }

    pub fn inspect(&self, text: &str) -> Inspection {
        let analysis = self.embedder.analyze(text);
        let expander = self.embedder.expander();
        let expanded_terms = analysis.expansion.distinct();
        let concepts = expanded_terms
            .iter()
            .filter(|term| expander.is_concept(term))
            .cloned()
            .collect();
        Inspection {
            keywords: extract_keywords(
                &analysis.tokens,
                self.embedder.preprocess_config().keyword_limit,
            ),
            expanded_terms,
            concepts,
            tokens: analysis.tokens,
            encoding: analysis.encoding,
        }
    }
}

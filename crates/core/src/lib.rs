pub mod concepts;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod preprocess;
pub mod scoring;
pub mod store;

pub use concepts::{ConceptExpander, Expansion, StaticConceptTable};
pub use config::{EncoderConfig, PreprocessConfig, ScoringConfig, SearchConfig};
pub use embeddings::{
    bucket_index, cosine_similarity, string_hash, Analysis, ConceptHashEmbedder, Embedder,
    Encoding, HashingEncoder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{ConfigError, IngestError};
pub use extractor::{diagnostic_placeholder, Extraction, PlainTextExtractor, TextExtractor};
pub use ingest::{digest_bytes, discover_supported_files, ingest_folder, IngestionReport, SkippedFile};
pub use models::{
    Document, DocumentMetadata, FileType, MatchedSection, ScoreBreakdown, SearchHit,
    SearchRequest, SearchType, UploadRequest, UploadResponse,
};
pub use orchestrator::{Inspection, SearchPipeline};
pub use preprocess::{extract_keywords, split_sentences, tokenize, STOPWORDS};
pub use scoring::ScoringEngine;
pub use store::{DocumentStore, TermStatistics};

use crate::error::IngestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Csv,
    Txt,
    Xlsx,
    Pptx,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        FileType::Pdf,
        FileType::Docx,
        FileType::Csv,
        FileType::Txt,
        FileType::Xlsx,
        FileType::Pptx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Csv => "csv",
            FileType::Txt => "txt",
            FileType::Xlsx => "xlsx",
            FileType::Pptx => "pptx",
        }
    }

    /// Text formats can be decoded without a format-specific extractor.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, FileType::Txt | FileType::Csv)
    }

    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| IngestError::UnsupportedFileType(path.display().to_string()))?;
        extension.parse()
    }
}

impl FromStr for FileType {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().trim_start_matches('.').to_lowercase();
        FileType::ALL
            .into_iter()
            .find(|file_type| file_type.as_str() == lowered)
            .ok_or_else(|| IngestError::UnsupportedFileType(value.to_string()))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

/// An indexed document. Owned by the [`DocumentStore`](crate::DocumentStore)
/// and never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub extracted_text: String,
    /// Up to `keyword_limit` distinct tokens, most frequent first.
    pub keywords: Vec<String>,
    /// L2-normalized, or all zeros when the text had no usable tokens.
    pub vector: Vec<f32>,
    /// Term frequencies over the expanded token multiset.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub term_frequency: BTreeMap<String, f32>,
    /// SHA-256 of the extracted text.
    pub checksum: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Set when the upstream extractor failed and `extracted_text` is a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

impl Document {
    /// Empty text and extraction placeholders never match a query.
    pub fn is_searchable(&self) -> bool {
        self.extraction_error.is_none() && !self.extracted_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Semantic,
    Keyword,
    Hybrid,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Semantic => "semantic",
            SearchType::Keyword => "keyword",
            SearchType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedSection {
    /// The sentence that contains the query.
    pub text: String,
    /// Surrounding text from the full document.
    pub context: String,
    /// `text` with each query occurrence wrapped in `**`.
    pub highlighted: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub semantic: f32,
    pub effective_semantic: f32,
    pub keyword: f32,
    pub filename_matched: bool,
    pub keyword_matches: usize,
    pub sentence_matches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub document_id: String,
    pub filename: String,
    pub score: f32,
    pub search_type: SearchType,
    pub matched_sections: Vec<MatchedSection>,
    pub explanation: ScoreBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Caller-supplied id; a UUID is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    pub file_type: String,
    pub extracted_text: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    /// When set, `extracted_text` is a diagnostic placeholder and is not indexed.
    #[serde(default)]
    pub extraction_error: Option<String>,
}

impl UploadRequest {
    pub fn new(
        filename: impl Into<String>,
        file_type: impl Into<String>,
        extracted_text: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            filename: filename.into(),
            file_type: file_type.into(),
            extracted_text: extracted_text.into(),
            metadata: DocumentMetadata::default(),
            size_bytes: None,
            extraction_error: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn stored(document: Document) -> Self {
        Self {
            success: true,
            document: Some(document),
            error: None,
        }
    }

    pub fn rejected(error: &IngestError) -> Self {
        Self {
            success: false,
            document: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub query: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Trimmed and lowercased query used for substring matching.
    pub fn normalized(&self) -> String {
        self.query.trim().to_lowercase()
    }
}

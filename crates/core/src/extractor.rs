use crate::models::{DocumentMetadata, FileType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of turning raw file bytes into plain text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Extraction {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Extraction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            metadata: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            metadata: None,
            error: Some(error.into()),
        }
    }
}

/// Format-specific text extraction. Binary formats are handled by
/// implementations outside this crate.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8], file_type: FileType) -> Extraction;
}

/// Decodes `txt` and `csv` as UTF-8. Every other type is reported as a
/// failed extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8], file_type: FileType) -> Extraction {
        if !file_type.is_plain_text() {
            return Extraction::failed(format!("no text extractor available for {file_type}"));
        }
        if bytes.contains(&0) {
            return Extraction::failed("file contains binary data");
        }

        Extraction::text(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Text stored in place of content when extraction failed, so the document
/// still shows up in listings.
pub fn diagnostic_placeholder(filename: &str, file_type: FileType, error: &str) -> String {
    format!("[{file_type} text extraction failed for {filename}: {error}]")
}

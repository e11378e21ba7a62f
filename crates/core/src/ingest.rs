use crate::concepts::ConceptExpander;
use crate::extractor::TextExtractor;
use crate::models::FileType;
use crate::orchestrator::SearchPipeline;
use crate::store::DocumentStore;
use crate::IngestError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Files under `folder`, recursively, whose extension is a supported type.
pub fn discover_supported_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        if FileType::from_path(entry.path()).is_ok() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestionReport {
    pub stored: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

/// Uploads every supported file in `folder`. Files that cannot be read or
/// stored are reported instead of aborting the run.
pub async fn ingest_folder<E, X>(
    pipeline: &SearchPipeline<E>,
    store: &DocumentStore,
    extractor: &X,
    folder: &Path,
) -> Result<IngestionReport, IngestError>
where
    E: ConceptExpander,
    X: TextExtractor + ?Sized,
{
    let files = discover_supported_files(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no supported documents found in {}",
            folder.display()
        )));
    }

    let mut report = IngestionReport::default();

    for path in files {
        let filename = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => {
                report.skipped.push(SkippedFile {
                    reason: IngestError::MissingFileName(path.display().to_string()).to_string(),
                    path,
                });
                continue;
            }
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "unable to read file");
                report.skipped.push(SkippedFile {
                    path,
                    reason: IngestError::Io(error).to_string(),
                });
                continue;
            }
        };

        let response = pipeline
            .upload_bytes(store, extractor, &filename, &bytes)
            .await;
        match response.document {
            Some(document) if response.success => report.stored.push(document.id),
            _ => report.skipped.push(SkippedFile {
                path,
                reason: response
                    .error
                    .unwrap_or_else(|| "upload failed".to_string()),
            }),
        }
    }

    info!(
        folder = %folder.display(),
        stored = report.stored.len(),
        skipped = report.skipped.len(),
        "folder ingested"
    );
    Ok(report)
}

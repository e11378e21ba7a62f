use crate::error::IngestError;
use crate::models::Document;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Corpus-wide term statistics.
///
/// Document frequencies only grow on insert. Deletes leave them stale until
/// the next [`DocumentStore::refresh_statistics`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct TermStatistics {
    document_frequency: HashMap<String, usize>,
    vocabulary: BTreeSet<String>,
    total_documents: usize,
    idf: BTreeMap<String, f64>,
}

impl TermStatistics {
    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    pub fn vocabulary(&self) -> &BTreeSet<String> {
        &self.vocabulary
    }

    /// Inverse document frequency as of the last refresh.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// Terms ordered by document frequency, most common first.
    pub fn most_common(&self, limit: usize) -> Vec<(String, usize)> {
        let mut terms = self
            .vocabulary
            .iter()
            .map(|term| (term.clone(), self.document_frequency(term)))
            .collect::<Vec<_>>();
        terms.sort_by(|left, right| right.1.cmp(&left.1));
        terms.truncate(limit);
        terms
    }

    fn record(&mut self, document: &Document) {
        self.total_documents += 1;
        for term in document.term_frequency.keys() {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
            self.vocabulary.insert(term.clone());
        }
    }

    fn recompute_idf(&mut self) {
        let total = self.total_documents as f64;
        self.idf = self
            .vocabulary
            .iter()
            .filter_map(|term| {
                let frequency = self.document_frequency(term);
                (frequency > 0).then(|| (term.clone(), (total / frequency as f64).ln()))
            })
            .collect();
    }
}

#[derive(Debug, Default)]
struct StoreState {
    documents: Vec<Arc<Document>>,
    statistics: TermStatistics,
}

/// In-memory document collection.
///
/// Owned by the caller and shared by handle between ingestion and search.
/// A single reader/writer lock guards the collection; searches work on the
/// snapshot returned by [`DocumentStore::all`] so they never hold the lock
/// while scoring.
#[derive(Debug, Default)]
pub struct DocumentStore {
    state: RwLock<StoreState>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: Document) -> Result<Arc<Document>, IngestError> {
        let mut state = self.state.write();
        if state.documents.iter().any(|stored| stored.id == document.id) {
            return Err(IngestError::DuplicateId(document.id));
        }

        state.statistics.record(&document);
        let document = Arc::new(document);
        state.documents.push(Arc::clone(&document));
        debug!(
            document_id = %document.id,
            terms = document.term_frequency.len(),
            total_documents = state.statistics.total_documents,
            "document stored"
        );
        Ok(document)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.state
            .read()
            .documents
            .iter()
            .find(|document| document.id == id)
            .cloned()
    }

    pub fn delete(&self, id: &str) -> Option<Arc<Document>> {
        let mut state = self.state.write();
        let position = state.documents.iter().position(|document| document.id == id)?;
        let removed = state.documents.remove(position);
        state.statistics.total_documents = state.statistics.total_documents.saturating_sub(1);
        debug!(document_id = %id, "document deleted");
        Some(removed)
    }

    /// Snapshot of every document in insertion order.
    pub fn all(&self) -> Vec<Arc<Document>> {
        self.state.read().documents.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.documents.clear();
        state.statistics = TermStatistics::default();
    }

    /// Rebuilds document frequencies from the stored documents and recomputes
    /// the IDF table. IDF is auxiliary; scoring does not read it.
    pub fn refresh_statistics(&self) {
        let mut state = self.state.write();
        let mut statistics = TermStatistics::default();
        for document in &state.documents {
            statistics.record(document);
        }
        statistics.recompute_idf();
        state.statistics = statistics;

        info!(
            total_documents = state.statistics.total_documents,
            vocabulary = state.statistics.vocabulary.len(),
            "term statistics refreshed"
        );
    }

    pub fn term_statistics(&self) -> TermStatistics {
        self.state.read().statistics.clone()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.state.read().statistics.idf(term)
    }
}

//! In-memory backend over a [`Corpus`].

use crate::store::{NewDocument, SearchStore, StorageError};
use async_trait::async_trait;
use hybridsearch_core::document::Document;
use hybridsearch_core::search::RankedResults;
use hybridsearch_core::storage::Corpus;

/// Serves searches from an in-process corpus. Scoring runs inline under the
/// corpus read lock; the lock is never held across an `.await`.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    corpus: Corpus,
}

impl MemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            corpus: Corpus::new(dimension),
        }
    }

    pub fn from_corpus(corpus: Corpus) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }
}

#[async_trait]
impl SearchStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn keyword_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<RankedResults, StorageError> {
        Ok(self.corpus.keyword_search(query, limit))
    }

    async fn semantic_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, StorageError> {
        Ok(self.corpus.semantic_search(embedding, limit)?)
    }

    async fn hybrid_search(
        &self,
        query: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, StorageError> {
        Ok(self.corpus.hybrid_search(query, embedding, limit)?)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn document_count(&self) -> Result<u64, StorageError> {
        Ok(self.corpus.document_count() as u64)
    }

    async fn insert_document(
        &self,
        doc: NewDocument,
        embedding: Vec<f32>,
    ) -> Result<i64, StorageError> {
        let id = match doc.id {
            Some(id) => self
                .corpus
                .insert_document(Document::new(id, doc.title, doc.body), embedding)?,
            None => self.corpus.insert_new(doc.title, doc.body, embedding)?,
        };
        Ok(id)
    }

    async fn close(&self) {}
}

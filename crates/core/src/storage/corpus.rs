//! In-memory corpus.
//!
//! A [`Corpus`] holds documents, their stored embeddings, and a BM25 inverted
//! index over `title || ' ' || body`. Scorers evaluate the whole corpus under a
//! single read lock, so hybrid scores are always computed for every document
//! before truncation.

use crate::bm25::{bm25_match, InvertedIndex};
use crate::document::Document;
use crate::search::hybrid::{rank_hybrid, rank_lexical, rank_semantic, HybridCandidate};
use crate::search::similarity::cosine_similarity;
use crate::search::types::RankedResults;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Errors raised by corpus mutation or scoring.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CorpusError {
    #[error("expected embedding dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("document {0} already exists")]
    DuplicateId(i64),
    #[error("embedding contains NaN or Inf")]
    NonFiniteEmbedding,
}

/// Internal corpus data, protected by a `RwLock`.
///
/// `documents`, `embeddings` and the BM25 postings share one internal slot space.
#[derive(Debug)]
pub struct CorpusData {
    pub dimension: usize,
    pub documents: Vec<Arc<Document>>,
    pub embeddings: Vec<Vec<f32>>,
    pub id_to_internal: HashMap<i64, u32>,
    pub bm25_index: InvertedIndex,
}

impl CorpusData {
    /// Creates an empty corpus whose embeddings have `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            documents: Vec::new(),
            embeddings: Vec::new(),
            id_to_internal: HashMap::new(),
            bm25_index: InvertedIndex::new(),
        }
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), CorpusError> {
        if embedding.len() != self.dimension {
            return Err(CorpusError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

fn next_id_in(data: &CorpusData) -> i64 {
    data.id_to_internal.keys().max().map_or(1, |max| max + 1)
}

fn insert_locked(
    data: &mut CorpusData,
    doc: Document,
    embedding: Vec<f32>,
) -> Result<i64, CorpusError> {
    data.check_dimension(&embedding)?;
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(CorpusError::NonFiniteEmbedding);
    }
    if data.id_to_internal.contains_key(&doc.id) {
        return Err(CorpusError::DuplicateId(doc.id));
    }

    let id = doc.id;
    let internal_id = data.documents.len() as u32;
    data.bm25_index
        .add_document(internal_id, &doc.searchable_text());
    data.documents.push(Arc::new(doc));
    data.embeddings.push(embedding);
    data.id_to_internal.insert(id, internal_id);
    Ok(id)
}

/// Thread-safe handle to an in-memory corpus.
///
/// Cloning a `Corpus` produces a new handle to the same shared data.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub data: Arc<RwLock<CorpusData>>,
}

impl Corpus {
    pub fn new(dimension: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(CorpusData::new(dimension))),
        }
    }

    /// Inserts a document with its stored embedding. IDs are unique.
    pub fn insert_document(&self, doc: Document, embedding: Vec<f32>) -> Result<i64, CorpusError> {
        insert_locked(&mut self.data.write(), doc, embedding)
    }

    /// Inserts a document under the next free id (see [`Corpus::next_id`]).
    ///
    /// The id is chosen and claimed under one write lock.
    pub fn insert_new(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Result<i64, CorpusError> {
        let mut data = self.data.write();
        let id = next_id_in(&data);
        let doc = Document::new(id, title, body);
        insert_locked(&mut data, doc, embedding)
    }

    /// The id a serial column would hand out next: one past the largest id.
    pub fn next_id(&self) -> i64 {
        next_id_in(&self.data.read())
    }

    /// Retrieves a document by id, or `None` if not found.
    pub fn get_document(&self, id: i64) -> Option<Arc<Document>> {
        let data = self.data.read();
        let internal_id = *data.id_to_internal.get(&id)?;
        data.documents.get(internal_id as usize).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.data.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_count() == 0
    }

    pub fn dimension(&self) -> usize {
        self.data.read().dimension
    }

    /// Lexical scorer: documents matching every query term, by BM25 score.
    pub fn keyword_search(&self, query: &str, limit: usize) -> RankedResults {
        let data = self.data.read();
        let hits = bm25_match(&data.bm25_index, query)
            .into_iter()
            .filter_map(|(internal_id, score)| {
                let doc = data.documents.get(internal_id as usize)?;
                Some((Arc::clone(doc), score as f64))
            });
        rank_lexical(hits, limit)
    }

    /// Semantic scorer: every document by cosine similarity to `query_embedding`.
    pub fn semantic_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, CorpusError> {
        let data = self.data.read();
        data.check_dimension(query_embedding)?;
        let hits = data
            .documents
            .iter()
            .zip(&data.embeddings)
            .map(|(doc, emb)| (Arc::clone(doc), cosine_similarity(query_embedding, emb)));
        Ok(rank_semantic(hits, limit))
    }

    /// Hybrid scorer: both scores for every document, combined before truncation.
    ///
    /// Documents the text predicate does not match get a lexical score of 0.0.
    pub fn hybrid_search(
        &self,
        query: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, CorpusError> {
        let data = self.data.read();
        data.check_dimension(query_embedding)?;
        let lexical = bm25_match(&data.bm25_index, query);
        let candidates = data
            .documents
            .iter()
            .zip(&data.embeddings)
            .enumerate()
            .map(|(internal_id, (doc, emb))| HybridCandidate {
                document: Arc::clone(doc),
                lexical_score: lexical.get(&(internal_id as u32)).map(|s| *s as f64),
                semantic_score: cosine_similarity(query_embedding, emb),
            });
        Ok(rank_hybrid(candidates, limit))
    }
}

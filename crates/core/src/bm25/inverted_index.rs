//! Inverted index for BM25 full-text scoring.
//!
//! Maps terms to postings lists (document slot + term frequency). Documents are
//! identified by internal u32 slots for memory efficiency; the corpus maps slots
//! back to document IDs.

use crate::bm25::tokenizer::tokenize;
use std::collections::HashMap;

/// A single entry in a term's postings list.
#[derive(Debug, Clone)]
pub struct Posting {
    /// Internal u32 document slot.
    pub doc_id: u32,
    /// Number of times the term appears in this document.
    pub term_frequency: u32,
}

/// Inverted index mapping terms to postings lists.
///
/// Document lengths are tracked for BM25 length normalization.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    /// term → list of postings
    pub index: HashMap<String, Vec<Posting>>,
    /// internal slot → document length (number of tokens).
    pub doc_lengths: Vec<u32>,
    /// Total number of documents indexed
    pub doc_count: u32,
    /// Sum of all document lengths (for average calculation)
    pub total_doc_length: u64,
}

impl InvertedIndex {
    /// Creates a new empty inverted index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document's text under its internal slot.
    pub fn add_document(&mut self, internal_id: u32, text: &str) {
        let tokens = tokenize(text);
        let doc_len = tokens.len() as u32;

        let idx = internal_id as usize;
        if idx >= self.doc_lengths.len() {
            self.doc_lengths.resize(idx + 1, 0);
        }
        self.doc_lengths[idx] = doc_len;
        self.doc_count += 1;
        self.total_doc_length += doc_len as u64;

        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in tokens.iter() {
            *tf_map.entry(token).or_insert(0) += 1;
        }

        for (term, tf) in tf_map {
            self.index
                .entry(term.to_string())
                .or_default()
                .push(Posting {
                    doc_id: internal_id,
                    term_frequency: tf,
                });
        }
    }

    /// Returns the average document length across all indexed documents.
    pub fn average_doc_length(&self) -> f32 {
        if self.doc_count == 0 {
            return 0.0;
        }
        self.total_doc_length as f32 / self.doc_count as f32
    }

    /// Returns the indexed length of a document, or 0 for unknown slots.
    pub fn doc_length(&self, internal_id: u32) -> u32 {
        self.doc_lengths
            .get(internal_id as usize)
            .copied()
            .unwrap_or(0)
    }
}

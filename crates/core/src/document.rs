//! Core document type for hybridsearch.
//!
//! A `Document` is an immutable record owned by the storage backend. The engine
//! only ever reads it; lexical matching runs over [`Document::searchable_text`].

use serde::{Deserialize, Serialize};

/// A stored document with an integer ID, a title, and a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier assigned by the storage backend.
    pub id: i64,
    /// Short title, indexed together with the body.
    pub title: String,
    /// Document body.
    pub body: String,
}

impl Document {
    /// Creates a document with a specific ID.
    pub fn new(id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
        }
    }

    /// The normalized representation used for lexical matching: `title || ' ' || body`.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + 1 + self.body.len());
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.body);
        text
    }
}

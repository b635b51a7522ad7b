//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// A curated knowledge document.
///
/// Identity is `id`; every other field is payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique, non-empty document identifier
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub url: String,

    /// Publishing organisation (e.g. a ministry)
    #[serde(default)]
    pub source: String,

    /// Free-form last-updated marker as written in the source file
    #[serde(default)]
    pub updated_at: String,

    pub content: String,
}

impl Document {
    /// Text used for lexical indexing.
    pub fn lexical_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// Text sent to the embedding provider.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }

    /// Listing view without the body.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            source: self.source.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// A document without its content, as exposed by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub updated_at: String,
}

/// A retrieved document together with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f64,
}

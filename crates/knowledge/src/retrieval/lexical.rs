//! Sparse TF-IDF index over character bigrams.
//!
//! Text is lower-cased and stripped of all whitespace before tokenizing, so
//! the same scheme works for Japanese (no word boundaries) and Latin text.

use crate::types::Document;
use std::collections::{BTreeMap, HashMap};

/// Lower-case and drop every whitespace character.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Overlapping character bigrams of already-normalized text.
///
/// A one-character string is its own single token; an empty string has none.
pub fn bigrams(normalized: &str) -> Vec<String> {
    let chars: Vec<char> = normalized.chars().collect();
    match chars.len() {
        0 => Vec::new(),
        1 => vec![normalized.to_string()],
        _ => chars.windows(2).map(|w| w.iter().collect()).collect(),
    }
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in bigrams(&normalize(text)) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Token weights plus their precomputed L2 norm.
///
/// Weights are kept in token order so sums are reproducible across builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub weights: BTreeMap<String, f64>,
    pub norm: f64,
}

impl SparseVector {
    fn from_weights(weights: BTreeMap<String, f64>) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        Self { weights, norm }
    }

    /// Cosine similarity; 0 when either side has zero norm.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }

        let (small, large) = if self.weights.len() <= other.weights.len() {
            (&self.weights, &other.weights)
        } else {
            (&other.weights, &self.weights)
        };
        let dot: f64 = small
            .iter()
            .filter_map(|(token, w)| large.get(token).map(|v| w * v))
            .sum();

        dot / (self.norm * other.norm)
    }
}

/// Lexical index aligned with the document slice it was built from.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    idf: HashMap<String, f64>,
    vectors: Vec<SparseVector>,
}

impl LexicalIndex {
    pub fn build(documents: &[Document]) -> Self {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| term_counts(&doc.lexical_text()))
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc_counts in &counts {
            for token in doc_counts.keys() {
                *df.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let n = documents.len().max(1) as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(token, df)| {
                let value = ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0;
                (token.to_string(), value)
            })
            .collect();

        let vectors = counts
            .iter()
            .map(|doc_counts| weigh(doc_counts, &idf))
            .collect();

        tracing::debug!(
            documents = documents.len(),
            vocabulary = idf.len(),
            "Lexical index built"
        );

        Self { idf, vectors }
    }

    /// Weight arbitrary text against this index's idf table.
    ///
    /// Tokens the corpus has never seen get weight 0.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        weigh(&term_counts(text), &self.idf)
    }

    /// Similarity of `query` to every document, in document order.
    pub fn score_all(&self, query: &str) -> Vec<f64> {
        let query = self.vectorize(query);
        self.vectors.iter().map(|doc| query.cosine(doc)).collect()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn weigh(counts: &HashMap<String, usize>, idf: &HashMap<String, f64>) -> SparseVector {
    let distinct = counts.len().max(1) as f64;
    let weights = counts
        .iter()
        .map(|(token, tf)| {
            let idf = idf.get(token).copied().unwrap_or(0.0);
            (token.clone(), (*tf as f64 / distinct) * idf)
        })
        .collect();
    SparseVector::from_weights(weights)
}

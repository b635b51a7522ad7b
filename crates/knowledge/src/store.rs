//! Knowledge stores: where documents come from.

use crate::parser;
use crate::types::Document;
use healthdesk_core::AppResult;
use std::collections::HashMap;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Source of the curated corpus.
///
/// The store is re-read in full on every build and reload.
pub trait KnowledgeStore: Send + Sync {
    /// All documents, unique by id.
    fn list_documents(&self) -> AppResult<Vec<Document>>;
}

/// Fixed in-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: Vec<Document>,
}

impl InMemoryStore {
    /// Create a store; later documents replace earlier ones with the same id.
    pub fn new(documents: Vec<Document>) -> Self {
        let mut merged = DocumentSet::default();
        for doc in documents {
            merged.insert(doc);
        }
        Self {
            documents: merged.into_vec(),
        }
    }
}

impl KnowledgeStore for InMemoryStore {
    fn list_documents(&self) -> AppResult<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// Loads `*.md` and `*.json` documents from a list of directories.
///
/// Directories are read in order and files within a directory in file-name
/// order. Missing directories and unreadable or malformed files are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dirs: Vec<PathBuf>,
}

impl DirectoryStore {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl KnowledgeStore for DirectoryStore {
    fn list_documents(&self) -> AppResult<Vec<Document>> {
        let mut documents = DocumentSet::default();

        for dir in &self.dirs {
            if !dir.is_dir() {
                tracing::debug!("Knowledge directory {:?} not found, skipping", dir);
                continue;
            }

            for entry in WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                match parser::parse_file(entry.path()) {
                    Ok(Some(doc)) => documents.insert(doc),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Skipping knowledge file {:?}: {}", entry.path(), e),
                }
            }
        }

        let documents = documents.into_vec();
        tracing::debug!("Loaded {} documents from {:?}", documents.len(), self.dirs);
        Ok(documents)
    }
}

/// Insertion-ordered set of documents keyed by id; later inserts win.
#[derive(Default)]
struct DocumentSet {
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
}

impl DocumentSet {
    fn insert(&mut self, doc: Document) {
        if doc.id.is_empty() {
            tracing::warn!("Skipping document without id (title: {})", doc.title);
            return;
        }
        match self.positions.get(&doc.id) {
            Some(&pos) => self.documents[pos] = doc,
            None => {
                self.positions.insert(doc.id.clone(), self.documents.len());
                self.documents.push(doc);
            }
        }
    }

    fn into_vec(self) -> Vec<Document> {
        self.documents
    }
}

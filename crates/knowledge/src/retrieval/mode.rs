//! Index mode state machine.
//!
//! Exactly one mode is active at a time. Degradation from `Dense` to
//! `Lexical` is one-way; only `Reset` leaves `Lexical`.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    Unbuilt,
    Dense,
    Lexical,
}

/// Something that happened to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// Every document received an embedding.
    DenseBuilt,
    /// At least one document embedding failed during a build.
    DenseBuildFailed,
    /// No embedding provider was resolved for the build.
    NoProvider,
    /// Embedding a query failed while serving from the dense index.
    QueryEmbeddingFailed,
    Reset,
}

impl IndexMode {
    pub fn transition(self, event: ModeEvent) -> IndexMode {
        use IndexMode::*;
        use ModeEvent::*;

        match (self, event) {
            (_, Reset) => Unbuilt,
            (Unbuilt, DenseBuilt) => Dense,
            (Unbuilt, DenseBuildFailed | NoProvider) => Lexical,
            (Unbuilt, QueryEmbeddingFailed) => Unbuilt,
            (Dense, DenseBuilt) => Dense,
            (Dense, DenseBuildFailed | NoProvider | QueryEmbeddingFailed) => Lexical,
            (Lexical, _) => Lexical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMode::Unbuilt => "unbuilt",
            IndexMode::Dense => "dense",
            IndexMode::Lexical => "lexical",
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Answer composition.
//!
//! [`compose`] is a pure function of already-resolved inputs. The branches
//! are tried in a fixed order and the first applicable one produces the
//! whole envelope:
//!
//! 1. forbidden request: disclaimer + emergency advice, risk forced to high
//! 2. generated text available: disclaimer (+ emergency) + generated text
//! 3. nothing retrieved: information-shortage answer, risk reported as low
//! 4. otherwise: disclaimer (+ emergency) + bulleted summary of the documents

use crate::policy::{ForbiddenVerdict, RiskAssessment, RiskLevel};
use crate::templates::{AnswerTemplates, PART_SEPARATOR};
use healthdesk_knowledge::Document;
use serde::Serialize;

/// Characters of document content kept in a summary bullet.
pub const SNIPPET_CHARS: usize = 400;

/// Title of the placeholder citation used when nothing was retrieved.
pub const NO_CITATION: &str = "no_citation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub source: String,
}

impl Citation {
    pub fn placeholder() -> Self {
        Self {
            title: NO_CITATION.to_string(),
            url: String::new(),
            source: String::new(),
        }
    }
}

impl From<&Document> for Citation {
    fn from(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            url: doc.url.clone(),
            source: doc.source.clone(),
        }
    }
}

/// Which branch produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPath {
    Forbidden,
    Generated,
    NoEvidence,
    Summary,
}

/// The response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEnvelope {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub risk_level: RiskLevel,
    pub triage_hint: String,

    /// Reasons behind `risk_level`; kept for logging, not sent to clients.
    #[serde(skip_serializing)]
    pub reasons: Vec<String>,

    #[serde(skip_serializing)]
    pub path: AnswerPath,
}

/// Compose the final answer.
///
/// `generated` is the generator's output, or `None` when no generator ran
/// or it produced nothing. Blank text counts as nothing.
pub fn compose(
    templates: &AnswerTemplates,
    risk: &RiskAssessment,
    forbidden: &ForbiddenVerdict,
    documents: &[Document],
    generated: Option<&str>,
) -> AnswerEnvelope {
    let citations = citations(documents);
    let high = risk.level == RiskLevel::High;
    let tiered_hint = if high {
        templates.emergency.clone()
    } else {
        templates.care_guidance.clone()
    };

    if forbidden.matched {
        let mut reasons = vec!["forbidden_terms".to_string()];
        reasons.extend(forbidden.terms.iter().cloned());
        return AnswerEnvelope {
            answer: templates.emergency_answer(),
            citations,
            risk_level: RiskLevel::High,
            triage_hint: templates.emergency.clone(),
            reasons,
            path: AnswerPath::Forbidden,
        };
    }

    let mut parts = vec![templates.disclaimer.clone()];
    if high {
        parts.push(templates.emergency.clone());
    }

    if let Some(text) = generated.map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(text.to_string());
        return AnswerEnvelope {
            answer: parts.join(PART_SEPARATOR),
            citations,
            risk_level: risk.level,
            triage_hint: tiered_hint,
            reasons: risk.reasons.clone(),
            path: AnswerPath::Generated,
        };
    }

    if documents.is_empty() {
        // Reported as low even when the classifier found medium/high signals.
        return AnswerEnvelope {
            answer: templates.info_shortage_answer(),
            citations,
            risk_level: RiskLevel::Low,
            triage_hint: templates.care_guidance.clone(),
            reasons: Vec::new(),
            path: AnswerPath::NoEvidence,
        };
    }

    let bullets: Vec<String> = documents
        .iter()
        .map(|doc| format!("- {}: {}", doc.title, snippet(&doc.content)))
        .collect();
    parts.push(format!("{}\n{}", templates.summary_header, bullets.join("\n")));

    AnswerEnvelope {
        answer: parts.join(PART_SEPARATOR),
        citations,
        risk_level: risk.level,
        triage_hint: tiered_hint,
        reasons: risk.reasons.clone(),
        path: AnswerPath::Summary,
    }
}

/// Citations for the documents, or the single placeholder when there are none.
pub fn citations(documents: &[Document]) -> Vec<Citation> {
    if documents.is_empty() {
        return vec![Citation::placeholder()];
    }
    documents.iter().map(Citation::from).collect()
}

fn snippet(content: &str) -> String {
    match content.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}…", &content[..cut]),
        None => content.to_string(),
    }
}

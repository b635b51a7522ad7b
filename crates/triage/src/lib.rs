//! Risk triage and answer composition for Healthdesk.
//!
//! A query is classified by the [`RiskClassifier`], matched against the
//! knowledge base by the retriever, optionally answered by an
//! [`AnswerGenerator`], and finally turned into an [`AnswerEnvelope`] by the
//! composer. [`QueryEngine`] owns all of it.

pub mod composer;
pub mod engine;
pub mod generator;
pub mod policy;
pub mod templates;

#[cfg(test)]
mod tests;

pub use composer::{compose, AnswerEnvelope, AnswerPath, Citation};
pub use engine::{EngineOptions, QueryEngine, Readiness};
pub use generator::{generator_from_config, AnswerGenerator, DisabledGenerator, LlmGenerator};
pub use policy::{ForbiddenVerdict, RiskAssessment, RiskClassifier, RiskLevel, POLICY_VERSION};
pub use templates::AnswerTemplates;

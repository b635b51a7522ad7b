//! Engine scenarios over in-memory knowledge bases.

use crate::composer::{AnswerPath, Citation};
use crate::engine::{EngineOptions, QueryEngine};
use crate::generator::{AnswerGenerator, DisabledGenerator};
use crate::policy::RiskLevel;
use crate::templates::AnswerTemplates;
use healthdesk_core::AppResult;
use healthdesk_knowledge::{
    Document, EmbeddingProvider, FixedProviderSource, IndexMode, InMemoryStore, KnowledgeStore,
    MockProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replies with fixed text and counts invocations.
struct ScriptedGenerator {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn replying(reply: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn try_generate(&self, _: &str, _: &[Document], _: RiskLevel) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// A store whose contents can be swapped between reloads.
struct SwappableStore {
    documents: Mutex<Vec<Document>>,
}

impl KnowledgeStore for SwappableStore {
    fn list_documents(&self) -> AppResult<Vec<Document>> {
        Ok(self.documents.lock().unwrap().clone())
    }
}

fn doc(id: &str, title: &str, content: &str) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://example.jp/{}", id),
        source: "厚生労働省".to_string(),
        updated_at: "2024-01-01".to_string(),
        content: content.to_string(),
    }
}

fn fever_doc() -> Document {
    doc("d1", "発熱について", "39度の発熱が続く場合は…")
}

fn corpus() -> Vec<Document> {
    vec![
        fever_doc(),
        doc("heat", "熱中症の予防", "暑い日はこまめな水分補給と休憩を心がけましょう。"),
        doc("chest", "胸の痛み", "強い胸痛や息苦しさがある場合はすぐに救急要請を。"),
    ]
}

async fn build_engine(
    documents: Vec<Document>,
    generator: Arc<dyn AnswerGenerator>,
) -> QueryEngine {
    let engine = QueryEngine::new(
        Arc::new(InMemoryStore::new(documents)),
        Arc::new(FixedProviderSource::none()),
        generator,
        EngineOptions::default(),
    );
    engine.initialize().await.unwrap();
    engine
}

#[tokio::test]
async fn test_fever_scenario_summarizes_document() {
    let engine = build_engine(vec![fever_doc()], Arc::new(DisabledGenerator)).await;
    let t = AnswerTemplates::default();

    let envelope = engine.ask("子供が39度の熱です").await.unwrap();

    assert_eq!(envelope.risk_level, RiskLevel::Medium);
    assert!(envelope.reasons.contains(&"39度".to_string()));
    assert_eq!(envelope.path, AnswerPath::Summary);
    assert_eq!(
        envelope.answer,
        format!(
            "{}\n\n参考情報（出典の要点）：\n- 発熱について: 39度の発熱が続く場合は…",
            t.disclaimer
        )
    );
    assert_eq!(envelope.citations, vec![Citation::from(&fever_doc())]);
    assert_eq!(envelope.triage_hint, t.care_guidance);
}

#[tokio::test]
async fn test_high_risk_without_generator_includes_emergency() {
    let engine = build_engine(corpus(), Arc::new(DisabledGenerator)).await;
    let t = AnswerTemplates::default();

    let envelope = engine.ask("意識がない人がいます").await.unwrap();

    assert_eq!(envelope.risk_level, RiskLevel::High);
    assert!(envelope.answer.contains(&t.emergency));
    assert!(envelope.answer.starts_with(&t.disclaimer));
    assert_eq!(envelope.triage_hint, t.emergency);
}

#[tokio::test]
async fn test_forbidden_request_skips_generator_and_corpus() {
    let generator = ScriptedGenerator::replying(Some("薬はこちらです"));
    let engine = build_engine(corpus(), generator.clone()).await;
    let t = AnswerTemplates::default();

    let envelope = engine.ask("薬を出してください").await.unwrap();

    assert_eq!(envelope.answer, format!("{}\n\n{}", t.disclaimer, t.emergency));
    assert_eq!(envelope.risk_level, RiskLevel::High);
    assert_eq!(envelope.reasons[0], "forbidden_terms");
    assert_eq!(envelope.triage_hint, t.emergency);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_forbidden_answer_is_independent_of_corpus() {
    let t = AnswerTemplates::default();
    for documents in [Vec::new(), vec![fever_doc()], corpus()] {
        let engine = build_engine(documents, Arc::new(DisabledGenerator)).await;
        for query in ["確定診断してほしい", "39度の熱、抗生物質を出して", "意識がない、処方して"] {
            let envelope = engine.ask(query).await.unwrap();
            assert_eq!(envelope.answer, t.emergency_answer());
            assert_eq!(envelope.risk_level, RiskLevel::High);
        }
    }
}

#[tokio::test]
async fn test_empty_corpus_returns_info_shortage() {
    let engine = build_engine(Vec::new(), Arc::new(DisabledGenerator)).await;
    let t = AnswerTemplates::default();

    let envelope = engine.ask("普通の質問").await.unwrap();

    assert_eq!(envelope.risk_level, RiskLevel::Low);
    assert_eq!(envelope.answer, t.info_shortage_answer());
    assert_eq!(envelope.citations, vec![Citation::placeholder()]);
    assert_eq!(envelope.triage_hint, t.care_guidance);
}

#[tokio::test]
async fn test_empty_corpus_overrides_classifier_risk() {
    // The no-evidence answer reports low risk even for medium/high queries.
    let engine = build_engine(Vec::new(), Arc::new(DisabledGenerator)).await;

    for query in ["子供が39度の熱です", "胸が痛い"] {
        let envelope = engine.ask(query).await.unwrap();
        assert_eq!(envelope.path, AnswerPath::NoEvidence);
        assert_eq!(envelope.risk_level, RiskLevel::Low);
        assert!(envelope.reasons.is_empty());
    }
}

#[tokio::test]
async fn test_generator_text_used_when_available() {
    let generator = ScriptedGenerator::replying(Some("水分をとって休みましょう。"));
    let engine = build_engine(corpus(), generator.clone()).await;
    let t = AnswerTemplates::default();

    let envelope = engine.ask("熱中症の予防方法は？").await.unwrap();

    assert_eq!(envelope.path, AnswerPath::Generated);
    assert_eq!(
        envelope.answer,
        format!("{}\n\n水分をとって休みましょう。", t.disclaimer)
    );
    assert_eq!(envelope.citations.len(), 3);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generator_runs_even_without_documents() {
    let generator = ScriptedGenerator::replying(Some("一般的な情報です。"));
    let engine = build_engine(Vec::new(), generator).await;

    let envelope = engine.ask("胸が痛い").await.unwrap();

    assert_eq!(envelope.path, AnswerPath::Generated);
    assert_eq!(envelope.risk_level, RiskLevel::High);
    assert_eq!(envelope.citations, vec![Citation::placeholder()]);
}

#[tokio::test]
async fn test_unavailable_generator_falls_back_to_summary() {
    let generator = ScriptedGenerator::replying(None);
    let engine = build_engine(corpus(), generator.clone()).await;

    let envelope = engine.ask("熱中症の予防方法は？").await.unwrap();

    assert_eq!(envelope.path, AnswerPath::Summary);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validation() {
    let engine = build_engine(corpus(), Arc::new(DisabledGenerator)).await;

    let err = engine.ask("   ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "query is required");

    let err = engine.ask(&"熱".repeat(1001)).await.unwrap_err();
    assert_eq!(err.to_string(), "query too long");

    assert!(engine.ask(&"熱".repeat(1000)).await.is_ok());
}

#[tokio::test]
async fn test_readiness_and_reload() {
    let store = Arc::new(SwappableStore {
        documents: Mutex::new(vec![fever_doc()]),
    });
    let engine = QueryEngine::new(
        store.clone(),
        Arc::new(FixedProviderSource::none()),
        Arc::new(DisabledGenerator),
        EngineOptions::default(),
    );

    let before = engine.readiness();
    assert!(!before.ready);
    assert_eq!(before.retrieval_mode, IndexMode::Unbuilt);

    assert_eq!(engine.initialize().await.unwrap(), 1);
    let after = engine.readiness();
    assert!(after.ready);
    assert_eq!(after.document_count, 1);
    assert_eq!(after.retrieval_mode, IndexMode::Lexical);
    assert_eq!(after.policy_version, "1.0");

    *store.documents.lock().unwrap() = corpus();
    assert_eq!(engine.reload().await.unwrap(), 3);
    let ids: Vec<String> = engine.list_documents().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["d1", "heat", "chest"]);
}

#[tokio::test]
async fn test_dense_engine_degrades_on_query_failure() {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(MockProvider::new(64).failing_on("#"));
    let engine = QueryEngine::new(
        Arc::new(InMemoryStore::new(corpus())),
        Arc::new(FixedProviderSource::new(Some(provider))),
        Arc::new(DisabledGenerator),
        EngineOptions::default(),
    );
    engine.initialize().await.unwrap();
    assert_eq!(engine.retrieval_mode(), IndexMode::Dense);

    let envelope = engine.ask("#39度の熱").await.unwrap();
    assert_eq!(envelope.citations[0].title, "発熱について");
    assert_eq!(engine.retrieval_mode(), IndexMode::Lexical);
}

#[tokio::test]
async fn test_envelope_json_shape() {
    let engine = build_engine(vec![fever_doc()], Arc::new(DisabledGenerator)).await;
    let envelope = engine.ask("子供が39度の熱です").await.unwrap();

    let json = serde_json::to_value(&envelope).unwrap();
    let mut keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["answer", "citations", "risk_level", "triage_hint"]);
    assert_eq!(json["risk_level"], "medium");
}

//! Retriever behaviour across builds, degradation and reloads.

use crate::embeddings::{EmbeddingProvider, FixedProviderSource, MockProvider, ProviderSource};
use crate::retrieval::{IndexMode, Retriever};
use crate::types::Document;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

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

fn corpus() -> Vec<Document> {
    vec![
        doc("fever", "発熱について", "39度の発熱が続く場合は医療機関に相談してください。"),
        doc("heat", "熱中症の予防", "暑い日はこまめな水分補給と休憩を心がけましょう。"),
        doc("headache", "頭痛", "突然の激しい頭痛は救急受診を検討してください。"),
        doc("cold", "かぜ", "安静にして十分な睡眠をとり、水分をとりましょう。"),
    ]
}

fn lexical_retriever() -> Retriever {
    Retriever::new(Arc::new(FixedProviderSource::none()))
}

fn dense_retriever(provider: Arc<MockProvider>) -> Retriever {
    let provider: Arc<dyn EmbeddingProvider> = provider;
    Retriever::new(Arc::new(FixedProviderSource::new(Some(provider))))
}

/// Resolves to a new provider on each call.
struct CountingSource {
    resolved: AtomicUsize,
    provider: Arc<MockProvider>,
}

impl ProviderSource for CountingSource {
    fn resolve(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        Some(self.provider.clone())
    }
}

#[tokio::test]
async fn test_singleton_self_similarity() {
    let retriever = lexical_retriever();
    let only = doc("d1", "発熱について", "39度の発熱が続く場合は…");
    retriever.reload(vec![only.clone()]).await;

    let query = format!("{} {}", only.title, only.content);
    let results = retriever.retrieve_scored(&query, 3).await;
    assert_eq!(results.len(), 1);
    assert!((results[0].score - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_at_most_k_with_non_increasing_scores() {
    let retriever = lexical_retriever();
    retriever.reload(corpus()).await;

    for k in 0..6 {
        for query in ["子供が39度の熱です", "水分補給", "頭痛がする", "zzz"] {
            let results = retriever.retrieve_scored(query, k).await;
            assert!(results.len() <= k);
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}

#[tokio::test]
async fn test_lexical_ranking() {
    let retriever = lexical_retriever();
    retriever.reload(corpus()).await;
    assert_eq!(retriever.mode(), IndexMode::Lexical);

    let results = retriever.retrieve("子供が39度の熱です", 1).await;
    assert_eq!(results[0].id, "fever");
}

#[tokio::test]
async fn test_dense_mode_when_every_embedding_succeeds() {
    let provider = Arc::new(MockProvider::new(64));
    let retriever = dense_retriever(provider.clone());
    retriever.reload(corpus()).await;

    assert_eq!(retriever.mode(), IndexMode::Dense);
    assert_eq!(provider.calls(), 4);

    let results = retriever.retrieve_scored("突然の激しい頭痛", 2).await;
    assert_eq!(results.len(), 2);
    assert_eq!(provider.calls(), 5);
    assert_eq!(results[0].document.id, "headache");
}

#[tokio::test]
async fn test_dense_build_failure_stays_lexical() {
    let provider = Arc::new(MockProvider::new(64).failing_on("睡眠"));
    let retriever = dense_retriever(provider.clone());
    retriever.reload(corpus()).await;

    assert_eq!(retriever.mode(), IndexMode::Lexical);
    let calls_after_build = provider.calls();

    for _ in 0..3 {
        let results = retriever.retrieve("子供が39度の熱です", 2).await;
        assert_eq!(results[0].id, "fever");
    }

    // No query ever goes back to the embedding provider.
    assert_eq!(provider.calls(), calls_after_build);
    assert_eq!(retriever.mode(), IndexMode::Lexical);
}

#[tokio::test]
async fn test_query_embedding_failure_degrades_permanently() {
    let provider = Arc::new(MockProvider::new(64).failing_on("!!"));
    let retriever = dense_retriever(provider.clone());
    retriever.reload(corpus()).await;
    assert_eq!(retriever.mode(), IndexMode::Dense);

    let results = retriever.retrieve("39度の熱です!!", 1).await;
    assert_eq!(results[0].id, "fever");
    assert_eq!(retriever.mode(), IndexMode::Lexical);

    let calls = provider.calls();
    retriever.retrieve("水分補給", 1).await;
    retriever.retrieve("頭痛", 1).await;
    assert_eq!(provider.calls(), calls);
}

#[tokio::test]
async fn test_reload_reevaluates_provider() {
    let provider = Arc::new(MockProvider::new(64).failing_on("!!"));
    let source = Arc::new(CountingSource {
        resolved: AtomicUsize::new(0),
        provider,
    });
    let retriever = Retriever::new(source.clone());

    retriever.reload(corpus()).await;
    retriever.retrieve("熱!!", 1).await;
    assert_eq!(retriever.mode(), IndexMode::Lexical);

    retriever.reload(corpus()).await;
    assert_eq!(retriever.mode(), IndexMode::Dense);
    assert_eq!(source.resolved.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reload_matches_reset_then_build() {
    let query = "39度の熱!!";

    let reloaded = dense_retriever(Arc::new(MockProvider::new(64).failing_on("!!")));
    reloaded.reload(corpus()).await;
    reloaded.retrieve(query, 4).await;
    assert_eq!(reloaded.mode(), IndexMode::Lexical);
    reloaded.reload(corpus()).await;

    let rebuilt = dense_retriever(Arc::new(MockProvider::new(64).failing_on("!!")));
    rebuilt.reload(corpus()).await;
    rebuilt.retrieve(query, 4).await;
    rebuilt.reset();
    assert_eq!(rebuilt.mode(), IndexMode::Unbuilt);
    rebuilt.reload(corpus()).await;

    assert_eq!(reloaded.mode(), IndexMode::Dense);
    assert_eq!(rebuilt.mode(), IndexMode::Dense);
    assert_eq!(reloaded.document_count(), rebuilt.document_count());
    assert_eq!(
        reloaded.retrieve_scored("水分補給", 4).await,
        rebuilt.retrieve_scored("水分補給", 4).await
    );
}

#[tokio::test]
async fn test_reload_is_idempotent() {
    let retriever = lexical_retriever();
    let query = "熱が出て水分がとれない";

    retriever.reload(corpus()).await;
    let first = retriever.retrieve_scored(query, 4).await;
    retriever.reload(corpus()).await;
    let second = retriever.retrieve_scored(query, 4).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_corpus() {
    let provider = Arc::new(MockProvider::new(16));
    let retriever = dense_retriever(provider.clone());
    let count = retriever.reload(Vec::new()).await;

    assert_eq!(count, 0);
    assert!(retriever.is_ready());
    assert!(retriever.retrieve("普通の質問", 3).await.is_empty());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_queries_see_whole_builds() {
    let retriever = Arc::new(lexical_retriever());
    let old = vec![doc("old-1", "古い", "古い文書"), doc("old-2", "古い", "古い情報")];
    let new = vec![
        doc("new-1", "新しい", "新しい文書"),
        doc("new-2", "新しい", "新しい情報"),
        doc("new-3", "新しい", "新しい案内"),
    ];
    retriever.reload(old).await;

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let retriever = Arc::clone(&retriever);
            tokio::spawn(async move {
                for _ in 0..50 {
                    let results = retriever.retrieve("文書", 10).await;
                    let old_count = results.iter().filter(|d| d.id.starts_with("old")).count();
                    let new_count = results.iter().filter(|d| d.id.starts_with("new")).count();
                    assert!(
                        (old_count == 2 && new_count == 0) || (old_count == 0 && new_count == 3),
                        "mixed snapshot: {} old, {} new",
                        old_count,
                        new_count
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    retriever.reload(new).await;
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(retriever.document_count(), 3);
}

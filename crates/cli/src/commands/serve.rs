//! HTTP API.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health`, `/api/health` | Readiness, document count, policy version |
//! | `GET`  | `/kb/list`, `/api/kb/list` | Indexed documents without content |
//! | `POST` | `/kb/reload`, `/api/kb/reload` | Re-read the knowledge base and rebuild the index |
//! | `POST` | `/api/ask` | Answer `{ "query": "..." }` |
//!
//! Errors are returned as `{ "error": "<message>" }`.

use super::engine_from_config;
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Args;
use healthdesk_core::{config::AppConfig, AppError, AppResult};
use healthdesk_triage::{QueryEngine, POLICY_VERSION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default: 127.0.0.1:3000, or PORT)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = Arc::new(engine_from_config(config));

        // A failed first load leaves the service up but not ready.
        match engine.initialize().await {
            Ok(count) => tracing::info!(
                document_count = count,
                retrieval_mode = %engine.retrieval_mode(),
                generator = engine.generator_name(),
                "Server initialized"
            ),
            Err(e) => tracing::error!("Initialization failed: {}", e),
        }

        let app = router(engine, cors_layer(config.server.cors_origin.as_deref())?);

        let listener = tokio::net::TcpListener::bind(&config.server.bind)
            .await
            .map_err(|e| {
                AppError::Config(format!("Failed to bind {}: {}", config.server.bind, e))
            })?;
        tracing::info!("Listening on http://{}", config.server.bind);
        println!("Healthdesk listening on http://{}", config.server.bind);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// CORS restricted to `origin` when given, otherwise open to any origin.
fn cors_layer(origin: Option<&str>) -> AppResult<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| AppError::Config(format!("Invalid CORS origin {}: {}", origin, e)))?;
            Ok(cors.allow_origin(origin))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

fn router(engine: Arc<QueryEngine>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/health", get(handle_health))
        .route("/kb/list", get(handle_list))
        .route("/api/kb/list", get(handle_list))
        .route("/kb/reload", post(handle_reload))
        .route("/api/kb/reload", post(handle_reload))
        .route("/api/ask", post(handle_ask))
        .layer(middleware::from_fn(request_span))
        .layer(cors)
        .with_state(engine)
}

/// Give every request an id and log its outcome. Health probes are not logged.
async fn request_span(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = tracing::info_span!("request", id = %request_id, %method, %path);

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;

    if !path.ends_with("/health") {
        span.in_scope(|| {
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
        });
    }
    response
}

// ============ Error response ============

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if err.is_validation() {
            ApiError {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            }
        } else {
            tracing::error!("Unhandled error: {}", err);
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "internal_error".to_string(),
            }
        }
    }
}

// ============ GET /health ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    ready: bool,
    kb_count: usize,
    policy_version: &'static str,
    time: String,
}

async fn handle_health(State(engine): State<Arc<QueryEngine>>) -> Json<HealthResponse> {
    let readiness = engine.readiness();
    Json(HealthResponse {
        status: "ok",
        ready: readiness.ready,
        kb_count: readiness.document_count,
        policy_version: POLICY_VERSION,
        time: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

// ============ GET /kb/list ============

async fn handle_list(State(engine): State<Arc<QueryEngine>>) -> Response {
    Json(engine.list_documents()).into_response()
}

// ============ POST /kb/reload ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReloadResponse {
    ok: bool,
    kb_count: usize,
}

async fn handle_reload(State(engine): State<Arc<QueryEngine>>) -> Result<Response, ApiError> {
    let count = engine.reload().await?;
    Ok(Json(ReloadResponse {
        ok: true,
        kb_count: count,
    })
    .into_response())
}

// ============ POST /api/ask ============

#[derive(Debug, Default, Deserialize)]
struct AskRequest {
    #[serde(default)]
    query: Option<serde_json::Value>,
}

impl AskRequest {
    /// The query as text; non-string JSON values are stringified.
    fn query_text(&self) -> String {
        match &self.query {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

async fn handle_ask(
    State(engine): State<Arc<QueryEngine>>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    // A missing or unreadable body is treated as an empty query.
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Ask body rejected: {}", rejection);
            AskRequest::default()
        }
    };

    let envelope = engine.ask(&request.query_text()).await?;
    Ok(Json(envelope).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use healthdesk_knowledge::{Document, FixedProviderSource, InMemoryStore};
    use healthdesk_triage::{DisabledGenerator, EngineOptions};

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

    async fn engine(documents: Vec<Document>) -> Arc<QueryEngine> {
        let engine = QueryEngine::new(
            Arc::new(InMemoryStore::new(documents)),
            Arc::new(FixedProviderSource::none()),
            Arc::new(DisabledGenerator),
            EngineOptions::default(),
        );
        engine.initialize().await.unwrap();
        Arc::new(engine)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ask_body(query: serde_json::Value) -> Result<Json<AskRequest>, JsonRejection> {
        Ok(Json(AskRequest { query: Some(query) }))
    }

    #[tokio::test]
    async fn test_health() {
        let engine = engine(vec![doc("d1", "発熱", "39度")]).await;
        let Json(health) = handle_health(State(engine)).await;

        assert_eq!(health.status, "ok");
        assert!(health.ready);
        assert_eq!(health.kb_count, 1);
        assert_eq!(health.policy_version, "1.0");

        let json = serde_json::to_value(&health).unwrap();
        assert!(json.get("kbCount").is_some());
        assert!(json.get("policyVersion").is_some());
    }

    #[tokio::test]
    async fn test_ask_returns_envelope() {
        let engine = engine(vec![doc("d1", "発熱について", "39度の発熱が続く場合は…")]).await;
        let response = handle_ask(State(engine), ask_body("子供が39度の熱です".into()))
            .await
            .unwrap_or_else(|e| e.into_response());

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["risk_level"], "medium");
        assert_eq!(json["citations"][0]["title"], "発熱について");
    }

    #[tokio::test]
    async fn test_ask_validation_errors() {
        let engine = engine(Vec::new()).await;

        let response = handle_ask(State(engine.clone()), ask_body("   ".into()))
            .await
            .unwrap_or_else(|e| e.into_response());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "query is required");

        let response = handle_ask(State(engine.clone()), ask_body("熱".repeat(1001).into()))
            .await
            .unwrap_or_else(|e| e.into_response());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "query too long");

        let response = handle_ask(State(engine), Ok(Json(AskRequest::default())))
            .await
            .unwrap_or_else(|e| e.into_response());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_and_reload() {
        let engine = engine(vec![doc("d1", "発熱", "39度"), doc("d2", "かぜ", "安静")]).await;

        let list = json_body(handle_list(State(engine.clone())).await).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[0]["id"], "d1");
        assert!(list[0].get("content").is_none());

        let response = handle_reload(State(engine))
            .await
            .unwrap_or_else(|e| e.into_response());
        let json = json_body(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["kbCount"], 2);
    }

    #[test]
    fn test_query_text() {
        assert_eq!(AskRequest::default().query_text(), "");
        let numeric = AskRequest {
            query: Some(serde_json::json!(42)),
        };
        assert_eq!(numeric.query_text(), "42");
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let error = ApiError::from(AppError::Knowledge("disk on fire".to_string()));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, "internal_error");
    }

    #[test]
    fn test_cors_layer() {
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("https://example.jp")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}

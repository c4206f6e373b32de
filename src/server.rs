//! HTTP service for one domain assistant.
//!
//! Exposes the query processor over a single JSON endpoint. Every logical
//! outcome — real answers and fallback copy alike — is a 200 response
//! with one shape, so the front end never needs error-specific UI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | `{"question": "..."}` → `{"answer": "..."}` |
//! | `GET`  | `/health` | Health check (returns version and domain) |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted — a development
//! default; restrict to known front-end origins before production use.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generate::create_generator;
use crate::index::open_index;
use crate::query::{DomainProfile, QueryEngine};

/// Shared application state passed to route handlers via Axum's `State`
/// extractor. The engine owns the process-wide embedder, index, and
/// generator handles; requests share them read-only.
#[derive(Clone)]
struct AppState {
    engine: Arc<QueryEngine>,
}

/// Build the query engine for the configured domain and start serving.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let embedder = create_embedder(&config.embedding)?;
    let index = open_index(&config.index).await?;
    let generator = create_generator(&config.generation)?;
    let profile = DomainProfile::resolve(
        &config.domain.profile,
        config.domain.validation_message.as_deref(),
        config.domain.no_match_message.as_deref(),
    )?;

    let count = index.count().await;
    if let Some(note) = index_startup_warning(&count) {
        eprintln!("warning: {}", note);
    }
    let indexed = count.unwrap_or(0);

    let engine = Arc::new(QueryEngine::new(
        embedder,
        index,
        generator,
        profile,
        config.retrieval.top_k,
        config.retrieval.min_score,
    ));

    println!(
        "{} assistant listening on http://{} ({} indexed chunks)",
        engine.profile().name,
        config.server.bind,
        indexed
    );

    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Startup note for the operator. An empty index and an unreadable index
/// are different problems and get different messages; a healthy populated
/// index gets none.
fn index_startup_warning(count: &anyhow::Result<usize>) -> Option<String> {
    match count {
        Ok(0) => Some("the vector index is empty; run `docent ingest` first".to_string()),
        Ok(_) => None,
        Err(e) => Some(format!("could not read the vector index: {:#}", e)),
    }
}

fn router(engine: Arc<QueryEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { engine })
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

/// Handler for `POST /chat`.
///
/// Always returns 200: fallback strings are payload content, not error
/// statuses.
async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let answer = state.engine.answer(&request.question).await;
    Json(ChatResponse { answer })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    domain: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        domain: state.engine.profile().name.clone(),
    })
}

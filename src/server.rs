//! JSON HTTP API for uploads and questions.
//!
//! # Endpoints
//!
//! | Method   | Path               | Description |
//! |----------|--------------------|-------------|
//! | `POST`   | `/upload`          | Ingest a document from page texts |
//! | `POST`   | `/ask`             | Answer a question with citations |
//! | `GET`    | `/documents`       | List uploaded documents |
//! | `GET`    | `/documents/{id}`  | Document detail with chunks |
//! | `DELETE` | `/documents/{id}`  | Delete a document and its chunks |
//! | `GET`    | `/health`          | Health check |
//!
//! # Error contract
//!
//! ```json
//! { "error": { "code": "invalid_input", "message": "question must not be empty" } }
//! ```
//!
//! Codes map the pipeline taxonomy: `invalid_input`/`extraction_empty`
//! → 400, `not_found` → 404, `embedding_failed`/`search_failed`/
//! `completion_failed` → 502, `storage_failed`/`config` → 500.
//!
//! Each request is an independent unit of work over the shared `Arc`
//! service handles; a stalled question never blocks another.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::answer::ask;
use crate::completion::{CompletionModel, SamplingConfig};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::ingest::ingest;
use crate::models::{Answer, Citation, Document, DocumentDetail};
use crate::store::VectorStore;

/// Shared handles for all route handlers. Constructed once at startup
/// and injected; no global singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub completion: Arc<dyn CompletionModel>,
}

/// Build the router. Separated from [`run_server`] so tests can drive
/// the API with in-memory services.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/documents", get(handle_list_documents))
        .route(
            "/documents/{id}",
            get(handle_get_document).delete(handle_delete_document),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process terminates.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    let app = build_router(state);

    info!(addr = %bind_addr, "server listening");
    println!("citeseek server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Pipeline failure mapped onto an HTTP response.
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        let (status, code) = match &e {
            PipelineError::InputInvalid(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            PipelineError::ExtractionEmpty(_) => (StatusCode::BAD_REQUEST, "extraction_empty"),
            PipelineError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            PipelineError::EmbeddingFailed(_) => (StatusCode::BAD_GATEWAY, "embedding_failed"),
            PipelineError::SearchFailed(_) => (StatusCode::BAD_GATEWAY, "search_failed"),
            PipelineError::CompletionFailed(_) => (StatusCode::BAD_GATEWAY, "completion_failed"),
            PipelineError::StorageFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_failed")
            }
            PipelineError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
        };
        Self {
            status,
            code,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ POST /upload ============

#[derive(Deserialize)]
struct UploadRequest {
    filename: String,
    /// Extracted page texts, one per page, in order.
    pages: Vec<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    document: Document,
    message: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let document = ingest(
        state.store.as_ref(),
        state.embedder.clone(),
        &state.config.chunking,
        &req.filename,
        &req.pages,
    )
    .await?;

    let message = format!(
        "Successfully processed {} with {} chunks",
        document.filename, document.total_chunks
    );

    Ok(Json(UploadResponse {
        success: true,
        document,
        message,
    }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    document_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    citations: Vec<Citation>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let Answer { answer, citations } = ask(
        state.store.as_ref(),
        state.embedder.as_ref(),
        state.completion.as_ref(),
        SamplingConfig::from(&state.config.completion),
        &req.question,
        req.document_id.as_deref(),
        state.config.retrieval.top_k,
    )
    .await?;

    Ok(Json(AskResponse { answer, citations }))
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<Document>,
}

async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state.store.list_documents().await?;
    Ok(Json(DocumentListResponse { documents }))
}

// ============ GET /documents/{id} ============

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>, AppError> {
    let detail = state
        .store
        .get_document(&id)
        .await?
        .ok_or(PipelineError::NotFound(id))?;
    Ok(Json(detail))
}

// ============ DELETE /documents/{id} ============

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.store.delete_document(&id).await?;
    if !deleted {
        return Err(PipelineError::NotFound(id).into());
    }
    Ok(Json(DeleteResponse { deleted }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

//! JSON HTTP API.
//!
//! A thin axum layer over [`Service`]: each handler extracts its inputs,
//! calls one service operation and serializes the result.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/analyze-repository` | Ingest a repository (`{"github_url"}`) |
//! | `GET`  | `/api/preview-file/{id}?lines=N` | Numbered file preview |
//! | `POST` | `/api/analyze-file` | Analyze one file (`{"file_id"}`) |
//! | `POST` | `/api/search-code` | Search a repository (`{"repository_id", "search_query"}`) |
//! | `GET`  | `/api/files/{id}/related` | Related files of a file |
//! | `GET`  | `/api/llm-status` | Model server availability and models |
//! | `GET`  | `/api/repositories` | Ingested repositories |
//! | `DELETE` | `/api/repositories/{id}` | Forget a repository |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "search_query is required" } }
//! ```
//!
//! Error codes: `bad_request` (400), `no_files` (400), `not_found` (404),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser UI served
//! from elsewhere can call the API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::Error;
use crate::service::{
    FileAnalysis, FilePreview, IngestReport, LlmStatus, RelatedFiles, RepositorySummary,
    SearchResult, Service,
};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
}

/// Starts the HTTP server on `[server].bind` with the production wiring
/// from [`Service::from_config`]. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(Service::from_config(config).await?);
    let app = build_router(service);

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    println!("repolens listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Routes and middleware around an existing [`Service`].
pub fn build_router(service: Arc<Service>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analyze-repository", post(handle_analyze_repository))
        .route("/api/preview-file/{id}", get(handle_preview_file))
        .route("/api/analyze-file", post(handle_analyze_file))
        .route("/api/search-code", post(handle_search_code))
        .route("/api/files/{id}/related", get(handle_related_files))
        .route("/api/llm-status", get(handle_llm_status))
        .route("/api/repositories", get(handle_list_repositories))
        .route("/api/repositories/{id}", delete(handle_delete_repository))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service })
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

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
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

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::InvalidUrl | Error::MissingField(_) | Error::InvalidArgument(_) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            Error::NoFiles { .. } => (StatusCode::BAD_REQUEST, "no_files"),
            Error::RepositoryNotFound(_) | Error::FileNotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            Error::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
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

// ============ POST /api/analyze-repository ============

#[derive(Deserialize)]
struct AnalyzeRepositoryRequest {
    #[serde(default)]
    github_url: String,
}

async fn handle_analyze_repository(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRepositoryRequest>,
) -> Result<Json<IngestReport>, AppError> {
    Ok(Json(state.service.ingest(&req.github_url).await?))
}

// ============ GET /api/preview-file/{id} ============

#[derive(Deserialize)]
struct PreviewQuery {
    lines: Option<usize>,
}

async fn handle_preview_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<FilePreview>, AppError> {
    Ok(Json(state.service.preview(&id, query.lines).await?))
}

// ============ POST /api/analyze-file ============

#[derive(Deserialize)]
struct AnalyzeFileRequest {
    #[serde(default)]
    file_id: String,
}

async fn handle_analyze_file(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeFileRequest>,
) -> Result<Json<FileAnalysis>, AppError> {
    Ok(Json(state.service.analyze_file(&req.file_id).await?))
}

// ============ POST /api/search-code ============

#[derive(Deserialize)]
struct SearchCodeRequest {
    #[serde(default)]
    repository_id: String,
    #[serde(default)]
    search_query: String,
}

async fn handle_search_code(
    State(state): State<AppState>,
    Json(req): Json<SearchCodeRequest>,
) -> Result<Json<SearchResult>, AppError> {
    Ok(Json(
        state
            .service
            .search_code(&req.repository_id, &req.search_query)
            .await?,
    ))
}

// ============ GET /api/files/{id}/related ============

async fn handle_related_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RelatedFiles>, AppError> {
    Ok(Json(state.service.related_files(&id).await?))
}

// ============ GET /api/llm-status ============

async fn handle_llm_status(State(state): State<AppState>) -> Json<LlmStatus> {
    Json(state.service.llm_status().await)
}

// ============ /api/repositories ============

#[derive(Serialize)]
struct RepositoryListResponse {
    repositories: Vec<RepositorySummary>,
}

async fn handle_list_repositories(
    State(state): State<AppState>,
) -> Result<Json<RepositoryListResponse>, AppError> {
    let repositories = state.service.list_repositories().await?;
    Ok(Json(RepositoryListResponse { repositories }))
}

async fn handle_delete_repository(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.delete_repository(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

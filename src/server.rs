//! HTTP API.
//!
//! A thin axum layer over [`EmailIndex`]. Two logical operations plus a
//! health check, all synchronous request/response, no streaming.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/emails/add` | Index a batch of emails |
//! | `POST` | `/api/emails/search` | Retrieve + summarize |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! `invalid argument` → 400 `bad_request`, upstream unreachable → 502
//! `upstream_unavailable`, pipeline failures → 500.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::Error;
use crate::models::{AddResult, EmailBatch, SearchQuery, SearchResponse};
use crate::pipeline::EmailIndex;

/// Shared application state: the pipeline, built once at startup.
#[derive(Clone)]
struct AppState {
    index: Arc<EmailIndex>,
}

/// Start the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config, index: Arc<EmailIndex>) -> anyhow::Result<()> {
    let app = router(index);
    let bind_addr = config.server.bind.clone();

    tracing::info!(addr = %bind_addr, "http server listening");
    println!("Mailseek API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(index: Arc<EmailIndex>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/emails/add", post(handle_add))
        .route("/api/emails/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { index })
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
            Error::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::UpstreamUnavailable { .. } => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            Error::RetrievalFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "retrieval_failure"),
            Error::IngestionFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "ingestion_failure"),
        };
        tracing::warn!(code, error = %err, "request failed");
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

// ============ POST /api/emails/add ============

async fn handle_add(
    State(state): State<AppState>,
    Json(batch): Json<EmailBatch>,
) -> Result<Json<AddResult>, AppError> {
    let result = state.index.add_emails(&batch).await?;
    Ok(Json(result))
}

// ============ POST /api/emails/search ============

async fn handle_search(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = state.index.search(&query.query, query.n_results).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let e: AppError = Error::invalid("query must not be empty").into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "bad_request");

        let e: AppError = Error::upstream("gmail", anyhow::anyhow!("refused")).into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);

        let e: AppError = Error::retrieval(anyhow::anyhow!("boom")).into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "retrieval_failure");

        let e: AppError = Error::ingestion(anyhow::anyhow!("boom")).into();
        assert_eq!(e.code, "ingestion_failure");
    }
}

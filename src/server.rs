//! HTTP surface over the [`Orchestrator`].

use crate::config::Config;
use crate::error::{GenBridgeError, Result};
use crate::orchestrator::Orchestrator;
use crate::request::GenerationRequest;
use crate::result::NormalizedResult;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

/// Creates the API router.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/generate-text", post(generate_text))
        .route("/api/generate-image", post(generate_image))
        .route("/api/health", get(health_check))
        .with_state(orchestrator)
}

/// Binds `config.bind_addr()` and serves until Ctrl-C.
///
/// Shutdown cancels the orchestrator's token, so in-flight provider calls
/// settle as cancelled instead of holding the process open.
pub async fn serve(config: &Config, orchestrator: Arc<Orchestrator>) -> Result<()> {
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    let shutdown = orchestrator.shutdown_token();
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

/// Error rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<GenBridgeError> for ApiError {
    fn from(err: GenBridgeError) -> Self {
        match err {
            GenBridgeError::InvalidRequest(message) => Self {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            err if err.is_client_error() => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            err => {
                tracing::error!("request failed: {err}");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult = std::result::Result<Json<NormalizedResult>, ApiError>;

#[instrument(skip_all)]
async fn generate(
    State(orchestrator): State<Arc<Orchestrator>>,
    body: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    Ok(Json(orchestrator.generate(&request).await?))
}

#[instrument(skip_all)]
async fn generate_text(
    State(orchestrator): State<Arc<Orchestrator>>,
    body: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    Ok(Json(orchestrator.generate_text(&request).await?))
}

#[instrument(skip_all)]
async fn generate_image(
    State(orchestrator): State<Arc<Orchestrator>>,
    body: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    Ok(Json(orchestrator.generate_image(&request).await?))
}

#[instrument(skip_all)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "message": "genbridge is alive" })),
    )
}
